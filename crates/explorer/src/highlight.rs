//! Term highlighting for mention content.
//!
//! Splits content into spans, tagging every occurrence of an active keyword
//! or an extracted field value. Longer terms win over terms they contain.

use regex::RegexBuilder;
use serde_json::Value;
use tracing::warn;

use crate::entities::{Row, ALL_KEYWORD};

/// Extracted-data keys that describe the mention rather than its content
const METADATA_KEYS: &[&str] = &[
    "id",
    "url",
    "date",
    "source",
    "sentiment",
    "author",
    "keyword",
    "content",
    "title",
    "created_at",
];

/// Why a span was highlighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    Keyword,
    Extracted,
}

/// A run of content text, highlighted or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub kind: Option<HighlightKind>,
}

impl Span {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: None,
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.kind.is_some()
    }
}

/// Collect candidate terms, longest first.
///
/// Keywords precede extracted values of equal length.
fn candidates<'a>(
    keywords: impl IntoIterator<Item = &'a str>,
    extracted: Option<&Row>,
) -> Vec<(String, HighlightKind)> {
    let mut terms: Vec<(String, HighlightKind)> = keywords
        .into_iter()
        .map(str::trim)
        .filter(|k| !k.is_empty() && *k != ALL_KEYWORD)
        .map(|k| (k.to_string(), HighlightKind::Keyword))
        .collect();

    if let Some(row) = extracted {
        for (key, value) in row {
            if METADATA_KEYS.contains(&key.to_lowercase().as_str()) {
                continue;
            }
            let text = match value {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            if text.chars().count() > 1 {
                terms.push((text, HighlightKind::Extracted));
            }
        }
    }

    // lengths are counted in chars, not UTF-16 units
    terms.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
    terms
}

/// Split `content` into highlighted and plain spans.
///
/// Matching is case-insensitive and keeps the content's own casing. The
/// output depends only on the inputs.
pub fn highlight<'a>(
    content: &str,
    keywords: impl IntoIterator<Item = &'a str>,
    extracted: Option<&Row>,
) -> Vec<Span> {
    if content.is_empty() {
        return Vec::new();
    }

    let terms = candidates(keywords, extracted);
    if terms.is_empty() {
        return vec![Span::plain(content)];
    }

    // one capture group per term, so the matching alternative is known
    let pattern = terms
        .iter()
        .map(|(term, _)| format!("({})", regex::escape(term)))
        .collect::<Vec<_>>()
        .join("|");
    let regex = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(regex) => regex,
        Err(e) => {
            warn!(error = %e, terms = terms.len(), "Failed to build highlight pattern");
            return vec![Span::plain(content)];
        }
    };

    let mut spans = Vec::new();
    let mut last = 0;
    for caps in regex.captures_iter(content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Span::plain(&content[last..whole.start()]));
        }
        let kind = (1..caps.len())
            .find(|&i| caps.get(i).is_some())
            .map(|i| terms[i - 1].1);
        spans.push(Span {
            text: whole.as_str().to_string(),
            kind,
        });
        last = whole.end();
    }
    if last < content.len() {
        spans.push(Span::plain(&content[last..]));
    }
    spans
}
