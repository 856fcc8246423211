//! Filter selection shared by every list and rule query.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Keyword sentinel meaning "no keyword constraint"
pub const ALL_KEYWORD: &str = "All";

/// Known data sources as `(id, label)` pairs
pub const KNOWN_SOURCES: &[(&str, &str)] = &[
    ("reddit", "Reddit"),
    ("fda", "FDA FAERS"),
    ("pharmacy", "Pharmacy Claims"),
    ("medical", "Medical Claims"),
];

/// Display label for a source id; unknown ids are shown as-is
pub fn source_label(id: &str) -> &str {
    KNOWN_SOURCES
        .iter()
        .find(|(known, _)| *known == id)
        .map_or(id, |(_, label)| label)
}

/// Inclusive date range applied to queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Create a range; either bound may be open
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Whether neither bound is set
    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Current keyword and source constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub keywords: BTreeSet<String>,
    pub sources: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl FilterSelection {
    /// Build a normalized selection
    pub fn new<K, S>(keywords: K, sources: S, default_sources: &[String]) -> Self
    where
        K: IntoIterator,
        K::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        Self {
            keywords: normalize_keywords(keywords),
            sources: normalize_sources(sources, default_sources),
            date_range: None,
        }
    }

    /// Attach a date range; an open range is dropped
    pub fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range.filter(|r| !r.is_open());
        self
    }

    /// Whether the keyword set is just the "All" sentinel
    pub fn is_unconstrained(&self) -> bool {
        self.keywords.len() == 1 && self.keywords.contains(ALL_KEYWORD)
    }

    /// Keywords to send as a query constraint; empty when unconstrained
    pub fn keyword_constraint(&self) -> Vec<&str> {
        if self.is_unconstrained() {
            Vec::new()
        } else {
            self.keywords
                .iter()
                .map(String::as_str)
                .filter(|k| *k != ALL_KEYWORD)
                .collect()
        }
    }

    /// Keywords usable for highlighting (sentinel excluded)
    pub fn active_keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .filter(|k| *k != ALL_KEYWORD)
    }

    /// Human readable summary
    pub fn describe(&self) -> String {
        let keywords = self.keywords.iter().cloned().collect::<Vec<_>>().join(", ");
        let sources = self
            .sources
            .iter()
            .map(|s| source_label(s))
            .collect::<Vec<_>>()
            .join(", ");
        match self.date_range {
            Some(range) => format!(
                "keywords: {keywords} | sources: {sources} | dates: {} .. {}",
                range.start.map_or_else(|| "*".to_string(), |d| d.to_string()),
                range.end.map_or_else(|| "*".to_string(), |d| d.to_string()),
            ),
            None => format!("keywords: {keywords} | sources: {sources}"),
        }
    }
}

/// Normalize a keyword set.
///
/// Blank values are dropped, an empty set becomes `{"All"}`, and "All" is
/// removed when real keywords are present.
pub fn normalize_keywords<I>(keywords: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut set: BTreeSet<String> = keywords
        .into_iter()
        .map(|k| k.as_ref().trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    if set.len() > 1 {
        set.remove(ALL_KEYWORD);
    }
    if set.is_empty() {
        set.insert(ALL_KEYWORD.to_string());
    }
    set
}

/// Normalize a source set, falling back to `defaults` when empty
pub fn normalize_sources<I>(sources: I, defaults: &[String]) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let set: BTreeSet<String> = sources
        .into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if set.is_empty() {
        defaults.iter().map(|s| s.trim().to_lowercase()).collect()
    } else {
        set
    }
}
