//! Mention, author and keyword catalog entities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::filter::ALL_KEYWORD;

/// A heterogeneous row of scalar values, in collaborator-defined column order
pub type Row = Map<String, Value>;

/// Mention counts keyed by sentiment label
pub type SentimentBreakdown = BTreeMap<String, u64>;

/// Keyword catalog entry as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordStat {
    pub keyword: String,
    pub count: u64,
}

/// Keyword catalog entry as presented to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    /// Lowercased label
    pub id: String,

    /// Display label, also the value used in filters
    pub label: String,

    /// Number of mentions for this keyword
    pub count: u64,
}

impl Keyword {
    /// Build a catalog entry from a label
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        let label = label.into();
        Self {
            id: label.to_lowercase(),
            label,
            count,
        }
    }

    /// The "All" sentinel entry
    pub fn all(count: u64) -> Self {
        Self::new(ALL_KEYWORD, count)
    }

    /// Whether this entry is the "All" sentinel
    pub fn is_all(&self) -> bool {
        self.label == ALL_KEYWORD
    }
}

impl From<KeywordStat> for Keyword {
    fn from(stat: KeywordStat) -> Self {
        Self::new(stat.keyword, stat.count)
    }
}

/// A single ingested social or forum post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub id: i64,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    /// ISO-8601 timestamp as reported by the service
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default = "default_source")]
    pub source: String,

    #[serde(default = "default_sentiment")]
    pub sentiment: String,

    /// Keyword this mention was collected for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    /// Structured fields extracted from the content
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "extractedData"
    )]
    pub extracted_data: Option<Row>,
}

fn default_source() -> String {
    "Reddit".to_string()
}

fn default_sentiment() -> String {
    "neutral".to_string()
}

impl Mention {
    /// Author name, or a placeholder for anonymous posts
    pub fn author_display(&self) -> &str {
        self.author.as_deref().unwrap_or("[unknown]")
    }

    /// Content text, empty when absent
    pub fn content_text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Aggregate mention count attributed to one author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorStat {
    pub author: String,
    pub count: u64,
}

/// Mention count for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

/// Which result list is in front
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListTab {
    #[default]
    Mentions,
    Authors,
}

impl std::fmt::Display for ListTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mentions => write!(f, "mentions"),
            Self::Authors => write!(f, "authors"),
        }
    }
}

impl std::str::FromStr for ListTab {
    type Err = crate::errors::ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mentions" | "posts" => Ok(Self::Mentions),
            "authors" => Ok(Self::Authors),
            _ => Err(crate::errors::ExplorerError::InvalidArgument {
                reason: format!("unknown list tab '{s}'"),
            }),
        }
    }
}
