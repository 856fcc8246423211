//! Rule entity and rule execution results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::mention::Row;

/// Rule identifier assigned by the service
pub type RuleId = i64;

/// A user-authored natural-language instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub title: String,
    pub instruction: String,

    /// Use the previous rule's result as context
    #[serde(default)]
    pub is_chaining: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Full rule body sent when creating or updating a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub title: String,
    pub instruction: String,
    pub is_chaining: bool,
}

impl RuleDraft {
    pub fn new(title: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            instruction: instruction.into(),
            is_chaining: false,
        }
    }
}

/// Partial rule update; unset fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulePatch {
    pub title: Option<String>,
    pub instruction: Option<String>,
    pub is_chaining: Option<bool>,
}

impl RulePatch {
    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.instruction.is_none() && self.is_chaining.is_none()
    }

    /// Merge this patch over an existing rule
    pub fn apply(&self, rule: &Rule) -> RuleDraft {
        RuleDraft {
            title: self.title.clone().unwrap_or_else(|| rule.title.clone()),
            instruction: self
                .instruction
                .clone()
                .unwrap_or_else(|| rule.instruction.clone()),
            is_chaining: self.is_chaining.unwrap_or(rule.is_chaining),
        }
    }
}

/// Successful rule output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleOutput {
    /// Result rows; columns are chosen by the collaborator per execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Row>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    /// Query generated by the collaborator, when it ran one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

/// Outcome of one rule execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RuleResult {
    #[serde(rename = "success")]
    Ok(RuleOutput),
    Error { message: String },
}

impl RuleResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Result rows, empty for errors and text-only results
    pub fn rows(&self) -> &[Row] {
        match self {
            Self::Ok(output) => output.data.as_deref().unwrap_or_default(),
            Self::Error { .. } => &[],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Error { message } => Some(message),
        }
    }
}

/// Tabular view of result rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    /// Build a table from heterogeneous rows.
    ///
    /// Columns come from the first row's keys. Later rows are aligned to
    /// those keys; missing cells are empty.
    pub fn from_rows(rows: &[Row]) -> Self {
        let Some(first) = rows.first() else {
            return Self::default();
        };

        let keys: Vec<&String> = first.keys().collect();
        let headers = keys.iter().map(|k| k.replace('_', " ")).collect();
        let rows = rows
            .iter()
            .map(|row| {
                keys.iter()
                    .map(|key| row.get(key.as_str()).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Render a scalar cell the way result tables show it
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
