//! Error types for the explorer crate.

use thiserror::Error;

/// Comprehensive error types for the explorer
#[derive(Error, Debug, Clone)]
pub enum ExplorerError {
    // Rule errors
    #[error("Rule '{rule_id}' not found")]
    RuleNotFound { rule_id: i64 },

    #[error("No active rule selected")]
    NoActiveRule,

    #[error("Rule '{rule_id}' is already executing")]
    ExecutionInProgress { rule_id: i64 },

    // Mention errors
    #[error("Mention '{mention_id}' is not loaded")]
    MentionNotFound { mention_id: i64 },

    // Collaborator errors
    #[error("Request to '{endpoint}' failed with status {status}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Transport error: {reason}")]
    Transport { reason: String },

    #[error("Unexpected response from '{endpoint}': {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    // Storage errors
    #[error("Storage error: {reason}")]
    StorageError { reason: String },

    #[error("Failed to read file '{path}': {reason}")]
    FileReadError { path: String, reason: String },

    #[error("Failed to write file '{path}': {reason}")]
    FileWriteError { path: String, reason: String },

    #[error("Failed to parse JSON: {reason}")]
    JsonParseError { reason: String },

    // Configuration errors
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidConfigValue { key: String, reason: String },

    // General errors
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },
}

impl From<std::io::Error> for ExplorerError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParseError {
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ExplorerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for explorer operations
pub type ExplorerResult<T> = Result<T, ExplorerError>;
