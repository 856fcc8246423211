//! Explorer configuration.
//!
//! Values come from compiled-in defaults, optionally overridden by a JSON
//! config file and then by environment variables:
//!
//! - `EXPLORER_API_URL`: base URL of the analysis service
//! - `EXPLORER_PAGE_SIZE`: page size for both result lists
//! - `EXPLORER_STATE_DIR`: directory holding persisted session state
//! - `EXPLORER_TIMEOUT_SECS`: HTTP request timeout

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::entities::ALL_KEYWORD;
use crate::errors::{ExplorerError, ExplorerResult};

const ENV_API_URL: &str = "EXPLORER_API_URL";
const ENV_PAGE_SIZE: &str = "EXPLORER_PAGE_SIZE";
const ENV_STATE_DIR: &str = "EXPLORER_STATE_DIR";
const ENV_TIMEOUT_SECS: &str = "EXPLORER_TIMEOUT_SECS";

/// Default service location for local development
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default number of items fetched per page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Explorer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Base URL of the analysis service
    pub api_base_url: String,

    /// Mentions fetched per page
    pub page_size: usize,

    /// Authors fetched per page
    pub author_page_size: usize,

    /// Transport-level timeout; rule execution itself has none
    pub request_timeout_secs: Option<u64>,

    /// Directory for persisted session state
    pub state_dir: PathBuf,

    /// Keywords applied when nothing was persisted
    pub default_keywords: Vec<String>,

    /// Sources applied when nothing was persisted or the set is emptied
    pub default_sources: Vec<String>,

    /// Title given to newly created rules
    pub new_rule_title: String,

    /// Instruction given to newly created rules
    pub new_rule_instruction: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            author_page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: None,
            state_dir: PathBuf::from(".explorer"),
            default_keywords: vec![ALL_KEYWORD.to_string()],
            default_sources: vec!["reddit".to_string()],
            new_rule_title: "New Rule".to_string(),
            new_rule_instruction: "Enter instructions...".to_string(),
        }
    }
}

impl ExplorerConfig {
    /// Defaults overridden by environment variables
    pub fn from_env() -> ExplorerResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Load a JSON config file (missing file means defaults), then apply
    /// environment overrides
    pub async fn load(path: impl AsRef<Path>) -> ExplorerResult<Self> {
        let path = path.as_ref();
        let config = match fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str::<Self>(&content).map_err(|e| {
                ExplorerError::ConfigError {
                    reason: format!("{}: {e}", path.display()),
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(ExplorerError::FileReadError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };
        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> ExplorerResult<Self> {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Ok(raw) = std::env::var(ENV_PAGE_SIZE) {
            let size = parse_positive(ENV_PAGE_SIZE, &raw)?;
            self.page_size = size;
            self.author_page_size = size;
        }
        if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
            self.state_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = Some(parse_positive(ENV_TIMEOUT_SECS, &raw)? as u64);
        }
        self.validate()?;
        Ok(self)
    }

    /// Override the service URL
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Override both page sizes
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self.author_page_size = size;
        self
    }

    /// Check invariants the rest of the crate relies on
    pub fn validate(&self) -> ExplorerResult<()> {
        if self.page_size == 0 || self.author_page_size == 0 {
            return Err(ExplorerError::InvalidConfigValue {
                key: "page_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.api_base_url.trim().is_empty() {
            return Err(ExplorerError::InvalidConfigValue {
                key: "api_base_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.default_sources.iter().all(|s| s.trim().is_empty()) {
            return Err(ExplorerError::InvalidConfigValue {
                key: "default_sources".to_string(),
                reason: "at least one source is required".to_string(),
            });
        }
        Ok(())
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Path of the persisted state file
    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join("state.json")
    }
}

fn parse_positive(key: &str, raw: &str) -> ExplorerResult<usize> {
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ExplorerError::InvalidConfigValue {
            key: key.to_string(),
            reason: format!("expected a positive integer, got '{raw}'"),
        }),
    }
}
