#![warn(clippy::pedantic)]
// Allow common pedantic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::if_not_else)]
#![allow(clippy::map_unwrap_or)]

//! # Explorer
//!
//! State engine for a social-listening mention explorer.
//!
//! This crate provides:
//! - A filter selection (keywords, sources, dates) persisted across runs
//! - Two filter-reactive paginated lists (mentions and authors) with
//!   single-flight page loading and stale-response discarding
//! - A rule registry and a single-flight rule execution engine with a
//!   per-rule result cache and chaining between neighbouring rules
//! - Keyword highlighting for mention content
//! - A REST client for the analysis service and a CLI
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use explorer::{ExplorerConfig, ExplorerSession, FileStore, HttpApi};
//!
//! let config = ExplorerConfig::from_env()?;
//! let api = Arc::new(HttpApi::from_config(&config)?);
//! let store = Arc::new(FileStore::new(&config.state_dir));
//! let session = ExplorerSession::restore(api, store, config).await;
//!
//! session.start().await?;
//! session.set_keywords(["Ozempic"]).await;
//! session.load_more_mentions().await;
//! ```

// Configuration
pub mod config;

// Core entities
pub mod entities;

// Error types
pub mod errors;

// Persistence port
pub mod storage;

// Service contracts and HTTP client
pub mod api;

// Paginated lists
pub mod pagination;

// Content highlighting
pub mod highlight;

// Domain facades
pub mod domain;

// Terminal UI helpers
pub mod ui;

mod sync;

// Re-export key types for convenience
pub use api::{CatalogApi, ExplorerApi, HttpApi, MentionsApi, RuleExecutor, RulesApi};
pub use config::ExplorerConfig;
pub use domain::{EngineState, ExecutionEngine, ExplorerSession, RulesDomain, SelectionDomain};
pub use entities::{
    AuthorStat, DateRange, FilterSelection, Keyword, ListTab, Mention, Page, ResultTable, Rule,
    RuleId, RulePatch, RuleResult,
};
pub use errors::{ExplorerError, ExplorerResult};
pub use highlight::{highlight, HighlightKind, Span};
pub use pagination::{MergeOutcome, PaginatedCollection, PaginationState};
pub use storage::{FileStore, KeyValueStore, MemoryStore, PersistedState};
