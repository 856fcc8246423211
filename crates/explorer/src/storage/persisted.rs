//! Typed view over the persisted session keys.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::traits::KeyValueStore;
use crate::config::ExplorerConfig;
use crate::entities::{DateRange, FilterSelection, ListTab, Mention, RuleId};
use crate::errors::ExplorerResult;

/// Persisted key names
pub mod keys {
    pub const SELECTED_KEYWORDS: &str = "selectedKeywords";
    pub const SELECTED_SOURCES: &str = "selectedSources";
    pub const SELECTED_DATE_RANGE: &str = "selectedDateRange";
    pub const ACTIVE_LIST_TAB: &str = "activeListTab";
    pub const SELECTED_POST: &str = "selectedPost";
    pub const ACTIVE_RULE_ID: &str = "activeRuleId";
}

/// Session state restored at startup
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    pub filter: FilterSelection,
    pub list_tab: ListTab,
    pub selected_post: Option<Mention>,
    pub active_rule_id: Option<RuleId>,
}

impl PersistedState {
    /// Compiled-in defaults
    pub fn defaults(config: &ExplorerConfig) -> Self {
        Self {
            filter: FilterSelection::new(
                &config.default_keywords,
                &config.default_sources,
                &config.default_sources,
            ),
            list_tab: ListTab::default(),
            selected_post: None,
            active_rule_id: None,
        }
    }

    /// Restore every key independently.
    ///
    /// A key that is missing, unreadable or malformed falls back to its
    /// default; this never fails.
    pub async fn restore(store: &dyn KeyValueStore, config: &ExplorerConfig) -> Self {
        let defaults = Self::defaults(config);

        let keywords: Option<Vec<String>> = read_key(store, keys::SELECTED_KEYWORDS).await;
        let sources: Option<Vec<String>> = read_key(store, keys::SELECTED_SOURCES).await;
        let date_range: Option<Option<DateRange>> =
            read_key(store, keys::SELECTED_DATE_RANGE).await;

        let filter = FilterSelection::new(
            keywords.unwrap_or_else(|| config.default_keywords.clone()),
            sources.unwrap_or_else(|| config.default_sources.clone()),
            &config.default_sources,
        )
        .with_date_range(date_range.flatten());

        Self {
            filter,
            list_tab: read_key(store, keys::ACTIVE_LIST_TAB)
                .await
                .unwrap_or(defaults.list_tab),
            selected_post: read_key::<Option<Mention>>(store, keys::SELECTED_POST)
                .await
                .flatten(),
            active_rule_id: read_key::<Option<RuleId>>(store, keys::ACTIVE_RULE_ID)
                .await
                .flatten(),
        }
    }
}

/// Read and decode one key, logging and discarding anything unusable
pub async fn read_key<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let value = match store.get(key).await {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!(key, "No persisted value");
            return None;
        }
        Err(e) => {
            warn!(key, error = %e, "Failed to read persisted value, using default");
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(key, error = %e, "Malformed persisted value, using default");
            None
        }
    }
}

/// Encode and write one key
pub async fn write_key<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> ExplorerResult<()> {
    let encoded = serde_json::to_value(value)?;
    store.set(key, encoded).await
}
