//! Filter selection domain facade.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::entities::{normalize_keywords, normalize_sources, DateRange, FilterSelection};
use crate::errors::ExplorerResult;
use crate::storage::{keys, write_key, KeyValueStore};
use crate::sync::lock;

/// A single edit to the filter selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Keywords(Vec<String>),
    Sources(Vec<String>),
    DateRange(Option<DateRange>),
}

/// Holds the current filter and persists every accepted change
pub struct SelectionDomain {
    current: Mutex<FilterSelection>,
    store: Arc<dyn KeyValueStore>,
    default_sources: Vec<String>,
}

impl SelectionDomain {
    /// Create a selection domain starting from a restored filter
    pub fn new(
        initial: FilterSelection,
        store: Arc<dyn KeyValueStore>,
        default_sources: Vec<String>,
    ) -> Self {
        Self {
            current: Mutex::new(initial),
            store,
            default_sources,
        }
    }

    /// Snapshot of the current filter
    pub fn current(&self) -> FilterSelection {
        lock(&self.current).clone()
    }

    /// Apply a change in memory and return the normalized result
    pub fn apply(&self, change: FilterChange) -> FilterSelection {
        let mut current = lock(&self.current);
        match change {
            FilterChange::Keywords(keywords) => {
                current.keywords = normalize_keywords(keywords);
            }
            FilterChange::Sources(sources) => {
                current.sources = normalize_sources(sources, &self.default_sources);
            }
            FilterChange::DateRange(range) => {
                current.date_range = range.filter(|r| !r.is_open());
            }
        }
        debug!(filter = %current.describe(), "Filter changed");
        current.clone()
    }

    /// Write every filter key to the store
    pub async fn persist(&self, filter: &FilterSelection) -> ExplorerResult<()> {
        write_key(self.store.as_ref(), keys::SELECTED_KEYWORDS, &filter.keywords).await?;
        write_key(self.store.as_ref(), keys::SELECTED_SOURCES, &filter.sources).await?;
        write_key(
            self.store.as_ref(),
            keys::SELECTED_DATE_RANGE,
            &filter.date_range,
        )
        .await
    }

    /// Persist, logging instead of failing
    pub async fn persist_or_warn(&self, filter: &FilterSelection) {
        if let Err(e) = self.persist(filter).await {
            warn!(
                store = self.store.store_type(),
                error = %e,
                "Failed to persist filter selection"
            );
        }
    }
}
