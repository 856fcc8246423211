//! Async driver around [`PaginationState`].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::state::{FetchTicket, Generation, MergeOutcome, PaginationState};
use crate::entities::{FilterSelection, Page};
use crate::errors::ExplorerResult;
use crate::sync::lock;

/// Fetches one offset/limit window of a filtered list
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    async fn fetch(
        &self,
        filter: &FilterSelection,
        offset: usize,
        limit: usize,
    ) -> ExplorerResult<Page<T>>;
}

/// A filter-reactive paginated list.
///
/// State lives behind a plain mutex that is only held for the synchronous
/// transitions, never across a fetch.
pub struct PaginatedCollection<T> {
    state: Mutex<PaginationState<T>>,
    source: Arc<dyn PageSource<T>>,
}

impl<T: Clone + Send + 'static> PaginatedCollection<T> {
    pub fn new(source: Arc<dyn PageSource<T>>, page_size: usize) -> Self {
        Self {
            state: Mutex::new(PaginationState::new(page_size)),
            source,
        }
    }

    /// Start a new generation for `filter` without fetching yet.
    ///
    /// The returned ticket must be passed to [`Self::fetch`].
    pub fn prepare_reset(&self, filter: FilterSelection) -> FetchTicket {
        let ticket = lock(&self.state).begin_reset(filter);
        debug!(
            list = self.source.name(),
            generation = ticket.generation,
            "Reset"
        );
        ticket
    }

    /// Run the fetch for `ticket` and merge its response
    pub async fn fetch(&self, ticket: FetchTicket) -> MergeOutcome {
        let result = self
            .source
            .fetch(&ticket.filter, ticket.offset, ticket.limit)
            .await;
        if let Err(e) = &result {
            warn!(
                list = self.source.name(),
                offset = ticket.offset,
                error = %e,
                "Page fetch failed"
            );
        }

        let outcome = lock(&self.state).complete(&ticket, result);
        if outcome == MergeOutcome::Stale {
            debug!(
                list = self.source.name(),
                generation = ticket.generation,
                "Discarded stale page"
            );
        }
        outcome
    }

    /// Discard all pages and load page 0 for `filter`
    pub async fn reset(&self, filter: FilterSelection) -> MergeOutcome {
        let ticket = self.prepare_reset(filter);
        self.fetch(ticket).await
    }

    /// Load the next page.
    ///
    /// Returns `None` without fetching while a page is loading or when
    /// nothing more is available.
    pub async fn load_next(&self) -> Option<MergeOutcome> {
        let ticket = lock(&self.state).begin_next();
        match ticket {
            Some(ticket) => Some(self.fetch(ticket).await),
            None => {
                debug!(list = self.source.name(), "Load next skipped");
                None
            }
        }
    }

    /// Copy of the full state
    pub fn snapshot(&self) -> PaginationState<T> {
        lock(&self.state).clone()
    }

    pub fn items(&self) -> Vec<T> {
        lock(&self.state).items().to_vec()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).is_empty()
    }

    pub fn total(&self) -> usize {
        lock(&self.state).total()
    }

    pub fn has_more(&self) -> bool {
        lock(&self.state).has_more()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).is_loading()
    }

    pub fn generation(&self) -> Generation {
        lock(&self.state).generation()
    }

    /// First held item matching `predicate`
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        lock(&self.state).items().iter().find(|item| predicate(item)).cloned()
    }
}
