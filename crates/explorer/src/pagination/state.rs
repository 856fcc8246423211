//! Pagination state machine with pure transitions.
//!
//! Every fetch is described by a [`FetchTicket`] carrying the filter
//! generation it was issued under. A ticket whose generation no longer
//! matches is stale and its response is dropped without touching state.

use crate::entities::{FilterSelection, Page};

/// Monotonic counter bumped on every reset
pub type Generation = u64;

/// Which transition issued a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Reset,
    Next,
}

/// Description of one in-flight fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: Generation,
    pub kind: FetchKind,
    /// Page index being fetched
    pub page: usize,
    pub offset: usize,
    pub limit: usize,
    /// Filter snapshot the fetch runs under
    pub filter: FilterSelection,
}

/// What completing a ticket did to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Response merged; `added` items appended or loaded
    Applied { added: usize },
    /// Fetch failed; state settled without new items
    Failed,
    /// Ticket belongs to an older generation; nothing changed
    Stale,
}

/// Accumulated pages of one result list
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationState<T> {
    items: Vec<T>,
    page: usize,
    page_size: usize,
    total: usize,
    has_more: bool,
    loading: bool,
    generation: Generation,
    filter: Option<FilterSelection>,
}

impl<T> PaginationState<T> {
    /// Empty, settled state; nothing is fetched until the first reset
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            page_size: page_size.max(1),
            total: 0,
            has_more: false,
            loading: false,
            generation: 0,
            filter: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Filter of the current generation
    pub fn filter(&self) -> Option<&FilterSelection> {
        self.filter.as_ref()
    }

    /// Clear everything and issue the page-0 fetch for `filter`.
    ///
    /// Always succeeds: a reset supersedes any outstanding fetch.
    pub fn begin_reset(&mut self, filter: FilterSelection) -> FetchTicket {
        self.generation += 1;
        self.items.clear();
        self.page = 0;
        self.total = 0;
        self.has_more = true;
        self.loading = true;
        self.filter = Some(filter.clone());

        FetchTicket {
            generation: self.generation,
            kind: FetchKind::Reset,
            page: 0,
            offset: 0,
            limit: self.page_size,
            filter,
        }
    }

    /// Issue the fetch for the next page.
    ///
    /// Returns `None`, changing nothing, while a fetch is outstanding, when
    /// there is nothing more to load, or before the first reset.
    pub fn begin_next(&mut self) -> Option<FetchTicket> {
        if self.loading || !self.has_more {
            return None;
        }
        let filter = self.filter.clone()?;

        self.loading = true;
        let page = self.page + 1;
        Some(FetchTicket {
            generation: self.generation,
            kind: FetchKind::Next,
            page,
            offset: page * self.page_size,
            limit: self.page_size,
            filter,
        })
    }

    /// Apply the response for `ticket`.
    ///
    /// `total` is clamped to at least the number of held items, so
    /// `has_more == (len < total)` holds after every settled transition.
    pub fn complete<E>(&mut self, ticket: &FetchTicket, result: Result<Page<T>, E>) -> MergeOutcome {
        if ticket.generation != self.generation {
            return MergeOutcome::Stale;
        }

        let outcome = match (ticket.kind, result) {
            (FetchKind::Reset, Ok(page)) => {
                let added = page.items.len();
                self.items = page.items;
                self.page = 0;
                self.total = page.total.max(self.items.len());
                MergeOutcome::Applied { added }
            }
            (FetchKind::Reset, Err(_)) => {
                self.items.clear();
                self.page = 0;
                self.total = 0;
                MergeOutcome::Failed
            }
            (FetchKind::Next, Ok(page)) => {
                let added = page.items.len();
                if added == 0 {
                    // upstream shrank or lied about the total
                    self.total = self.items.len();
                } else {
                    self.items.extend(page.items);
                    self.page = ticket.page;
                    self.total = page.total.max(self.items.len());
                }
                MergeOutcome::Applied { added }
            }
            (FetchKind::Next, Err(_)) => MergeOutcome::Failed,
        };

        self.has_more = self.items.len() < self.total;
        self.loading = false;
        outcome
    }
}
