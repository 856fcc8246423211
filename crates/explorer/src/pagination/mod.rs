//! Offset/limit pagination for filter-reactive lists.

mod collection;
mod sources;
mod state;

pub use collection::{PageSource, PaginatedCollection};
pub use sources::{AuthorPages, MentionPages};
pub use state::{FetchKind, FetchTicket, Generation, MergeOutcome, PaginationState};
