//! [`PageSource`] adapters over the mentions API.

use std::sync::Arc;

use async_trait::async_trait;

use super::collection::PageSource;
use crate::api::MentionsApi;
use crate::entities::{AuthorStat, FilterSelection, Mention, Page};
use crate::errors::ExplorerResult;

/// Mentions matching the filter, newest first
pub struct MentionPages {
    api: Arc<dyn MentionsApi>,
}

impl MentionPages {
    pub fn new(api: Arc<dyn MentionsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource<Mention> for MentionPages {
    fn name(&self) -> &'static str {
        "mentions"
    }

    async fn fetch(
        &self,
        filter: &FilterSelection,
        offset: usize,
        limit: usize,
    ) -> ExplorerResult<Page<Mention>> {
        self.api.query_mentions(filter, offset, limit).await
    }
}

/// Per-author mention counts matching the filter
pub struct AuthorPages {
    api: Arc<dyn MentionsApi>,
}

impl AuthorPages {
    pub fn new(api: Arc<dyn MentionsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource<AuthorStat> for AuthorPages {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn fetch(
        &self,
        filter: &FilterSelection,
        offset: usize,
        limit: usize,
    ) -> ExplorerResult<Page<AuthorStat>> {
        self.api.query_authors(filter, offset, limit).await
    }
}
