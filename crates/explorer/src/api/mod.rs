//! Collaborator contracts consumed by the explorer core.
//!
//! The analysis service owns transport and storage; the core only sees
//! these traits. [`HttpApi`] implements all of them over REST.

mod http;

pub use http::HttpApi;

use async_trait::async_trait;

use crate::entities::{
    AuthorStat, DailyCount, FilterSelection, KeywordStat, Mention, Page, Rule, RuleDraft, RuleId,
    RuleResult, SentimentBreakdown,
};
use crate::errors::ExplorerResult;

/// Keyword catalog
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Monitored keywords with their mention counts
    async fn list_keywords(&self) -> ExplorerResult<Vec<KeywordStat>>;
}

/// Filtered mention queries and aggregates
#[async_trait]
pub trait MentionsApi: Send + Sync {
    async fn query_mentions(
        &self,
        filter: &FilterSelection,
        offset: usize,
        limit: usize,
    ) -> ExplorerResult<Page<Mention>>;

    async fn query_authors(
        &self,
        filter: &FilterSelection,
        offset: usize,
        limit: usize,
    ) -> ExplorerResult<Page<AuthorStat>>;

    async fn count_unique_authors(&self, filter: &FilterSelection) -> ExplorerResult<u64>;

    async fn counts_by_day(&self, filter: &FilterSelection) -> ExplorerResult<Vec<DailyCount>>;

    async fn sentiment_breakdown(
        &self,
        filter: &FilterSelection,
    ) -> ExplorerResult<SentimentBreakdown>;
}

/// Persisted rule CRUD
#[async_trait]
pub trait RulesApi: Send + Sync {
    /// All rules in creation order
    async fn list_rules(&self) -> ExplorerResult<Vec<Rule>>;

    /// Create a rule, or replace rule `id` when given
    async fn create_or_update_rule(
        &self,
        draft: &RuleDraft,
        id: Option<RuleId>,
    ) -> ExplorerResult<Rule>;

    async fn delete_rule(&self, id: RuleId) -> ExplorerResult<()>;
}

/// External analysis engine that runs a rule over the filtered data
#[async_trait]
pub trait RuleExecutor: Send + Sync {
    /// Run a rule. `Err` means the call itself failed; a service-reported
    /// failure comes back as `Ok(RuleResult::Error { .. })`.
    async fn execute_rule(
        &self,
        rule_id: RuleId,
        filter: &FilterSelection,
        context: Option<&RuleResult>,
    ) -> ExplorerResult<RuleResult>;
}

/// Everything a session needs from the service
pub trait ExplorerApi: CatalogApi + MentionsApi + RulesApi + RuleExecutor {}

impl<T> ExplorerApi for T where T: CatalogApi + MentionsApi + RulesApi + RuleExecutor {}
