//! Explorer session: filter, lists, rules and execution wired together.

use std::sync::{Arc, Mutex};

use futures::join;
use tracing::{debug, info, warn};

use super::execution::{EngineState, ExecutionEngine};
use super::rules::RulesDomain;
use super::selection::{FilterChange, SelectionDomain};
use crate::api::{CatalogApi, ExplorerApi, MentionsApi};
use crate::config::ExplorerConfig;
use crate::entities::{
    AuthorStat, DailyCount, DateRange, FilterSelection, Keyword, ListTab, Mention, Rule, RuleId,
    RulePatch, RuleResult, SentimentBreakdown,
};
use crate::errors::{ExplorerError, ExplorerResult};
use crate::pagination::{AuthorPages, MentionPages, MergeOutcome, PaginatedCollection};
use crate::storage::{keys, write_key, KeyValueStore, PersistedState};
use crate::sync::lock;

/// Unique-author count tagged with the filter generation it belongs to
#[derive(Debug, Default)]
struct AuthorCount {
    generation: u64,
    count: Option<u64>,
}

/// Tab and selected mention
#[derive(Debug, Default)]
struct ViewState {
    list_tab: ListTab,
    selected_post: Option<Mention>,
}

/// Aggregates for the current filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub counts_by_day: Vec<DailyCount>,
    pub sentiment: SentimentBreakdown,
}

/// One explorer session over a service and a state store
pub struct ExplorerSession {
    config: ExplorerConfig,
    store: Arc<dyn KeyValueStore>,
    catalog: Arc<dyn CatalogApi>,
    stats: Arc<dyn MentionsApi>,
    selection: SelectionDomain,
    mentions: PaginatedCollection<Mention>,
    authors: PaginatedCollection<AuthorStat>,
    author_count: Mutex<AuthorCount>,
    keywords: Mutex<Vec<Keyword>>,
    view: Mutex<ViewState>,
    rules: RulesDomain,
    engine: ExecutionEngine,
}

impl ExplorerSession {
    /// Create a session from already restored state; nothing is fetched
    pub fn new<A>(
        api: Arc<A>,
        store: Arc<dyn KeyValueStore>,
        config: ExplorerConfig,
        restored: PersistedState,
    ) -> Self
    where
        A: ExplorerApi + 'static,
    {
        Self {
            selection: SelectionDomain::new(
                restored.filter,
                store.clone(),
                config.default_sources.clone(),
            ),
            mentions: PaginatedCollection::<Mention>::new(
                Arc::new(MentionPages::new(api.clone())),
                config.page_size,
            ),
            authors: PaginatedCollection::<AuthorStat>::new(
                Arc::new(AuthorPages::new(api.clone())),
                config.author_page_size,
            ),
            author_count: Mutex::new(AuthorCount::default()),
            keywords: Mutex::new(vec![Keyword::all(0)]),
            view: Mutex::new(ViewState {
                list_tab: restored.list_tab,
                selected_post: restored.selected_post,
            }),
            rules: RulesDomain::new(api.clone(), restored.active_rule_id),
            engine: ExecutionEngine::new(api.clone()),
            catalog: api.clone(),
            stats: api,
            store,
            config,
        }
    }

    /// Restore persisted state and create a session
    pub async fn restore<A>(
        api: Arc<A>,
        store: Arc<dyn KeyValueStore>,
        config: ExplorerConfig,
    ) -> Self
    where
        A: ExplorerApi + 'static,
    {
        let restored = PersistedState::restore(store.as_ref(), &config).await;
        debug!(filter = %restored.filter.describe(), "Session state restored");
        Self::new(api, store, config, restored)
    }

    /// Initial load: keyword catalog, rules, and both lists.
    ///
    /// List and catalog failures are logged; a rule list failure is returned
    /// after the lists have loaded.
    pub async fn start(&self) -> ExplorerResult<()> {
        let filter = self.selection.current();
        let (_, rules, ()) = join!(
            self.refresh_keywords(),
            self.rules.load(),
            self.reload(filter)
        );
        if let Err(e) = &rules {
            warn!(error = %e, "Failed to load rules");
        }
        self.persist_active_rule().await;
        rules.map(|_| ())
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    // Filter selection

    pub fn filter(&self) -> FilterSelection {
        self.selection.current()
    }

    pub async fn set_keywords<I>(&self, keywords: I) -> FilterSelection
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let keywords = keywords.into_iter().map(Into::into).collect();
        self.change_filter(FilterChange::Keywords(keywords)).await
    }

    pub async fn set_sources<I>(&self, sources: I) -> FilterSelection
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let sources = sources.into_iter().map(Into::into).collect();
        self.change_filter(FilterChange::Sources(sources)).await
    }

    pub async fn set_date_range(&self, range: Option<DateRange>) -> FilterSelection {
        self.change_filter(FilterChange::DateRange(range)).await
    }

    /// Apply a change, persist it, and reload every dependent list
    async fn change_filter(&self, change: FilterChange) -> FilterSelection {
        let filter = self.selection.apply(change);
        lock(&self.view).selected_post = None;

        let reload = self.reload(filter.clone());
        let persist = async {
            self.selection.persist_or_warn(&filter).await;
            self.write_or_warn(keys::SELECTED_POST, &Option::<Mention>::None)
                .await;
        };
        join!(reload, persist);
        filter
    }

    /// Reset both lists and the author count for `filter`.
    ///
    /// Both resets happen before the first fetch is awaited.
    async fn reload(&self, filter: FilterSelection) {
        let generation = {
            let mut count = lock(&self.author_count);
            count.generation += 1;
            count.count = None;
            count.generation
        };
        let mention_ticket = self.mentions.prepare_reset(filter.clone());
        let author_ticket = self.authors.prepare_reset(filter.clone());

        let (mentions, authors, ()) = join!(
            self.mentions.fetch(mention_ticket),
            self.authors.fetch(author_ticket),
            self.refresh_author_count(generation, &filter)
        );
        debug!(?mentions, ?authors, generation, "Lists reloaded");
    }

    async fn refresh_author_count(&self, generation: u64, filter: &FilterSelection) {
        match self.stats.count_unique_authors(filter).await {
            Ok(value) => {
                let mut count = lock(&self.author_count);
                if count.generation == generation {
                    count.count = Some(value);
                } else {
                    debug!(generation, "Discarded stale author count");
                }
            }
            Err(e) => warn!(error = %e, "Failed to count unique authors"),
        }
    }

    // Lists

    pub fn mentions(&self) -> &PaginatedCollection<Mention> {
        &self.mentions
    }

    pub fn authors(&self) -> &PaginatedCollection<AuthorStat> {
        &self.authors
    }

    pub async fn load_more_mentions(&self) -> Option<MergeOutcome> {
        self.mentions.load_next().await
    }

    pub async fn load_more_authors(&self) -> Option<MergeOutcome> {
        self.authors.load_next().await
    }

    /// Load the next page of whichever list is in front
    pub async fn load_more(&self) -> Option<MergeOutcome> {
        match self.list_tab() {
            ListTab::Mentions => self.load_more_mentions().await,
            ListTab::Authors => self.load_more_authors().await,
        }
    }

    /// Unique authors for the current filter, once known
    pub fn unique_author_count(&self) -> Option<u64> {
        lock(&self.author_count).count
    }

    // Keyword catalog

    pub fn keywords(&self) -> Vec<Keyword> {
        lock(&self.keywords).clone()
    }

    /// Refresh the keyword catalog, keeping the previous one on failure
    pub async fn refresh_keywords(&self) -> Vec<Keyword> {
        match self.catalog.list_keywords().await {
            Ok(stats) => {
                let mut catalog: Vec<Keyword> = stats.into_iter().map(Keyword::from).collect();
                if !catalog.iter().any(Keyword::is_all) {
                    let total = catalog.iter().map(|k| k.count).sum();
                    catalog.insert(0, Keyword::all(total));
                }
                debug!(count = catalog.len(), "Keyword catalog loaded");
                *lock(&self.keywords) = catalog.clone();
                catalog
            }
            Err(e) => {
                warn!(error = %e, "Failed to load keyword catalog");
                self.keywords()
            }
        }
    }

    // Statistics

    /// Daily counts and sentiment breakdown for the current filter
    pub async fn stats(&self) -> ExplorerResult<FilterStats> {
        let filter = self.filter();
        let (counts_by_day, sentiment) = join!(
            self.stats.counts_by_day(&filter),
            self.stats.sentiment_breakdown(&filter)
        );
        Ok(FilterStats {
            counts_by_day: counts_by_day?,
            sentiment: sentiment?,
        })
    }

    // View state

    pub fn list_tab(&self) -> ListTab {
        lock(&self.view).list_tab
    }

    pub async fn set_list_tab(&self, tab: ListTab) {
        lock(&self.view).list_tab = tab;
        self.write_or_warn(keys::ACTIVE_LIST_TAB, &tab).await;
    }

    pub fn selected_post(&self) -> Option<Mention> {
        lock(&self.view).selected_post.clone()
    }

    /// Select a loaded mention by id
    pub async fn select_post(&self, mention_id: i64) -> ExplorerResult<Mention> {
        let mention = self
            .mentions
            .find(|m| m.id == mention_id)
            .ok_or(ExplorerError::MentionNotFound { mention_id })?;
        lock(&self.view).selected_post = Some(mention.clone());
        self.write_or_warn(keys::SELECTED_POST, &Some(&mention)).await;
        Ok(mention)
    }

    pub async fn clear_selected_post(&self) {
        lock(&self.view).selected_post = None;
        self.write_or_warn(keys::SELECTED_POST, &Option::<Mention>::None)
            .await;
    }

    // Rules

    pub fn rules(&self) -> Vec<Rule> {
        self.rules.list()
    }

    pub fn rule(&self, id: RuleId) -> Option<Rule> {
        self.rules.get(id)
    }

    pub fn active_rule(&self) -> Option<Rule> {
        self.rules.active()
    }

    pub fn active_rule_id(&self) -> Option<RuleId> {
        self.rules.active_id()
    }

    pub async fn reload_rules(&self) -> ExplorerResult<Vec<Rule>> {
        let rules = self.rules.load().await?;
        self.persist_active_rule().await;
        Ok(rules)
    }

    pub async fn set_active_rule(&self, id: RuleId) -> ExplorerResult<()> {
        self.rules.set_active(id)?;
        self.persist_active_rule().await;
        Ok(())
    }

    /// Create a rule with the configured defaults and make it active
    pub async fn create_rule(&self) -> ExplorerResult<Rule> {
        let rule = self
            .rules
            .create(&self.config.new_rule_title, &self.config.new_rule_instruction)
            .await?;
        self.persist_active_rule().await;
        Ok(rule)
    }

    pub async fn update_rule(&self, id: RuleId, patch: &RulePatch) -> ExplorerResult<Rule> {
        self.rules.update(id, patch).await
    }

    /// Delete a rule and its cached result; returns the new active rule id
    pub async fn delete_rule(&self, id: RuleId) -> ExplorerResult<Option<RuleId>> {
        let active = self.rules.delete(id).await?;
        self.engine.forget(id);
        self.persist_active_rule().await;
        Ok(active)
    }

    // Execution

    pub fn engine_state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn result(&self, rule_id: RuleId) -> Option<RuleResult> {
        self.engine.result(rule_id)
    }

    /// Execute one rule against the current filter
    pub async fn execute(&self, rule_id: RuleId) -> ExplorerResult<RuleResult> {
        let rules = self.rules.list();
        let filter = self.filter();
        self.engine.execute(&rules, rule_id, &filter).await
    }

    pub async fn execute_active(&self) -> ExplorerResult<RuleResult> {
        let id = self.rules.active_id().ok_or(ExplorerError::NoActiveRule)?;
        self.execute(id).await
    }

    /// Execute every rule in list order so each chain link sees a fresh
    /// predecessor result
    pub async fn run_all(&self) -> ExplorerResult<Vec<(Rule, RuleResult)>> {
        let rules = self.rules.list();
        let filter = self.filter();
        let mut results = Vec::with_capacity(rules.len());
        for rule in &rules {
            let result = self.engine.execute(&rules, rule.id, &filter).await?;
            results.push((rule.clone(), result));
        }
        info!(count = results.len(), "Executed all rules");
        Ok(results)
    }

    // Persistence helpers

    async fn persist_active_rule(&self) {
        let active = self.rules.active_id();
        self.write_or_warn(keys::ACTIVE_RULE_ID, &active).await;
    }

    async fn write_or_warn<T: serde::Serialize + ?Sized + Sync>(&self, key: &str, value: &T) {
        if let Err(e) = write_key(self.store.as_ref(), key, value).await {
            warn!(key, error = %e, "Failed to persist session state");
        }
    }
}
