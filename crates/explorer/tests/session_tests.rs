//! Session-level behaviour against an in-memory analysis service.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::Semaphore;

use explorer::api::{CatalogApi, MentionsApi, RuleExecutor, RulesApi};
use explorer::config::ExplorerConfig;
use explorer::domain::{EngineState, ExplorerSession};
use explorer::entities::{
    AuthorStat, DailyCount, FilterSelection, KeywordStat, ListTab, Mention, Page, Rule, RuleDraft,
    RuleId, RuleOutput, RulePatch, RuleResult, SentimentBreakdown,
};
use explorer::errors::{ExplorerError, ExplorerResult};
use explorer::pagination::MergeOutcome;
use explorer::storage::{keys, FileStore, KeyValueStore, MemoryStore};

fn mention(id: i64, keyword: &str) -> Mention {
    Mention {
        id,
        author: Some(format!("author{}", id % 7)),
        content: Some(format!("Post {id} about {keyword}")),
        url: None,
        date: Some("2024-03-01T10:00:00Z".to_string()),
        source: "reddit".to_string(),
        sentiment: "neutral".to_string(),
        keyword: Some(keyword.to_string()),
        extracted_data: None,
    }
}

/// In-memory service: mentions alternate between two keywords
struct FakeService {
    mentions: Vec<Mention>,
    rules: Mutex<Vec<Rule>>,
    next_rule_id: AtomicI64,
    mention_calls: AtomicUsize,
    author_calls: AtomicUsize,
    executions: Mutex<Vec<(RuleId, Option<RuleResult>)>>,
    fail_catalog: AtomicBool,
    /// Holds fetches of pages after the first
    next_page_gate: Option<Semaphore>,
}

impl FakeService {
    fn new(ozempic: usize, wegovy: usize) -> Self {
        let mut mentions = Vec::new();
        let mut id = 0;
        for _ in 0..ozempic {
            id += 1;
            mentions.push(mention(id, "Ozempic"));
        }
        for _ in 0..wegovy {
            id += 1;
            mentions.push(mention(id, "Wegovy"));
        }
        Self {
            mentions,
            rules: Mutex::new(Vec::new()),
            next_rule_id: AtomicI64::new(1),
            mention_calls: AtomicUsize::new(0),
            author_calls: AtomicUsize::new(0),
            executions: Mutex::new(Vec::new()),
            fail_catalog: AtomicBool::new(false),
            next_page_gate: None,
        }
    }

    fn gated(mut self) -> Self {
        self.next_page_gate = Some(Semaphore::new(0));
        self
    }

    fn with_rules(self, rules: &[(&str, bool)]) -> Self {
        for (title, chaining) in rules {
            let id = self.next_rule_id.fetch_add(1, Ordering::SeqCst);
            self.rules.lock().unwrap().push(Rule {
                id,
                title: (*title).to_string(),
                instruction: format!("Analyze {title}"),
                is_chaining: *chaining,
                created_at: None,
            });
        }
        self
    }

    fn matching(&self, filter: &FilterSelection) -> Vec<Mention> {
        let keywords = filter.keyword_constraint();
        self.mentions
            .iter()
            .filter(|m| {
                keywords.is_empty() || keywords.contains(&m.keyword.as_deref().unwrap_or_default())
            })
            .cloned()
            .collect()
    }

    fn release_next_page(&self) {
        if let Some(gate) = &self.next_page_gate {
            gate.add_permits(1);
        }
    }
}

#[async_trait]
impl CatalogApi for FakeService {
    async fn list_keywords(&self) -> ExplorerResult<Vec<KeywordStat>> {
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(ExplorerError::Transport {
                reason: "connection refused".to_string(),
            });
        }
        Ok(vec![
            KeywordStat {
                keyword: "Ozempic".to_string(),
                count: 3,
            },
            KeywordStat {
                keyword: "Wegovy".to_string(),
                count: 2,
            },
        ])
    }
}

#[async_trait]
impl MentionsApi for FakeService {
    async fn query_mentions(
        &self,
        filter: &FilterSelection,
        offset: usize,
        limit: usize,
    ) -> ExplorerResult<Page<Mention>> {
        self.mention_calls.fetch_add(1, Ordering::SeqCst);
        if offset > 0 {
            if let Some(gate) = &self.next_page_gate {
                gate.acquire().await.unwrap().forget();
            }
        }
        let all = self.matching(filter);
        let items = all.iter().skip(offset).take(limit).cloned().collect();
        Ok(Page::new(items, all.len()))
    }

    async fn query_authors(
        &self,
        filter: &FilterSelection,
        offset: usize,
        limit: usize,
    ) -> ExplorerResult<Page<AuthorStat>> {
        self.author_calls.fetch_add(1, Ordering::SeqCst);
        let mut authors: Vec<AuthorStat> = Vec::new();
        for m in self.matching(filter) {
            let name = m.author_display().to_string();
            match authors.iter_mut().find(|a| a.author == name) {
                Some(stat) => stat.count += 1,
                None => authors.push(AuthorStat {
                    author: name,
                    count: 1,
                }),
            }
        }
        let total = authors.len();
        let items = authors.into_iter().skip(offset).take(limit).collect();
        Ok(Page::new(items, total))
    }

    async fn count_unique_authors(&self, filter: &FilterSelection) -> ExplorerResult<u64> {
        let page = self.query_authors(filter, 0, usize::MAX).await?;
        Ok(page.total as u64)
    }

    async fn counts_by_day(&self, filter: &FilterSelection) -> ExplorerResult<Vec<DailyCount>> {
        Ok(vec![DailyCount {
            date: "2024-03-01".to_string(),
            count: self.matching(filter).len() as u64,
        }])
    }

    async fn sentiment_breakdown(
        &self,
        filter: &FilterSelection,
    ) -> ExplorerResult<SentimentBreakdown> {
        let mut breakdown = SentimentBreakdown::new();
        breakdown.insert("neutral".to_string(), self.matching(filter).len() as u64);
        Ok(breakdown)
    }
}

#[async_trait]
impl RulesApi for FakeService {
    async fn list_rules(&self) -> ExplorerResult<Vec<Rule>> {
        Ok(self.rules.lock().unwrap().clone())
    }

    async fn create_or_update_rule(
        &self,
        draft: &RuleDraft,
        id: Option<RuleId>,
    ) -> ExplorerResult<Rule> {
        let mut rules = self.rules.lock().unwrap();
        let id = id.unwrap_or_else(|| self.next_rule_id.fetch_add(1, Ordering::SeqCst));
        let rule = Rule {
            id,
            title: draft.title.clone(),
            instruction: draft.instruction.clone(),
            is_chaining: draft.is_chaining,
            created_at: Some("2024-03-01T10:00:00Z".to_string()),
        };
        match rules.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = rule.clone(),
            None => rules.push(rule.clone()),
        }
        Ok(rule)
    }

    async fn delete_rule(&self, id: RuleId) -> ExplorerResult<()> {
        self.rules.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

#[async_trait]
impl RuleExecutor for FakeService {
    async fn execute_rule(
        &self,
        rule_id: RuleId,
        filter: &FilterSelection,
        context: Option<&RuleResult>,
    ) -> ExplorerResult<RuleResult> {
        self.executions
            .lock()
            .unwrap()
            .push((rule_id, context.cloned()));
        let row = json!({"rule": rule_id, "mentions": self.matching(filter).len()});
        Ok(RuleResult::Ok(RuleOutput {
            data: Some(vec![row.as_object().unwrap().clone()]),
            message: None,
            explanation: Some(format!("rule {rule_id}")),
            sql: None,
        }))
    }
}

fn config() -> ExplorerConfig {
    ExplorerConfig::default().with_page_size(50)
}

async fn session(service: Arc<FakeService>, store: Arc<MemoryStore>) -> ExplorerSession {
    ExplorerSession::restore(service, store, config()).await
}

#[tokio::test]
async fn test_paginates_to_the_end_then_stops_fetching() {
    let service = Arc::new(FakeService::new(120, 0));
    let session = session(service.clone(), Arc::new(MemoryStore::new())).await;
    session.start().await.unwrap();

    let mentions = session.mentions();
    assert_eq!(mentions.len(), 50);
    assert_eq!(mentions.total(), 120);
    assert!(mentions.has_more());

    session.load_more_mentions().await;
    assert_eq!(mentions.len(), 100);
    assert!(mentions.has_more());

    session.load_more_mentions().await;
    assert_eq!(mentions.len(), 120);
    assert!(!mentions.has_more());

    let calls = service.mention_calls.load(Ordering::SeqCst);
    let before = mentions.snapshot();
    assert!(session.load_more_mentions().await.is_none());
    assert_eq!(service.mention_calls.load(Ordering::SeqCst), calls);
    assert_eq!(mentions.snapshot(), before);
}

#[tokio::test]
async fn test_filter_change_resets_both_lists_and_persists() {
    let service = Arc::new(FakeService::new(80, 30));
    let store = Arc::new(MemoryStore::new());
    let session = session(service.clone(), store.clone()).await;
    session.start().await.unwrap();
    session.load_more_mentions().await;
    assert_eq!(session.mentions().len(), 100);

    let authors_before = service.author_calls.load(Ordering::SeqCst);
    let filter = session.set_keywords(["Wegovy"]).await;

    assert_eq!(filter.keyword_constraint(), vec!["Wegovy"]);
    assert_eq!(session.mentions().len(), 30);
    assert!(!session.mentions().has_more());
    assert!(session
        .mentions()
        .items()
        .iter()
        .all(|m| m.keyword.as_deref() == Some("Wegovy")));
    assert_eq!(
        service.author_calls.load(Ordering::SeqCst),
        authors_before + 2,
        "author page and unique count are both refetched"
    );
    assert_eq!(session.unique_author_count(), Some(7));

    let persisted = store.get(keys::SELECTED_KEYWORDS).await.unwrap();
    assert_eq!(persisted, Some(json!(["Wegovy"])));
}

#[tokio::test]
async fn test_clearing_keywords_and_sources_falls_back() {
    let service = Arc::new(FakeService::new(10, 10));
    let session = session(service, Arc::new(MemoryStore::new())).await;

    let filter = session.set_keywords(Vec::<String>::new()).await;
    assert!(filter.is_unconstrained());
    assert_eq!(session.mentions().len(), 20);

    let filter = session.set_sources(Vec::<String>::new()).await;
    assert!(filter.sources.contains("reddit"));
}

#[tokio::test]
async fn test_stale_page_is_discarded_after_filter_change() {
    let service = Arc::new(FakeService::new(120, 20).gated());
    let session = session(service.clone(), Arc::new(MemoryStore::new())).await;
    session.start().await.unwrap();
    assert_eq!(session.mentions().len(), 50);

    let (stale, _) = tokio::join!(session.load_more_mentions(), async {
        let filter = session.set_keywords(["Wegovy"]).await;
        service.release_next_page();
        filter
    });

    assert_eq!(stale, Some(MergeOutcome::Stale));
    let mentions = session.mentions().items();
    assert_eq!(mentions.len(), 20);
    assert!(mentions
        .iter()
        .all(|m| m.keyword.as_deref() == Some("Wegovy")));
    assert!(!session.mentions().is_loading());
}

#[tokio::test]
async fn test_concurrent_load_more_issues_one_fetch() {
    let service = Arc::new(FakeService::new(120, 0).gated());
    let session = session(service.clone(), Arc::new(MemoryStore::new())).await;
    session.start().await.unwrap();
    let calls = service.mention_calls.load(Ordering::SeqCst);

    let (first, second) = tokio::join!(session.load_more_mentions(), async {
        let second = session.load_more_mentions().await;
        service.release_next_page();
        second
    });

    assert_eq!(first, Some(MergeOutcome::Applied { added: 50 }));
    assert_eq!(second, None);
    assert_eq!(service.mention_calls.load(Ordering::SeqCst), calls + 1);
}

#[tokio::test]
async fn test_chaining_uses_immediate_predecessor_result() {
    let service = Arc::new(FakeService::new(5, 0).with_rules(&[
        ("A", false),
        ("B", false),
        ("C", true),
    ]));
    let session = session(service.clone(), Arc::new(MemoryStore::new())).await;
    session.start().await.unwrap();

    session.execute(1).await.unwrap();
    session.execute(3).await.unwrap();
    let b_result = session.execute(2).await.unwrap();
    session.execute(3).await.unwrap();

    let executions = service.executions.lock().unwrap().clone();
    assert_eq!(executions[1], (3, None), "B never ran, so no context");
    assert_eq!(executions[3], (3, Some(b_result)));
    assert_eq!(session.engine_state(), EngineState::Idle);
}

#[tokio::test]
async fn test_run_all_chains_fresh_results() {
    let service = Arc::new(FakeService::new(5, 0).with_rules(&[
        ("A", false),
        ("B", true),
        ("C", true),
    ]));
    let session = session(service.clone(), Arc::new(MemoryStore::new())).await;
    session.start().await.unwrap();

    let results = session.run_all().await.unwrap();
    assert_eq!(results.len(), 3);

    let executions = service.executions.lock().unwrap().clone();
    assert_eq!(executions[0].1, None);
    assert_eq!(executions[1].1.as_ref(), Some(&results[0].1));
    assert_eq!(executions[2].1.as_ref(), Some(&results[1].1));
}

#[tokio::test]
async fn test_execute_active_requires_rule() {
    let service = Arc::new(FakeService::new(5, 0));
    let session = session(service, Arc::new(MemoryStore::new())).await;
    session.start().await.unwrap();

    let err = session.execute_active().await.unwrap_err();
    assert!(matches!(err, ExplorerError::NoActiveRule));
}

#[tokio::test]
async fn test_delete_reassigns_active_and_purges_result() {
    let service = Arc::new(FakeService::new(5, 0).with_rules(&[
        ("A", false),
        ("B", false),
        ("C", false),
    ]));
    let store = Arc::new(MemoryStore::new());
    let session = session(service, store.clone()).await;
    session.start().await.unwrap();
    session.set_active_rule(2).await.unwrap();
    session.execute_active().await.unwrap();
    assert!(session.result(2).is_some());

    assert_eq!(session.delete_rule(2).await.unwrap(), Some(1));
    assert_eq!(session.active_rule_id(), Some(1));
    assert!(session.result(2).is_none());
    assert_eq!(
        store.get(keys::ACTIVE_RULE_ID).await.unwrap(),
        Some(json!(1))
    );

    session.delete_rule(1).await.unwrap();
    assert_eq!(session.delete_rule(3).await.unwrap(), None);
    assert!(session.active_rule().is_none());
    assert_eq!(
        store.get(keys::ACTIVE_RULE_ID).await.unwrap(),
        Some(json!(null))
    );
}

#[tokio::test]
async fn test_create_and_update_rule() {
    let service = Arc::new(FakeService::new(5, 0).with_rules(&[("A", false)]));
    let session = session(service, Arc::new(MemoryStore::new())).await;
    session.start().await.unwrap();

    let created = session.create_rule().await.unwrap();
    assert_eq!(created.title, "New Rule");
    assert_eq!(created.instruction, "Enter instructions...");
    assert_eq!(session.active_rule_id(), Some(created.id));

    let patch = RulePatch {
        title: Some("Side effects".to_string()),
        is_chaining: Some(true),
        ..Default::default()
    };
    let updated = session.update_rule(created.id, &patch).await.unwrap();
    assert_eq!(updated.title, "Side effects");
    assert_eq!(updated.instruction, "Enter instructions...");
    assert!(updated.is_chaining);

    let err = session.update_rule(99, &patch).await.unwrap_err();
    assert!(matches!(err, ExplorerError::RuleNotFound { rule_id: 99 }));
}

#[tokio::test]
async fn test_keyword_catalog_keeps_previous_on_failure() {
    let service = Arc::new(FakeService::new(5, 0));
    let session = session(service.clone(), Arc::new(MemoryStore::new())).await;

    let initial = session.keywords();
    assert_eq!(initial.len(), 1);
    assert!(initial[0].is_all());

    let catalog = session.refresh_keywords().await;
    let labels: Vec<&str> = catalog.iter().map(|k| k.label.as_str()).collect();
    assert_eq!(labels, vec!["All", "Ozempic", "Wegovy"]);
    assert_eq!(catalog[0].count, 5);
    assert_eq!(catalog[1].id, "ozempic");

    service.fail_catalog.store(true, Ordering::SeqCst);
    assert_eq!(session.refresh_keywords().await, catalog);
}

#[tokio::test]
async fn test_selected_post_cleared_by_filter_change() {
    let service = Arc::new(FakeService::new(5, 5));
    let store = Arc::new(MemoryStore::new());
    let session = session(service, store.clone()).await;
    session.start().await.unwrap();

    let selected = session.select_post(3).await.unwrap();
    assert_eq!(selected.id, 3);
    assert_eq!(session.selected_post(), Some(selected));

    session.set_keywords(["Ozempic"]).await;
    assert!(session.selected_post().is_none());
    assert_eq!(store.get(keys::SELECTED_POST).await.unwrap(), Some(json!(null)));

    let err = session.select_post(999).await.unwrap_err();
    assert!(matches!(err, ExplorerError::MentionNotFound { mention_id: 999 }));
}

#[tokio::test]
async fn test_stats_follow_filter() {
    let service = Arc::new(FakeService::new(4, 6));
    let session = session(service, Arc::new(MemoryStore::new())).await;
    session.set_keywords(["Wegovy"]).await;

    let stats = session.stats().await.unwrap();
    assert_eq!(stats.counts_by_day[0].count, 6);
    assert_eq!(stats.sentiment.get("neutral"), Some(&6));
}

#[tokio::test]
async fn test_state_survives_restart_with_file_store() {
    let dir = TempDir::new().unwrap();
    let service =
        Arc::new(FakeService::new(10, 10).with_rules(&[("A", false), ("B", false)]));

    {
        let store = Arc::new(FileStore::new(dir.path()));
        let session = ExplorerSession::restore(service.clone(), store, config()).await;
        session.start().await.unwrap();
        session.set_keywords(["Wegovy"]).await;
        session.set_sources(["FDA", "reddit"]).await;
        session.set_list_tab(ListTab::Authors).await;
        session.set_active_rule(2).await.unwrap();
    }

    let store = Arc::new(FileStore::new(dir.path()));
    let session = ExplorerSession::restore(service, store, config()).await;
    let filter = session.filter();
    assert_eq!(filter.keyword_constraint(), vec!["Wegovy"]);
    assert!(filter.sources.contains("fda"));
    assert_eq!(session.list_tab(), ListTab::Authors);

    session.start().await.unwrap();
    assert_eq!(session.active_rule_id(), Some(2));
    assert_eq!(session.mentions().len(), 10);
}

#[tokio::test]
async fn test_corrupt_persisted_state_uses_defaults() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(keys::SELECTED_KEYWORDS, json!({"not": "a list"}))
        .await
        .unwrap();
    store.set(keys::ACTIVE_LIST_TAB, json!(42)).await.unwrap();

    let service = Arc::new(FakeService::new(3, 0));
    let session = session(service, store).await;
    assert!(session.filter().is_unconstrained());
    assert_eq!(session.list_tab(), ListTab::Mentions);
}
