//! Rule execution engine.
//!
//! One execution at a time across all rules. Results are cached per rule
//! for the session; a chaining rule receives its list predecessor's cached
//! result as context.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::api::RuleExecutor;
use crate::entities::{FilterSelection, Rule, RuleId, RuleResult};
use crate::errors::{ExplorerError, ExplorerResult};
use crate::sync::lock;

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Executing(RuleId),
}

/// The rule immediately before `rule_id` in list order
pub fn predecessor(rules: &[Rule], rule_id: RuleId) -> Option<&Rule> {
    let index = rules.iter().position(|r| r.id == rule_id)?;
    index.checked_sub(1).map(|i| &rules[i])
}

/// Context passed to `rule_id`'s execution.
///
/// `None` unless the rule chains and its predecessor has a cached result.
/// A cached error is forwarded as-is.
pub fn resolve_context(
    rules: &[Rule],
    rule_id: RuleId,
    cache: &HashMap<RuleId, RuleResult>,
) -> Option<RuleResult> {
    let rule = rules.iter().find(|r| r.id == rule_id)?;
    if !rule.is_chaining {
        return None;
    }
    predecessor(rules, rule_id).and_then(|prev| cache.get(&prev.id).cloned())
}

/// Returns the engine to `Idle` when dropped, including on cancellation
struct ExecutionGuard<'a> {
    state: &'a Mutex<EngineState>,
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = EngineState::Idle;
    }
}

/// Single-flight rule executor with a per-rule result cache
pub struct ExecutionEngine {
    executor: Arc<dyn RuleExecutor>,
    state: Mutex<EngineState>,
    results: Mutex<HashMap<RuleId, RuleResult>>,
}

impl ExecutionEngine {
    pub fn new(executor: Arc<dyn RuleExecutor>) -> Self {
        Self {
            executor,
            state: Mutex::new(EngineState::Idle),
            results: Mutex::new(HashMap::new()),
        }
    }

    pub fn state(&self) -> EngineState {
        *lock(&self.state)
    }

    pub fn is_executing(&self) -> bool {
        self.state() != EngineState::Idle
    }

    /// Most recent result for a rule
    pub fn result(&self, rule_id: RuleId) -> Option<RuleResult> {
        lock(&self.results).get(&rule_id).cloned()
    }

    /// Copy of the whole cache
    pub fn results(&self) -> HashMap<RuleId, RuleResult> {
        lock(&self.results).clone()
    }

    /// Drop a rule's cached result
    pub fn forget(&self, rule_id: RuleId) {
        lock(&self.results).remove(&rule_id);
    }

    fn begin(&self, rule_id: RuleId) -> ExplorerResult<ExecutionGuard<'_>> {
        let mut state = lock(&self.state);
        if let EngineState::Executing(running) = *state {
            return Err(ExplorerError::ExecutionInProgress { rule_id: running });
        }
        *state = EngineState::Executing(rule_id);
        Ok(ExecutionGuard { state: &self.state })
    }

    /// Execute `rule_id` against `filter`.
    ///
    /// `rules` is the registry list at call time and decides chaining. A
    /// failed call is cached and returned as [`RuleResult::Error`]; only a
    /// busy engine or an unknown rule yields `Err`.
    pub async fn execute(
        &self,
        rules: &[Rule],
        rule_id: RuleId,
        filter: &FilterSelection,
    ) -> ExplorerResult<RuleResult> {
        if !rules.iter().any(|r| r.id == rule_id) {
            return Err(ExplorerError::RuleNotFound { rule_id });
        }
        let _guard = self.begin(rule_id)?;

        let context = resolve_context(rules, rule_id, &lock(&self.results));
        info!(rule_id, chained = context.is_some(), "Executing rule");

        let result = match self
            .executor
            .execute_rule(rule_id, filter, context.as_ref())
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(rule_id, error = %e, "Rule execution failed");
                RuleResult::error(e.to_string())
            }
        };

        lock(&self.results).insert(rule_id, result.clone());
        Ok(result)
    }
}
