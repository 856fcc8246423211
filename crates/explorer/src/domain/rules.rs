//! Rule registry domain facade.
//!
//! List order is authoritative: it decides each rule's chaining
//! predecessor. Local state only changes after the service confirms.

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::api::RulesApi;
use crate::entities::{Rule, RuleDraft, RuleId, RulePatch};
use crate::errors::{ExplorerError, ExplorerResult};
use crate::sync::lock;

/// Rules in list order plus the active selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryState {
    pub rules: Vec<Rule>,
    pub active: Option<RuleId>,
}

impl RegistryState {
    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    fn require(&self, id: RuleId) -> ExplorerResult<&Rule> {
        self.get(id).ok_or(ExplorerError::RuleNotFound { rule_id: id })
    }

    /// Replace the list, keeping the active rule if it survived
    fn replace_all(&mut self, rules: Vec<Rule>) {
        self.rules = rules;
        let keep = self.active.filter(|id| self.get(*id).is_some());
        self.active = keep.or_else(|| self.rules.first().map(|r| r.id));
    }

    fn append(&mut self, rule: Rule) {
        self.active = Some(rule.id);
        self.rules.push(rule);
    }

    fn replace(&mut self, rule: Rule) {
        if let Some(slot) = self.rules.iter_mut().find(|r| r.id == rule.id) {
            *slot = rule;
        }
    }

    /// Remove a rule; a removed active rule hands over to the first
    /// remaining one
    fn remove(&mut self, id: RuleId) {
        self.rules.retain(|r| r.id != id);
        if self.active == Some(id) {
            self.active = self.rules.first().map(|r| r.id);
        }
    }
}

/// Rules domain facade providing rule CRUD over the service
pub struct RulesDomain {
    api: Arc<dyn RulesApi>,
    state: Mutex<RegistryState>,
}

impl RulesDomain {
    /// Create an empty registry; `active` is kept on load if it still exists
    pub fn new(api: Arc<dyn RulesApi>, active: Option<RuleId>) -> Self {
        Self {
            api,
            state: Mutex::new(RegistryState {
                rules: Vec::new(),
                active,
            }),
        }
    }

    /// Fetch the rule list from the service
    pub async fn load(&self) -> ExplorerResult<Vec<Rule>> {
        let rules = self.api.list_rules().await?;
        let mut state = lock(&self.state);
        state.replace_all(rules);
        debug!(count = state.rules.len(), active = ?state.active, "Rules loaded");
        Ok(state.rules.clone())
    }

    /// Rules in list order
    pub fn list(&self) -> Vec<Rule> {
        lock(&self.state).rules.clone()
    }

    pub fn snapshot(&self) -> RegistryState {
        lock(&self.state).clone()
    }

    pub fn get(&self, id: RuleId) -> Option<Rule> {
        lock(&self.state).get(id).cloned()
    }

    pub fn active_id(&self) -> Option<RuleId> {
        lock(&self.state).active
    }

    pub fn active(&self) -> Option<Rule> {
        let state = lock(&self.state);
        state.active.and_then(|id| state.get(id)).cloned()
    }

    /// Make a loaded rule active
    pub fn set_active(&self, id: RuleId) -> ExplorerResult<()> {
        let mut state = lock(&self.state);
        state.require(id)?;
        state.active = Some(id);
        Ok(())
    }

    /// Create a rule with the given defaults; it becomes active
    pub async fn create(&self, title: &str, instruction: &str) -> ExplorerResult<Rule> {
        let draft = RuleDraft::new(title, instruction);
        let rule = self.api.create_or_update_rule(&draft, None).await?;
        info!(rule_id = rule.id, "Rule created");
        lock(&self.state).append(rule.clone());
        Ok(rule)
    }

    /// Merge `patch` into a rule and save it
    pub async fn update(&self, id: RuleId, patch: &RulePatch) -> ExplorerResult<Rule> {
        let draft = {
            let state = lock(&self.state);
            patch.apply(state.require(id)?)
        };
        let mut rule = self.api.create_or_update_rule(&draft, Some(id)).await?;
        // the service does not echo the chaining flag
        rule.id = id;
        rule.is_chaining = draft.is_chaining;
        info!(rule_id = id, "Rule updated");
        lock(&self.state).replace(rule.clone());
        Ok(rule)
    }

    /// Delete a rule, returning the new active rule id
    pub async fn delete(&self, id: RuleId) -> ExplorerResult<Option<RuleId>> {
        lock(&self.state).require(id)?;
        self.api.delete_rule(id).await?;

        let mut state = lock(&self.state);
        state.remove(id);
        info!(rule_id = id, active = ?state.active, "Rule deleted");
        Ok(state.active)
    }
}
