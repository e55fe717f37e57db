use super::traits::{RuleStore, StateStore};
use crate::compiler::CompiledRule;
use crate::error::StoreError;
use crate::state::SyncState;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// In-process rule store. A replace swaps the whole map under one write lock.
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: RwLock<BTreeMap<u32, CompiledRule>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn current_rules(&self) -> Result<Vec<CompiledRule>, StoreError> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        Ok(rules.values().cloned().collect())
    }

    async fn replace_rules(
        &self,
        remove_ids: &[u32],
        add_rules: &[CompiledRule],
    ) -> Result<(), StoreError> {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);

        let mut next = rules.clone();
        for id in remove_ids {
            next.remove(id);
        }
        for rule in add_rules {
            if next.insert(rule.id, rule.clone()).is_some() {
                return Err(StoreError::DuplicateRuleId(rule.id));
            }
        }

        *rules = next;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: RwLock<Option<SyncState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SyncState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<SyncState>, StoreError> {
        Ok(self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn save(&self, state: &SyncState) -> Result<(), StoreError> {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        Ok(())
    }
}
