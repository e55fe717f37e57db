use crate::compiler::CompiledRule;
use crate::error::StoreError;
use crate::state::SyncState;

/// The live rule set consumed by the request matcher.
#[async_trait::async_trait]
pub trait RuleStore: Send + Sync {
    async fn current_rules(&self) -> Result<Vec<CompiledRule>, StoreError>;

    async fn current_rule_ids(&self) -> Result<Vec<u32>, StoreError> {
        Ok(self
            .current_rules()
            .await?
            .into_iter()
            .map(|rule| rule.id)
            .collect())
    }

    /// Removes `remove_ids` and adds `add_rules` as one atomic step. On error the
    /// previous rule set stays live.
    async fn replace_rules(
        &self,
        remove_ids: &[u32],
        add_rules: &[CompiledRule],
    ) -> Result<(), StoreError>;
}

/// Single-document persistence for [`SyncState`].
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<Option<SyncState>, StoreError>;
    async fn save(&self, state: &SyncState) -> Result<(), StoreError>;
}
