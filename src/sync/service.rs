use super::message::{Message, MessageResponse};
use super::orchestrator::{SyncOrchestrator, SyncOutcome};
use crate::config::{CatalogEntry, Config};
use crate::error::SyncError;
use crate::fetch::FilterFetcher;
use crate::state::{CustomFilter, SyncState};
use crate::store::{RuleStore, StateStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Operations exposed to UI collaborators, each atomic with respect to [`SyncState`].
///
/// `pass_lock` admits one sync pass at a time; later refreshes queue behind it.
/// `state_lock` guards every load-mutate-save cycle of the persisted state.
pub struct SyncService {
    orchestrator: SyncOrchestrator,
    states: Arc<dyn StateStore>,
    catalog: Vec<CatalogEntry>,
    pass_lock: Mutex<()>,
    state_lock: Mutex<()>,
}

impl SyncService {
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn FilterFetcher>,
        rules: Arc<dyn RuleStore>,
        states: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            orchestrator: SyncOrchestrator::new(config, fetcher, rules),
            states,
            catalog: config.lists.clone(),
            pass_lock: Mutex::new(()),
            state_lock: Mutex::new(()),
        }
    }

    pub fn orchestrator(&self) -> &SyncOrchestrator {
        &self.orchestrator
    }

    /// Loads the state, writing catalog defaults on first access. Caller holds `state_lock`.
    async fn load_locked(&self) -> Result<SyncState, SyncError> {
        let loaded = self.states.load().await.map_err(SyncError::Persistence)?;
        let (mut state, mut dirty) = match loaded {
            Some(state) => (state, false),
            None => {
                info!("No persisted state found, initializing defaults");
                (SyncState::from_catalog(&self.catalog), true)
            }
        };
        if state.reconcile_catalog(&self.catalog) {
            info!("Added new catalog lists to persisted state");
            dirty = true;
        }
        if dirty {
            self.save_locked(&state).await?;
        }
        Ok(state)
    }

    async fn save_locked(&self, state: &SyncState) -> Result<(), SyncError> {
        self.states.save(state).await.map_err(SyncError::Persistence)
    }

    async fn update_state(
        &self,
        mutate: impl FnOnce(&mut SyncState),
    ) -> Result<SyncState, SyncError> {
        let _guard = self.state_lock.lock().await;
        let mut state = self.load_locked().await?;
        mutate(&mut state);
        self.save_locked(&state).await?;
        Ok(state)
    }

    /// Read-only snapshot of the persisted state.
    pub async fn get_state(&self) -> Result<SyncState, SyncError> {
        let _guard = self.state_lock.lock().await;
        self.load_locked().await
    }

    /// Runs one sync pass and persists the resulting list metadata.
    pub async fn refresh(&self) -> Result<SyncOutcome, SyncError> {
        let _pass = self.pass_lock.lock().await;

        let snapshot = self.get_state().await?;
        let outcome = self.orchestrator.run(&snapshot).await?;

        self.update_state(|state| {
            state.merge_list_metadata(&outcome.lists);
            state.last_sync = Some(outcome.synced_at);
        })
        .await?;
        Ok(outcome)
    }

    pub async fn set_list_enabled(&self, key: &str, enabled: bool) -> Result<(), SyncError> {
        self.update_state(|state| match state.list_mut(key) {
            Some(list) => list.enabled = enabled,
            None => warn!("Ignoring toggle for unknown list '{}'", key),
        })
        .await?;
        self.refresh().await.map(|_| ())
    }

    pub async fn set_custom_filters(&self, filters: Vec<CustomFilter>) -> Result<(), SyncError> {
        self.update_state(|state| state.custom_filters = filters).await?;
        self.refresh().await.map(|_| ())
    }

    pub async fn set_protection_enabled(&self, enabled: bool) -> Result<(), SyncError> {
        self.update_state(|state| state.protection_enabled = enabled).await?;
        self.refresh().await.map(|_| ())
    }

    /// Called once per match notification. Returns the new counter value.
    pub async fn increment_blocked_counter(&self) -> Result<u64, SyncError> {
        let state = self
            .update_state(|state| {
                state.blocked_requests = state.blocked_requests.saturating_add(1);
            })
            .await?;
        Ok(state.blocked_requests)
    }

    /// Dispatches one UI message.
    pub async fn handle(&self, message: Message) -> MessageResponse {
        let response: MessageResponse = match message {
            Message::Refresh => self.refresh().await.map(|_| ()).into(),
            Message::ToggleList { key, enabled } => {
                self.set_list_enabled(&key, enabled).await.into()
            }
            Message::CustomFilters { filters } => self.set_custom_filters(filters).await.into(),
            Message::ToggleProtection { enabled } => {
                self.set_protection_enabled(enabled).await.into()
            }
            Message::GetState => match self.get_state().await {
                Ok(state) => MessageResponse::with_state(state),
                Err(e) => MessageResponse::failure(e),
            },
            Message::RuleMatched => self.increment_blocked_counter().await.map(|_| ()).into(),
        };

        if let Some(e) = &response.error {
            error!("Message handling failed: {}", e);
        }
        response
    }
}
