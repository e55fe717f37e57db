//! Initialization helpers for the application startup.

use crate::config::{Config, StorageBackend};
use crate::error::StoreError;
use crate::store::{
    MemoryRuleStore, MemoryStateStore, RuleStore, SqliteRuleStore, SqliteStateStore, StateStore,
};
use std::sync::Arc;
use tracing::info;

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = config.logging.level.clone();

        // Suppress HTTP client internals unless explicitly enabled/overridden
        for noisy in ["hyper", "hyper_util", "reqwest"] {
            if !filter.contains(noisy) {
                filter.push_str(&format!(",{noisy}=warn"));
            }
        }

        tracing_subscriber::EnvFilter::new(filter)
    });

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Builds the rule store and state store for the configured backend.
pub fn init_stores(
    config: &Config,
) -> Result<(Arc<dyn RuleStore>, Arc<dyn StateStore>), StoreError> {
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let path = &config.storage.sqlite_path;
            info!("Using SQLite stores at {}", path);
            let rules: Arc<dyn RuleStore> = Arc::new(SqliteRuleStore::open(path)?);
            let states: Arc<dyn StateStore> = Arc::new(SqliteStateStore::open(path)?);
            Ok((rules, states))
        }
        StorageBackend::Memory => {
            info!("Using in-memory stores; state is lost on exit.");
            let rules: Arc<dyn RuleStore> = Arc::new(MemoryRuleStore::new());
            let states: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
            Ok((rules, states))
        }
    }
}
