#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uorigin::compiler::CompiledRule;
use uorigin::config::{CatalogEntry, Config};
use uorigin::error::{FetchError, StoreError};
use uorigin::fetch::FilterFetcher;
use uorigin::store::{MemoryRuleStore, MemoryStateStore, RuleStore};
use uorigin::sync::SyncService;

/// Serves canned list bodies by URL; unknown URLs fail like a 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    bodies: Mutex<HashMap<String, Result<String, String>>>,
    pub calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn set(&self, url: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(body.to_string()));
    }

    pub fn fail(&self, url: &str, message: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(message.to_string()));
    }
}

#[async_trait::async_trait]
impl FilterFetcher for ScriptedFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        match self.bodies.lock().unwrap().get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(message)) => Err(FetchError::Body {
                url: url.to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionReset, message.clone()),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Rule store that can be told to reject the next commits.
#[derive(Default)]
pub struct FlakyRuleStore {
    pub inner: MemoryRuleStore,
    pub fail: AtomicBool,
}

#[async_trait::async_trait]
impl RuleStore for FlakyRuleStore {
    async fn current_rules(&self) -> Result<Vec<CompiledRule>, StoreError> {
        self.inner.current_rules().await
    }

    async fn replace_rules(
        &self,
        remove_ids: &[u32],
        add_rules: &[CompiledRule],
    ) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            let busy = rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY);
            return Err(StoreError::Sqlite(rusqlite::Error::SqliteFailure(
                busy,
                Some("maintenance".to_string()),
            )));
        }
        self.inner.replace_rules(remove_ids, add_rules).await
    }
}

pub fn url(key: &str) -> String {
    format!("https://lists.test/{key}.txt")
}

pub fn test_config(keys: &[&str]) -> Config {
    let mut config = Config::default();
    config.lists = keys
        .iter()
        .map(|key| CatalogEntry {
            key: key.to_string(),
            name: key.to_uppercase(),
            url: url(key),
            default_enabled: true,
        })
        .collect();
    config
}

pub struct Harness {
    pub service: Arc<SyncService>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub rules: Arc<FlakyRuleStore>,
    pub states: Arc<MemoryStateStore>,
}

pub fn harness(config: &Config) -> Harness {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let rules = Arc::new(FlakyRuleStore::default());
    let states = Arc::new(MemoryStateStore::new());
    let service = Arc::new(SyncService::new(
        config,
        fetcher.clone(),
        rules.clone(),
        states.clone(),
    ));
    Harness {
        service,
        fetcher,
        rules,
        states,
    }
}

pub fn assert_unique_ids(rules: &[CompiledRule]) {
    let mut ids: Vec<u32> = rules.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    let before = ids.len();
    ids.dedup();
    assert_eq!(before, ids.len(), "duplicate rule ids committed");
}
