//! Persisted synchronization state.

use crate::config::CatalogEntry;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

pub fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSource {
    pub key: String,
    pub name: String,
    pub url: String,
    pub enabled: bool,
    #[serde(default)]
    pub rule_count: usize,
    #[serde(default)]
    pub last_updated: Option<Timestamp>,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl ListSource {
    pub fn from_catalog(entry: &CatalogEntry) -> Self {
        Self {
            key: entry.key.clone(),
            name: entry.name.clone(),
            url: entry.url.clone(),
            enabled: entry.default_enabled,
            rule_count: 0,
            last_updated: None,
            last_error: None,
        }
    }

    pub(crate) fn record_success(&mut self, rule_count: usize, now: Timestamp) {
        self.rule_count = rule_count;
        self.last_updated = Some(now);
        self.last_error = None;
    }

    pub(crate) fn record_failure(&mut self, error: String) {
        self.rule_count = 0;
        self.last_error = Some(error);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Block,
    Allow,
}

/// A user-authored filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFilter {
    pub id: String,
    pub expression: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl CustomFilter {
    pub fn is_allow(&self) -> bool {
        self.filter_type == FilterType::Allow
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub lists: Vec<ListSource>,
    #[serde(default)]
    pub custom_filters: Vec<CustomFilter>,
    #[serde(default)]
    pub last_sync: Option<Timestamp>,
    #[serde(default)]
    pub blocked_requests: u64,
    #[serde(default = "enabled_by_default")]
    pub protection_enabled: bool,
}

impl SyncState {
    /// First-run state built from the static catalog.
    pub fn from_catalog(catalog: &[CatalogEntry]) -> Self {
        Self {
            lists: catalog.iter().map(ListSource::from_catalog).collect(),
            custom_filters: Vec::new(),
            last_sync: None,
            blocked_requests: 0,
            protection_enabled: true,
        }
    }

    /// Appends catalog entries missing from a persisted state. Returns true if anything changed.
    pub fn reconcile_catalog(&mut self, catalog: &[CatalogEntry]) -> bool {
        let mut changed = false;
        for entry in catalog {
            if !self.lists.iter().any(|list| list.key == entry.key) {
                self.lists.push(ListSource::from_catalog(entry));
                changed = true;
            }
        }
        changed
    }

    pub fn list_mut(&mut self, key: &str) -> Option<&mut ListSource> {
        self.lists.iter_mut().find(|list| list.key == key)
    }

    /// Replaces list metadata by key; lists absent from `updated` keep their prior values.
    pub(crate) fn merge_list_metadata(&mut self, updated: &[ListSource]) {
        for source in updated {
            if let Some(list) = self.list_mut(&source.key) {
                list.rule_count = source.rule_count;
                list.last_updated = source.last_updated;
                list.last_error = source.last_error.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_initial_state_from_catalog() {
        let config = Config::default();
        let state = SyncState::from_catalog(&config.lists);
        assert_eq!(state.lists.len(), 5);
        assert!(state.protection_enabled);
        assert_eq!(state.blocked_requests, 0);
        assert!(state.lists.iter().all(|l| l.rule_count == 0 && l.last_updated.is_none()));
        assert!(!state.lists[4].enabled);
    }

    #[test]
    fn test_reconcile_appends_new_sources_only() {
        let config = Config::default();
        let mut state = SyncState::from_catalog(&config.lists[..2]);
        state.lists[0].enabled = false;

        assert!(state.reconcile_catalog(&config.lists));
        assert_eq!(state.lists.len(), 5);
        assert!(!state.lists[0].enabled);
        assert!(!state.reconcile_catalog(&config.lists));
    }

    #[test]
    fn test_merge_keeps_untouched_metadata() {
        let config = Config::default();
        let mut state = SyncState::from_catalog(&config.lists);
        state.lists[1].rule_count = 42;

        let mut updated = state.lists[0].clone();
        updated.record_failure("timeout".to_string());
        state.merge_list_metadata(&[updated]);

        assert_eq!(state.lists[0].last_error.as_deref(), Some("timeout"));
        assert_eq!(state.lists[1].rule_count, 42);
    }

    #[test]
    fn test_json_field_names() {
        let filter: CustomFilter = serde_json::from_str(
            r#"{"id":"f1","expression":"||ads.com^","type":"allow","enabled":true}"#,
        )
        .unwrap();
        assert!(filter.is_allow());

        let state = SyncState::from_catalog(&Config::default().lists);
        let value = serde_json::to_value(&state).unwrap();
        assert!(value.get("protectionEnabled").is_some());
        assert!(value["lists"][0].get("ruleCount").is_some());
    }
}
