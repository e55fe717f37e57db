use anyhow::{bail, Context, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use url::Url;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_lists")]
    pub lists: Vec<CatalogEntry>,

    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub updates: UpdateConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

/// One entry of the static filter-list catalog.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub key: String,
    pub name: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub default_enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RulesConfig {
    #[serde(default = "default_max_rules")]
    pub max_rules: usize,
    #[serde(default = "default_first_rule_id")]
    pub first_rule_id: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UpdateConfig {
    #[serde(default = "default_update_interval")]
    pub interval_hours: u64,
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

// Defaults
fn default_true() -> bool {
    true
}
fn default_max_rules() -> usize {
    30_000
}
fn default_first_rule_id() -> u32 {
    1000
}
fn default_update_interval() -> u64 {
    6
}

/// Upper bound for `updates.interval_hours`: one year.
pub const MAX_UPDATE_INTERVAL_HOURS: u64 = 24 * 365;

fn default_concurrent_downloads() -> usize {
    4
}
fn default_fetch_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    "uOrigin/1.0".to_string()
}
fn default_backend() -> StorageBackend {
    StorageBackend::Sqlite
}
fn default_sqlite_path() -> String {
    "uorigin.db".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_api_host() -> String {
    "127.0.0.1".to_string()
}
fn default_api_port() -> u16 {
    8080
}

fn catalog_entry(key: &str, name: &str, url: &str, default_enabled: bool) -> CatalogEntry {
    CatalogEntry {
        key: key.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        default_enabled,
    }
}

fn default_lists() -> Vec<CatalogEntry> {
    vec![
        catalog_entry(
            "easylist",
            "EasyList",
            "https://easylist.to/easylist/easylist.txt",
            true,
        ),
        catalog_entry(
            "easyprivacy",
            "EasyPrivacy",
            "https://easylist.to/easylist/easyprivacy.txt",
            true,
        ),
        catalog_entry(
            "ublock-filters",
            "uBlock Filters",
            "https://raw.githubusercontent.com/uBlockOrigin/uAssets/master/filters/filters.txt",
            true,
        ),
        catalog_entry(
            "ublock-badware",
            "uBlock Badware Risks",
            "https://raw.githubusercontent.com/uBlockOrigin/uAssets/master/filters/badware.txt",
            true,
        ),
        catalog_entry(
            "ublock-privacy",
            "uBlock Privacy",
            "https://raw.githubusercontent.com/uBlockOrigin/uAssets/master/filters/privacy.txt",
            false,
        ),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lists: default_lists(),
            rules: RulesConfig::default(),
            updates: UpdateConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_rules: default_max_rules(),
            first_rule_id: default_first_rule_id(),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_update_interval(),
            concurrent_downloads: default_concurrent_downloads(),
            fetch_timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        let config = Self::from_toml(&contents)?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for entry in &self.lists {
            if !seen.insert(entry.key.as_str()) {
                bail!("Duplicate list key '{}' in catalog", entry.key);
            }
            Url::parse(&entry.url)
                .with_context(|| format!("Invalid URL for list '{}'", entry.key))?;
        }
        if self.rules.max_rules == 0 {
            bail!("rules.max_rules must be greater than zero");
        }
        if self.updates.interval_hours == 0 {
            bail!("updates.interval_hours must be greater than zero");
        }
        if self.updates.interval_hours > MAX_UPDATE_INTERVAL_HOURS {
            bail!(
                "updates.interval_hours must be at most {}",
                MAX_UPDATE_INTERVAL_HOURS
            );
        }
        if self.updates.concurrent_downloads == 0 {
            bail!("updates.concurrent_downloads must be greater than zero");
        }
        Ok(())
    }
}
