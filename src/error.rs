use thiserror::Error;

/// Failures of the rule store or the state persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("duplicate rule id {0}")]
    DuplicateRuleId(u32),
}

/// Per-source transport failure. Recorded on the source, never fatal to a pass.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to fetch {url}: HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Pass-level failures surfaced to the operation that triggered the sync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to commit rules: {0}")]
    StoreCommit(#[source] StoreError),
    #[error("failed to persist state: {0}")]
    Persistence(#[source] StoreError),
}
