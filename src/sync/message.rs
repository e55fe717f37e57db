use crate::state::{CustomFilter, SyncState};
use serde::{Deserialize, Serialize};

/// Requests accepted from UI collaborators, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Message {
    Refresh,
    ToggleList { key: String, enabled: bool },
    CustomFilters { filters: Vec<CustomFilter> },
    ToggleProtection { enabled: bool },
    GetState,
    /// Match notification from the request matcher.
    RuleMatched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SyncState>,
}

impl MessageResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
            state: None,
        }
    }

    pub fn with_state(state: SyncState) -> Self {
        Self {
            state: Some(state),
            ..Self::ok()
        }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
            state: None,
        }
    }
}

impl<E: std::fmt::Display> From<Result<(), E>> for MessageResponse {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::failure(e),
        }
    }
}
