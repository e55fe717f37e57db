use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Request categories a rule can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Image,
    Script,
    Stylesheet,
    Font,
    Media,
    Xmlhttprequest,
    SubFrame,
    MainFrame,
}

impl ResourceType {
    /// Maps one filter option token. Unknown tokens yield `None`.
    pub fn from_option(token: &str) -> Option<Self> {
        let mapped = match token {
            "image" => Self::Image,
            "script" => Self::Script,
            "stylesheet" => Self::Stylesheet,
            "font" => Self::Font,
            "media" => Self::Media,
            "xmlhttprequest" | "xhr" => Self::Xmlhttprequest,
            "subdocument" => Self::SubFrame,
            "popup" | "document" => Self::MainFrame,
            _ => return None,
        };
        Some(mapped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
            Self::Font => "font",
            Self::Media => "media",
            Self::Xmlhttprequest => "xmlhttprequest",
            Self::SubFrame => "sub_frame",
            Self::MainFrame => "main_frame",
        }
    }
}

/// Reduces an option suffix (the text after `$`) to the set of resource types it names.
///
/// `domain=` scoping is dropped rather than rejecting the rule.
pub fn map_resource_types(options: Option<&str>) -> BTreeSet<ResourceType> {
    let Some(options) = options else {
        return BTreeSet::new();
    };

    options
        .split(',')
        .map(str::trim)
        .filter(|token| !token.starts_with("domain="))
        .filter_map(ResourceType::from_option)
        .collect()
}
