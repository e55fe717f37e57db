use super::normalizer::{normalize_pattern, split_options};
use super::resource_types::{map_resource_types, ResourceType};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Block,
}

impl RuleAction {
    pub fn from_allow(is_allow: bool) -> Self {
        if is_allow {
            Self::Allow
        } else {
            Self::Block
        }
    }

    /// Allow must outrank block so an allow-listed request is never shadowed.
    pub fn priority(&self) -> u32 {
        match self {
            Self::Allow => 2,
            Self::Block => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Block => "block",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRule {
    pub id: u32,
    pub priority: u32,
    pub action_type: RuleAction,
    pub url_filter: String,
    /// `None` means the rule applies to every resource type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_types: Option<BTreeSet<ResourceType>>,
}

impl CompiledRule {
    pub fn is_allow(&self) -> bool {
        self.action_type == RuleAction::Allow
    }

    /// Renders the `{id, priority, action, condition}` shape consumed by declarative matchers.
    pub fn to_declarative(&self) -> Value {
        let mut condition = json!({ "urlFilter": self.url_filter });
        if let Some(types) = &self.resource_types {
            let types: Vec<&str> = types.iter().map(ResourceType::as_str).collect();
            condition["resourceTypes"] = json!(types);
        }
        json!({
            "id": self.id,
            "priority": self.priority,
            "action": { "type": self.action_type.as_str() },
            "condition": condition,
        })
    }
}

/// Compiles one filter body into a rule carrying `id`.
///
/// Returns `None` for unsupported filters; callers must not consume `id` in that case.
pub fn compile(body: &str, id: u32, is_allow: bool) -> Option<CompiledRule> {
    let url_filter = normalize_pattern(body)?;
    let (_, options) = split_options(body);
    let types = map_resource_types(options);
    let action_type = RuleAction::from_allow(is_allow);

    Some(CompiledRule {
        id,
        priority: action_type.priority(),
        action_type,
        url_filter,
        resource_types: (!types.is_empty()).then_some(types),
    })
}
