//! Accessibility domain: AX tree queries used for Tier-0 locators.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An accessibility value wrapper.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxValue {
    /// Value type, e.g. "string", "boolean", "role".
    #[serde(rename = "type")]
    pub value_type: String,
    /// The concrete value.
    pub value: Option<Value>,
}

/// One named property of an AX node.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxProperty {
    /// Property name, e.g. "disabled", "focusable".
    pub name: String,
    /// Property value.
    pub value: AxValue,
}

/// A node in the accessibility tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxNode {
    /// Unique node identifier within the tree.
    pub node_id: String,
    /// Whether the node is ignored for accessibility.
    #[serde(default)]
    pub ignored: bool,
    /// Node role.
    pub role: Option<AxValue>,
    /// Accessible name.
    pub name: Option<AxValue>,
    /// Accessible description.
    pub description: Option<AxValue>,
    /// Current value.
    pub value: Option<AxValue>,
    /// Additional properties.
    pub properties: Option<Vec<AxProperty>>,
    /// Backing DOM backend node id.
    pub backend_dom_node_id: Option<i64>,
    /// Child node ids.
    pub child_ids: Option<Vec<String>>,
}

impl AxNode {
    /// The role string, when present and stringly typed.
    pub fn role_str(&self) -> Option<&str> {
        self.role.as_ref()?.value.as_ref()?.as_str()
    }

    /// The accessible name string, when present.
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_ref()?.value.as_ref()?.as_str()
    }

    /// Look up a boolean property by name.
    pub fn bool_property(&self, name: &str) -> Option<bool> {
        let props = self.properties.as_ref()?;
        let prop = props.iter().find(|p| p.name == name)?;
        match prop.value.value.as_ref()? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Parameters for Accessibility.getFullAXTree.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetFullAxTreeParams {
    /// Max depth of the fetched tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<i32>,
}

/// Result of Accessibility.getFullAXTree.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFullAxTreeResult {
    /// All nodes of the tree, flattened.
    pub nodes: Vec<AxNode>,
}

/// Parameters for Accessibility.queryAXTree.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueryAxTreeParams {
    /// Root node id to query from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i64>,
    /// Accessible name to match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessible_name: Option<String>,
    /// Role to match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Result of Accessibility.queryAXTree.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAxTreeResult {
    /// Matching nodes.
    pub nodes: Vec<AxNode>,
}

#[cfg(test)]
mod tests;
