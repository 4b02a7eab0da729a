//! DOM domain: document access, node queries, focus, file inputs.

use serde::{Deserialize, Serialize};

/// Parameters for DOM.getDocument.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetDocumentParams {
    /// The maximum depth at which children should be retrieved; -1 for the
    /// entire subtree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<i32>,
    /// Whether iframes and shadow roots should be traversed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pierce: Option<bool>,
}

/// Result of DOM.getDocument.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDocumentResult {
    /// The root node.
    pub root: Node,
}

/// A DOM node.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node identifier.
    pub node_id: i64,
    /// Backend node identifier, stable across document mutations.
    pub backend_node_id: i64,
    /// Node type (1 = element, 3 = text, 9 = document, ...).
    pub node_type: i64,
    /// Node name, e.g. "DIV".
    pub node_name: String,
    /// Node value for text nodes.
    #[serde(default)]
    pub node_value: String,
    /// Attributes as a flat [name, value, ...] list.
    pub attributes: Option<Vec<String>>,
    /// Child nodes, when requested depth covers them.
    pub children: Option<Vec<Node>>,
    /// Document URL for document nodes.
    pub document_url: Option<String>,
}

/// Parameters for DOM.querySelector.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorParams {
    /// Node to query upon.
    pub node_id: i64,
    /// Selector string.
    pub selector: String,
}

/// Result of DOM.querySelector.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorResult {
    /// Matching node id, 0 when nothing matched.
    pub node_id: i64,
}

/// Parameters for DOM.requestNode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestNodeParams {
    /// JavaScript object id of the node to resolve.
    pub object_id: String,
}

/// Result of DOM.requestNode.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestNodeResult {
    /// Node id for the given object.
    pub node_id: i64,
}

/// Parameters for DOM.setFileInputFiles.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFileInputFilesParams {
    /// Absolute file paths to set.
    pub files: Vec<String>,
    /// Node id of the file input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i64>,
    /// Backend node id of the file input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<i64>,
}

/// Parameters for DOM.getBoxModel.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetBoxModelParams {
    /// Node id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i64>,
    /// Backend node id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<i64>,
}

/// Result of DOM.getBoxModel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBoxModelResult {
    /// Box model for the node.
    pub model: BoxModel,
}

/// Box model of an element.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxModel {
    /// Content box quad (8 coordinates).
    pub content: Vec<f64>,
    /// Border box quad.
    pub border: Vec<f64>,
    /// Node width.
    pub width: f64,
    /// Node height.
    pub height: f64,
}

impl BoxModel {
    /// Center point of the content quad, for input dispatch.
    pub fn content_center(&self) -> Option<(f64, f64)> {
        if self.content.len() < 8 {
            return None;
        }
        let xs = [self.content[0], self.content[2], self.content[4], self.content[6]];
        let ys = [self.content[1], self.content[3], self.content[5], self.content[7]];
        let cx = xs.iter().sum::<f64>() / 4.0;
        let cy = ys.iter().sum::<f64>() / 4.0;
        Some((cx, cy))
    }
}

/// Parameters for DOM.scrollIntoViewIfNeeded.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScrollIntoViewIfNeededParams {
    /// Node id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i64>,
    /// Backend node id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<i64>,
}

/// Parameters for DOM.focus.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FocusParams {
    /// Node id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i64>,
    /// Backend node id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<i64>,
}

/// Parameters for DOM.getFrameOwner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFrameOwnerParams {
    /// Frame id to find the owner element for.
    pub frame_id: String,
}

/// Result of DOM.getFrameOwner.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFrameOwnerResult {
    /// Backend node id of the owning iframe element.
    pub backend_node_id: i64,
    /// Node id when the DOM agent has seen the node.
    pub node_id: Option<i64>,
}

#[cfg(test)]
mod tests;
