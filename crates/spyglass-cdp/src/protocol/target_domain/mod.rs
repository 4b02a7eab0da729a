//! Target domain: tab enumeration and lifecycle.

use serde::{Deserialize, Serialize};

/// Information about a CDP target.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Stable target identifier.
    pub target_id: String,
    /// Target kind: "page", "iframe", "background_page", ...
    #[serde(rename = "type")]
    pub target_type: String,
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Current document URL.
    #[serde(default)]
    pub url: String,
    /// Whether the target is attached to.
    #[serde(default)]
    pub attached: bool,
}

/// Parameters for Target.getTargets.
#[derive(Debug, Clone, Serialize, Default)]
pub struct GetTargetsParams {}

/// Result of Target.getTargets.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTargetsResult {
    /// All known targets.
    pub target_infos: Vec<TargetInfo>,
}

/// Parameters for Target.createTarget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetParams {
    /// Initial URL the page will navigate to.
    pub url: String,
    /// Whether to create the target in background.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
}

/// Result of Target.createTarget.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetResult {
    /// Identifier of the created target.
    pub target_id: String,
}

/// Parameters for Target.activateTarget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateTargetParams {
    /// Target to bring to front.
    pub target_id: String,
}

/// Parameters for Target.closeTarget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTargetParams {
    /// Target to close.
    pub target_id: String,
}

/// Result of Target.closeTarget.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTargetResult {
    /// Whether the target was closed.
    pub success: bool,
}

#[cfg(test)]
mod tests;
