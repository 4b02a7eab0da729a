//! Page domain result types.

use serde::Deserialize;

use super::types::{FrameTree, LayoutViewport, NavigationEntry};

/// Result of Page.navigate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResult {
    /// Frame id that was navigated.
    pub frame_id: String,
    /// Loader identifier (absent for same-document navigations).
    pub loader_id: Option<String>,
    /// Error text if the navigation was blocked.
    pub error_text: Option<String>,
}

/// Result of Page.captureScreenshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureScreenshotResult {
    /// Base64-encoded image data.
    pub data: String,
}

/// Result of Page.getFrameTree.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFrameTreeResult {
    /// Frame tree for the page.
    pub frame_tree: FrameTree,
}

/// Result of Page.getNavigationHistory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNavigationHistoryResult {
    /// Index of the current entry.
    pub current_index: i32,
    /// All history entries for the tab.
    pub entries: Vec<NavigationEntry>,
}

impl GetNavigationHistoryResult {
    /// The currently displayed entry, if the index is valid.
    pub fn current(&self) -> Option<&NavigationEntry> {
        usize::try_from(self.current_index)
            .ok()
            .and_then(|idx| self.entries.get(idx))
    }
}

/// Result of Page.getLayoutMetrics.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLayoutMetricsResult {
    /// Metrics relating to the layout viewport in CSS pixels.
    pub css_layout_viewport: LayoutViewport,
}
