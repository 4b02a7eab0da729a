//! Short-lived CAPTCHA workbench state.
//!
//! A screenshot-derived grid map is cached per tab so a screenshot → click
//! sequence does not drift between calls when re-analysis heuristics would
//! disagree with the image the agent is looking at. State expires on a TTL
//! and is invalidated by scrolling or viewport resizes.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default workbench TTL.
pub const DEFAULT_TTL_MS: u64 = 120_000;

/// Scroll drift beyond which cached click coordinates are stale.
const SCROLL_TOLERANCE_PX: f64 = 8.0;

/// A rectangle in viewport CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// One grid cell: its click center and bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridCell {
    /// Click target X.
    pub x: i64,
    /// Click target Y.
    pub y: i64,
    /// Cell rectangle.
    pub bounds: Bounds,
}

/// Scroll position recorded with the state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    /// window.scrollX.
    pub x: f64,
    /// window.scrollY.
    pub y: f64,
}

/// The cached CAPTCHA analysis shared across consecutive tool calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaState {
    /// Challenge type, e.g. "recaptcha_v2_image", "hcaptcha".
    #[serde(rename = "type")]
    pub captcha_type: Option<String>,
    /// Widget bounds.
    pub bounds: Option<Bounds>,
    /// Image-grid bounds (more precise than the widget for clicks).
    pub grid_bounds: Option<Bounds>,
    /// Grid rows.
    pub rows: u32,
    /// Grid columns.
    pub cols: u32,
    /// Block number (1-based, row-major) to click cell.
    pub grid_map: BTreeMap<u32, GridCell>,
    /// Screenshot clip used for the capture.
    pub clip: Option<Value>,
    /// Scroll position at capture time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll: Option<ScrollPosition>,
}

/// Build the block → cell mapping for a grid, 1-indexed and row-major.
#[must_use]
pub fn build_grid_map(grid_bounds: Bounds, rows: u32, cols: u32) -> BTreeMap<u32, GridCell> {
    let mut map = BTreeMap::new();
    if rows == 0 || cols == 0 {
        return map;
    }
    let cell_width = grid_bounds.width / f64::from(cols);
    let cell_height = grid_bounds.height / f64::from(rows);
    for row in 0..rows {
        for col in 0..cols {
            let number = row * cols + col + 1;
            let center_x = grid_bounds.x + (f64::from(col) + 0.5) * cell_width;
            let center_y = grid_bounds.y + (f64::from(row) + 0.5) * cell_height;
            map.insert(
                number,
                GridCell {
                    x: center_x as i64,
                    y: center_y as i64,
                    bounds: Bounds {
                        x: (grid_bounds.x + f64::from(col) * cell_width).floor(),
                        y: (grid_bounds.y + f64::from(row) * cell_height).floor(),
                        width: cell_width.floor(),
                        height: cell_height.floor(),
                    },
                },
            );
        }
    }
    map
}

/// Per-tab holder with TTL and drift invalidation.
#[derive(Debug)]
pub struct CaptchaWorkbench {
    state: CaptchaState,
    stored_at: Instant,
}

impl CaptchaWorkbench {
    /// Cache a fresh analysis.
    #[must_use]
    pub fn new(state: CaptchaState) -> Self {
        Self {
            state,
            stored_at: Instant::now(),
        }
    }

    /// The cached state, when younger than `max_age_ms`.
    pub fn get(&self, max_age_ms: u64) -> Option<&CaptchaState> {
        (self.stored_at.elapsed() <= Duration::from_millis(max_age_ms)).then_some(&self.state)
    }

    /// Whether a scroll to `(x, y)` drifts past the capture position.
    pub fn invalidated_by_scroll(&self, x: f64, y: f64) -> bool {
        match self.state.scroll {
            Some(at_capture) => {
                (x - at_capture.x).abs() > SCROLL_TOLERANCE_PX
                    || (y - at_capture.y).abs() > SCROLL_TOLERANCE_PX
            }
            // Without a recorded position any scroll is a drift.
            None => x != 0.0 || y != 0.0,
        }
    }

    #[cfg(test)]
    fn backdate(&mut self, by: Duration) {
        self.stored_at = Instant::now() - by;
    }
}

#[cfg(test)]
mod tests;
