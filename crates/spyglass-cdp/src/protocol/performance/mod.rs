//! Performance domain: on-demand page metrics.

use serde::{Deserialize, Serialize};

/// Parameters for Performance.enable.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceEnableParams {
    /// Time domain for collecting metrics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_domain: Option<String>,
}

/// One named performance metric.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    /// Metric name, e.g. "JSHeapUsedSize", "LayoutCount".
    pub name: String,
    /// Metric value.
    pub value: f64,
}

/// Result of Performance.getMetrics.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMetricsResult {
    /// All current metrics.
    pub metrics: Vec<Metric>,
}

impl GetMetricsResult {
    /// Look up a metric value by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.iter().find(|m| m.name == name).map(|m| m.value)
    }
}
