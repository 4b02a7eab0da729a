//! Network domain: request lifecycle events consumed by the telemetry taps.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Parameters for Network.enable.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEnableParams {
    /// Per-resource buffer size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_resource_buffer_size: Option<i64>,
    /// Total buffer size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_total_buffer_size: Option<i64>,
}

/// Request data as reported by requestWillBeSent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// HTTP headers.
    #[serde(default)]
    pub headers: HashMap<String, serde_json::Value>,
}

/// Response data as reported by responseReceived.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Response URL.
    pub url: String,
    /// HTTP status code.
    pub status: i64,
    /// HTTP status text.
    #[serde(default)]
    pub status_text: String,
    /// MIME type.
    #[serde(default)]
    pub mime_type: String,
    /// Whether the response was served from the disk cache.
    #[serde(default)]
    pub from_disk_cache: bool,
}

/// Event: Network.requestWillBeSent
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWillBeSentEvent {
    /// Request identifier.
    pub request_id: String,
    /// Request data.
    pub request: Request,
    /// Monotonic timestamp in seconds.
    pub timestamp: f64,
    /// Resource type (Document, XHR, Fetch, Script, ...).
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
}

/// Event: Network.responseReceived
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceivedEvent {
    /// Request identifier.
    pub request_id: String,
    /// Response data.
    pub response: Response,
    /// Monotonic timestamp in seconds.
    pub timestamp: f64,
    /// Resource type.
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
}

/// Event: Network.loadingFinished
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFinishedEvent {
    /// Request identifier.
    pub request_id: String,
    /// Monotonic timestamp in seconds.
    pub timestamp: f64,
    /// Total number of bytes received for this request.
    #[serde(default)]
    pub encoded_data_length: f64,
}

/// Event: Network.loadingFailed
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFailedEvent {
    /// Request identifier.
    pub request_id: String,
    /// Monotonic timestamp in seconds.
    pub timestamp: f64,
    /// Error message, e.g. "net::ERR_BLOCKED_BY_CLIENT".
    #[serde(default)]
    pub error_text: String,
    /// True if the request was canceled.
    #[serde(default)]
    pub canceled: bool,
    /// Reason the request was blocked, when it was.
    pub blocked_reason: Option<String>,
}

#[cfg(test)]
mod tests;
