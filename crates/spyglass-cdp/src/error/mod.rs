//! Error types for the CDP transport layer.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by the CDP connection and its protocol layer.
#[derive(Debug, Error)]
pub enum CdpError {
    /// The WebSocket handshake failed.
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    /// The WebSocket connection dropped while commands were outstanding.
    #[error("WebSocket connection lost")]
    ConnectionLost,

    /// An outgoing message could not be queued or written.
    #[error("failed to send CDP message: {0}")]
    SendFailed(String),

    /// The browser did not answer a command within its deadline.
    ///
    /// CDP has no cancellation; the command may still execute remotely.
    #[error("response timeout after {}", format_duration(.0))]
    Timeout(Duration),

    /// The browser answered a command with a protocol error object.
    #[error("CDP protocol error {code}: {message}")]
    Protocol {
        /// JSON-RPC style error code.
        code: i64,
        /// Human-readable error message from the browser.
        message: String,
    },

    /// An incoming frame exceeded the configured size bound.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Observed frame size in bytes.
        size: usize,
        /// Configured limit in bytes.
        max: usize,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The WebSocket URL could not be parsed.
    #[error("invalid WebSocket URL: {0}")]
    InvalidUrl(String),

    /// The discovery endpoint URL could not be parsed or had a bad scheme.
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpointUrl(String),

    /// An HTTP request to the DevTools discovery endpoint failed.
    #[error("HTTP request failed: {0}")]
    HttpRequestFailed(String),

    /// The discovery endpoint answered but the payload was unusable.
    #[error("endpoint discovery failed for {url}: {reason}")]
    EndpointDiscoveryFailed {
        /// Endpoint that was queried.
        url: String,
        /// Why the payload was rejected.
        reason: String,
    },

    /// No attachable page target matched the request.
    #[error("target not found: {0}")]
    TargetNotFound(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => Self::ConnectionLost,
            other => Self::ConnectionFailed(other.to_string()),
        }
    }
}

/// Render a duration the way humans read timeouts: whole seconds when
/// possible, milliseconds otherwise.
fn format_duration(d: &Duration) -> String {
    if d.subsec_millis() == 0 && d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

#[cfg(test)]
mod tests;
