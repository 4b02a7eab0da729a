//! CDP message transport types.
//!
//! One session speaks to one tab-level debugger endpoint, so messages carry
//! no session multiplexing identifiers: commands are `{id, method, params}`,
//! responses `{id, result | error}`, events `{method, params}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An outbound CDP command frame.
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    /// Monotonic command ID, unique per connection.
    pub id: u64,
    /// CDP method name (e.g., "Page.navigate").
    pub method: String,
    /// Method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A response frame matching a previously issued command.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponse {
    /// Command ID this response answers.
    pub id: u64,
    /// Result payload on success.
    pub result: Option<Value>,
    /// Error object on failure.
    pub error: Option<CdpResponseError>,
}

/// Error object embedded in a response frame.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponseError {
    /// JSON-RPC style error code.
    pub code: i64,
    /// Error message.
    pub message: String,
    /// Additional error data.
    pub data: Option<Value>,
}

/// An asynchronous event notification pushed by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpEvent {
    /// Event method name (e.g., "Network.loadingFinished").
    pub method: String,
    /// Event parameters; absent params are treated as an empty object.
    pub params: Option<Value>,
}

impl CdpEvent {
    /// Event parameters, substituting an empty object when absent.
    pub fn params_or_empty(&self) -> Value {
        self.params
            .clone()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
    }
}

/// Any inbound frame: a response to a command or a pushed event.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CdpMessage {
    /// A response to a previous request.
    Response(CdpResponse),
    /// An event pushed by the browser.
    Event(CdpEvent),
}

impl CdpMessage {
    /// Check if this message is a response with the given ID.
    pub fn is_response_for(&self, id: u64) -> bool {
        matches!(self, Self::Response(resp) if resp.id == id)
    }

    /// Try to extract this as a response.
    pub fn into_response(self) -> Option<CdpResponse> {
        match self {
            Self::Response(resp) => Some(resp),
            Self::Event(_) => None,
        }
    }

    /// Try to extract this as an event.
    pub fn into_event(self) -> Option<CdpEvent> {
        match self {
            Self::Event(evt) => Some(evt),
            Self::Response(_) => None,
        }
    }
}

#[cfg(test)]
mod tests;
