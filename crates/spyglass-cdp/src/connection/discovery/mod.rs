//! DevTools endpoint discovery via HTTP.
//!
//! Chromium exposes an HTTP discovery surface next to the WebSocket one:
//! `/json/version` carries the browser-level WebSocket URL, `/json/list`
//! enumerates attachable targets, and `/json/new` opens a tab. The session
//! layer uses these to find or create the page target it will attach to.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::CdpError;

/// Default timeout for HTTP endpoint discovery.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Response from the `/json/version` endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserVersion {
    /// Browser name and version.
    pub browser: Option<String>,
    /// Protocol version.
    pub protocol_version: Option<String>,
    /// User agent string.
    pub user_agent: Option<String>,
    /// The WebSocket URL for a browser-level CDP connection.
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: Option<String>,
}

/// One attachable target as reported by `/json/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSummary {
    /// Stable target identifier.
    pub id: String,
    /// Target kind: "page", "iframe", "service_worker", ...
    #[serde(rename = "type")]
    pub target_type: String,
    /// Current document URL.
    #[serde(default)]
    pub url: String,
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Tab-level WebSocket debugger URL, when attachable.
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: Option<String>,
}

impl TargetSummary {
    /// Whether this target is an attachable page tab.
    pub fn is_page(&self) -> bool {
        self.target_type == "page" && self.web_socket_debugger_url.is_some()
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, CdpError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CdpError::HttpRequestFailed(e.to_string()))
}

fn endpoint_join(endpoint_url: &str, path: &str) -> Result<Url, CdpError> {
    let base = Url::parse(endpoint_url)
        .map_err(|e| CdpError::InvalidEndpointUrl(format!("{endpoint_url}: {e}")))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(CdpError::InvalidEndpointUrl(format!(
            "expected http or https scheme, got: {}",
            base.scheme()
        )));
    }
    base.join(path)
        .map_err(|e| CdpError::InvalidEndpointUrl(format!("failed to build {path} URL: {e}")))
}

/// Discover the browser-level WebSocket URL from an HTTP endpoint.
///
/// Given `http://localhost:9222`, fetches `/json/version` and returns its
/// `webSocketDebuggerUrl`. A `ws://`/`wss://` input is returned as-is.
///
/// # Errors
///
/// Returns an error if the URL is invalid, the request fails, or the
/// response carries no WebSocket URL.
#[instrument(level = "debug", skip(endpoint_url), fields(endpoint = %endpoint_url))]
pub async fn discover_websocket_url(endpoint_url: &str) -> Result<String, CdpError> {
    if endpoint_url.starts_with("ws://") || endpoint_url.starts_with("wss://") {
        debug!("URL is already a WebSocket URL, returning as-is");
        return Ok(endpoint_url.to_string());
    }

    let version_url = endpoint_join(endpoint_url, "/json/version")?;
    let client = http_client(DEFAULT_DISCOVERY_TIMEOUT)?;
    let response = client
        .get(version_url.as_str())
        .send()
        .await
        .map_err(|e| CdpError::HttpRequestFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(CdpError::EndpointDiscoveryFailed {
            url: endpoint_url.to_string(),
            reason: format!("HTTP status {}", response.status()),
        });
    }

    let version: BrowserVersion =
        response
            .json()
            .await
            .map_err(|e| CdpError::EndpointDiscoveryFailed {
                url: endpoint_url.to_string(),
                reason: format!("failed to parse response: {e}"),
            })?;

    version
        .web_socket_debugger_url
        .ok_or_else(|| CdpError::EndpointDiscoveryFailed {
            url: endpoint_url.to_string(),
            reason: "response missing webSocketDebuggerUrl field".to_string(),
        })
}

/// List the attachable targets exposed by the discovery endpoint.
///
/// # Errors
///
/// Returns an error if the URL is invalid, the request fails, or the
/// payload cannot be parsed.
#[instrument(level = "debug", skip(endpoint_url), fields(endpoint = %endpoint_url))]
pub async fn list_targets(endpoint_url: &str) -> Result<Vec<TargetSummary>, CdpError> {
    let list_url = endpoint_join(endpoint_url, "/json/list")?;
    let client = http_client(DEFAULT_DISCOVERY_TIMEOUT)?;
    let response = client
        .get(list_url.as_str())
        .send()
        .await
        .map_err(|e| CdpError::HttpRequestFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(CdpError::EndpointDiscoveryFailed {
            url: endpoint_url.to_string(),
            reason: format!("HTTP status {}", response.status()),
        });
    }

    response
        .json()
        .await
        .map_err(|e| CdpError::EndpointDiscoveryFailed {
            url: endpoint_url.to_string(),
            reason: format!("failed to parse target list: {e}"),
        })
}

/// Open a new tab via `/json/new` and return its summary.
///
/// Modern Chromium requires PUT for this endpoint.
///
/// # Errors
///
/// Returns an error if the URL is invalid, the request fails, or the
/// payload cannot be parsed.
#[instrument(level = "debug", skip(endpoint_url, url), fields(endpoint = %endpoint_url))]
pub async fn create_target(endpoint_url: &str, url: &str) -> Result<TargetSummary, CdpError> {
    let mut new_url = endpoint_join(endpoint_url, "/json/new")?;
    new_url.set_query(Some(url));
    let client = http_client(DEFAULT_DISCOVERY_TIMEOUT)?;
    let response = client
        .put(new_url.as_str())
        .send()
        .await
        .map_err(|e| CdpError::HttpRequestFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(CdpError::EndpointDiscoveryFailed {
            url: endpoint_url.to_string(),
            reason: format!("HTTP status {}", response.status()),
        });
    }

    response
        .json()
        .await
        .map_err(|e| CdpError::EndpointDiscoveryFailed {
            url: endpoint_url.to_string(),
            reason: format!("failed to parse new-target response: {e}"),
        })
}

#[cfg(test)]
mod tests;
