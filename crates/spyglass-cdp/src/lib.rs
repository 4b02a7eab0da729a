//! # Spyglass CDP - Chrome DevTools Protocol Client
//!
//! Low-level Chrome DevTools Protocol (CDP) implementation over WebSocket,
//! the transport floor under the Spyglass session and telemetry core.
//!
//! This crate handles:
//! - WebSocket connections to tab-level debugger endpoints
//! - CDP message serialization and deserialization
//! - Command/response correlation with per-command timeouts
//! - Event fan-out in arrival order
//! - Target discovery over the DevTools HTTP endpoint
//!
//! ## Quick Start
//!
//! ```no_run
//! use spyglass_cdp::{CdpConnection, connection::discovery};
//!
//! # async fn example() -> Result<(), spyglass_cdp::CdpError> {
//! // Find an attachable page tab.
//! let targets = discovery::list_targets("http://localhost:9222").await?;
//! let page = targets
//!     .iter()
//!     .find(|t| t.is_page())
//!     .ok_or_else(|| spyglass_cdp::CdpError::TargetNotFound("no page targets".into()))?;
//!
//! // Attach and drive it.
//! let ws_url = page.web_socket_debugger_url.clone().unwrap();
//! let conn = CdpConnection::connect(&ws_url).await?;
//! let result: serde_json::Value = conn
//!     .send_command("Page.enable", None::<serde_json::Value>)
//!     .await?;
//! # let _ = result;
//! # Ok(())
//! # }
//! ```
//!
//! ## Subscribing to Events
//!
//! ```no_run
//! use spyglass_cdp::CdpConnection;
//!
//! # async fn example(conn: &CdpConnection) {
//! let mut events = conn.subscribe_events();
//! while let Ok(event) = events.recv().await {
//!     match event.method.as_str() {
//!         "Page.loadEventFired" => println!("page loaded"),
//!         "Network.loadingFailed" => println!("request failed: {:?}", event.params),
//!         _ => {}
//!     }
//! }
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`connection`] - WebSocket connection, dispatcher, and discovery
//! - [`transport`] - Message types and serialization
//! - [`protocol`] - Typed CDP domain definitions
//! - [`error`] - Error types

pub mod connection;
pub mod error;
pub mod protocol;
pub mod transport;

pub use connection::discovery::{BrowserVersion, TargetSummary, discover_websocket_url};
pub use connection::{CdpConnection, CdpConnectionOptions};
pub use error::CdpError;
pub use transport::{CdpEvent, CdpMessage, CdpRequest, CdpResponse};
