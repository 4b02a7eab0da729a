//! # Spyglass Core - Session and Telemetry Core
//!
//! The session and telemetry core of an agent-oriented browser automation
//! server. It owns CDP WebSocket connections to Chromium tabs, multiplexes
//! commands with asynchronous event streams, keeps bounded per-tab
//! telemetry, re-attaches safely around reloads and dialogs, and applies a
//! uniform safety policy at every entry point. Agent-facing tools (click,
//! form fill, extraction, diagnostics reports) compose the primitives
//! exposed here; none of them live in this crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use spyglass_core::{BrowserConfig, SessionManager};
//!
//! # async fn example() -> Result<(), spyglass_core::CoreError> {
//! let manager = SessionManager::new();
//! let config = BrowserConfig::from_env();
//!
//! // Open a session against a tab and wire up Tier-0 telemetry.
//! let session = manager.get_session(&config, Duration::from_secs(5)).await?;
//! manager.ensure_telemetry(&session).await?;
//!
//! session.navigate("https://example.com", true).await?;
//! let title = session.eval_js("document.title").await?;
//! println!("title: {title}");
//!
//! // Read what the page did while we drove it.
//! let snapshot = manager
//!     .tier0_snapshot(session.tab_id(), &spyglass_core::SnapshotQuery::default())
//!     .expect("telemetry was ensured");
//! println!("{} console entries", snapshot.console.len());
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Shared sessions
//!
//! Batched tool calls share one CDP connection through a scope guard:
//!
//! ```no_run
//! # use std::time::Duration;
//! # use spyglass_core::{BrowserConfig, SessionManager};
//! # async fn example(manager: &SessionManager, config: &BrowserConfig)
//! #     -> Result<(), spyglass_core::CoreError> {
//! let scope = manager.shared_session(config, Duration::from_secs(5)).await?;
//! let session = scope.session();
//! session.eval_js("1 + 1").await?;
//! scope.release().await; // closes the transport at depth zero
//! # Ok(())
//! # }
//! ```
//!
//! ## Telemetry tiers
//!
//! - **Tier-0** ([`telemetry`]) is pure CDP event capture: console, errors,
//!   rejections, network HAR-lite, navigation, dialogs. Always safe.
//! - **Tier-1** ([`diagnostics`]) is a best-effort in-page global with
//!   snapshot/vitals/resources. It is skipped while a dialog is open and
//!   its failures never block a tool.
//!
//! [`diagnostics::insights::derive_insights`] turns either tier's snapshot
//! into a bounded, scored list of findings (CORS, CSP, auth failures,
//! blocked requests, slow vitals, ...).
//!
//! ## Module Organization
//!
//! - [`session`] - One live CDP connection bound to one tab
//! - [`manager`] - Process-wide registry: shared session, per-tab state
//! - [`telemetry`] - Tier-0 ring buffers and event taps
//! - [`diagnostics`] - Tier-1 installer and insight derivation
//! - [`safety`] - Allowlist, navigation schemes, permission policy
//! - [`affordance`] - Stable `aff:` action refs
//! - [`navgraph`] - Bounded visited-page graph
//! - [`workbench`] - Short-lived CAPTCHA grid state
//! - [`retry`] - The one retry primitive
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Error taxonomy

pub mod affordance;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod manager;
pub mod navgraph;
pub mod retry;
pub mod safety;
pub mod session;
pub mod telemetry;
pub mod workbench;

pub use affordance::{ActionSpec, AffordanceStore, stable_ref};
pub use config::{BrowserConfig, Toolset};
pub use diagnostics::InstallReport;
pub use diagnostics::insights::{Insight, derive_insights, filter_extension_noise};
pub use error::{CoreError, ToolError};
pub use manager::{SessionManager, SharedSessionGuard, TelemetryReport};
pub use navgraph::{LinkEdge, NavGraph, NavGraphView};
pub use retry::{RetryPolicy, with_retry};
pub use safety::{
    PermissionPolicy, PermissionSetting, SafetyMode, SafetyPolicy, apply_permission_policy,
    ensure_allowed, ensure_allowed_navigation, permission_policy_from_env, redact_url,
};
pub use session::{Domain, Session, TargetHandle};
pub use telemetry::{SnapshotQuery, TabLifecycle, TabTelemetry, Tier0Snapshot};
pub use workbench::{CaptchaState, CaptchaWorkbench, build_grid_map};
