//! The process-wide session manager.
//!
//! One explicitly constructed registry owns everything that outlives a
//! single tool call: the active shared session, per-tab Tier-0 telemetry,
//! affordance stores, navigation graphs, CAPTCHA workbenches, and the
//! global safety policy. Sessions hold only their tab id plus a telemetry
//! handle, so nothing here is cyclic.
//!
//! Locking discipline: registry locks are short `parking_lot` sections and
//! are never held across a CDP send; the shared-session slot is an async
//! mutex because acquiring it may open a transport.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use spyglass_cdp::CdpConnection;
use spyglass_cdp::connection::discovery;

use crate::affordance::{ActionSpec, AffordanceStore};
use crate::config::BrowserConfig;
use crate::diagnostics::{self, InstallReport};
use crate::error::{CoreError, ToolError};
use crate::navgraph::{GraphSummary, LinkEdge, NavGraph, NavGraphView};
use crate::safety::{SafetyMode, SafetyPolicy};
use crate::session::{Domain, Session, TargetHandle};
use crate::telemetry::{SnapshotQuery, TabLifecycle, TabTelemetry, Tier0Snapshot, taps};
use crate::workbench::{CaptchaState, CaptchaWorkbench};

/// Result of an `ensure_telemetry` call.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryReport {
    /// Tier-0 is active for the tab.
    pub enabled: bool,
    /// Always "tier0".
    pub tier: String,
}

struct SharedSlot {
    session: Arc<Session>,
    depth: u32,
}

/// Process-wide registry of sessions and per-tab state.
#[derive(Default)]
pub struct SessionManager {
    telemetry: RwLock<HashMap<String, Arc<TabTelemetry>>>,
    /// Connection each tab's tap task is reading from. A re-attach after a
    /// detach gets fresh taps because the weak no longer matches.
    taps: Mutex<HashMap<String, Weak<CdpConnection>>>,
    affordances: Mutex<HashMap<String, AffordanceStore>>,
    nav_graphs: Mutex<HashMap<String, NavGraph>>,
    workbenches: Mutex<HashMap<String, CaptchaWorkbench>>,
    shared: tokio::sync::Mutex<Option<SharedSlot>>,
    policy: RwLock<SafetyPolicy>,
    session_tab_id: Mutex<Option<String>>,
}

impl SessionManager {
    /// A fresh manager with a permissive policy and empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Session acquisition

    /// Open a fresh session against a page target picked via the DevTools
    /// discovery endpoint. Creates a blank tab when none is attachable.
    ///
    /// # Errors
    ///
    /// Returns a `session/connect` [`ToolError`] when discovery or the
    /// attach fails.
    #[instrument(level = "debug", skip(self, config, timeout))]
    pub async fn get_session(
        &self,
        config: &BrowserConfig,
        timeout: Duration,
    ) -> Result<Session, CoreError> {
        let endpoint = config.endpoint_url();
        let target = self
            .pick_target(&endpoint)
            .await
            .map_err(|e| connect_error(e.to_string()))?;

        let session = Session::attach(&target, timeout)
            .await
            .map_err(|e| connect_error(e.to_string()))?;

        *self.session_tab_id.lock() = Some(session.tab_id().to_string());
        let telemetry = self.tab_telemetry(session.tab_id());
        if telemetry.lifecycle() == TabLifecycle::New {
            telemetry.set_lifecycle(TabLifecycle::Attached);
        }
        Ok(session)
    }

    async fn pick_target(&self, endpoint: &str) -> Result<TargetHandle, CoreError> {
        let targets = discovery::list_targets(endpoint).await?;
        let summary = match targets.into_iter().find(discovery::TargetSummary::is_page) {
            Some(summary) => summary,
            None => discovery::create_target(endpoint, "about:blank").await?,
        };
        let ws_debugger_url = summary.web_socket_debugger_url.clone().ok_or_else(|| {
            CoreError::Validation(format!("target {} has no debugger URL", summary.id))
        })?;
        Ok(TargetHandle {
            target_id: summary.id,
            url: summary.url,
            ws_debugger_url,
        })
    }

    /// Enter the shared-session scope: the first entry opens a session and
    /// binds it as active, nested entries reuse it. Exiting through
    /// [`SharedSessionGuard::release`] closes the transport at depth zero.
    ///
    /// A partial init (telemetry attach failure) closes the fresh
    /// transport eagerly before the error surfaces.
    ///
    /// # Errors
    ///
    /// Returns a `session/connect` [`ToolError`] when a fresh session
    /// cannot be opened.
    pub async fn shared_session(
        &self,
        config: &BrowserConfig,
        timeout: Duration,
    ) -> Result<SharedSessionGuard<'_>, CoreError> {
        let mut slot = self.shared.lock().await;
        if let Some(existing) = slot.as_mut() {
            existing.depth += 1;
            let session = existing.session.clone();
            return Ok(SharedSessionGuard {
                manager: self,
                session,
                released: false,
            });
        }

        let session = Arc::new(self.get_session(config, timeout).await?);
        if let Err(err) = self.ensure_telemetry(&session).await {
            // Never leak a WebSocket when initialization fails; timeouts
            // under open dialogs are the common case here.
            session.close().await;
            return Err(err);
        }
        *slot = Some(SharedSlot {
            session: session.clone(),
            depth: 1,
        });
        debug!(tab_id = session.tab_id(), "Shared session bound");
        Ok(SharedSessionGuard {
            manager: self,
            session,
            released: false,
        })
    }

    /// The currently bound shared session, when a scope is active.
    pub async fn active_shared_session(&self) -> Option<Arc<Session>> {
        self.shared.lock().await.as_ref().map(|s| s.session.clone())
    }

    /// The current session's tab id, when one was opened.
    pub fn session_tab_id(&self) -> Option<String> {
        self.session_tab_id.lock().clone()
    }

    // Telemetry

    /// Get or create the Tier-0 state for a tab.
    pub fn tab_telemetry(&self, tab_id: &str) -> Arc<TabTelemetry> {
        if let Some(existing) = self.telemetry.read().get(tab_id) {
            return existing.clone();
        }
        let mut map = self.telemetry.write();
        map.entry(tab_id.to_string())
            .or_insert_with(|| Arc::new(TabTelemetry::new(tab_id)))
            .clone()
    }

    /// Attach Tier-0 taps to a session, idempotently.
    ///
    /// Enables the Page/Runtime/Network domains (cached per session) and
    /// spawns the tap task once per tab.
    ///
    /// # Errors
    ///
    /// Returns an error when a domain cannot be enabled.
    pub async fn ensure_telemetry(&self, session: &Session) -> Result<TelemetryReport, CoreError> {
        let telemetry = self.tab_telemetry(session.tab_id());
        session.bind_telemetry(telemetry.clone());

        if self.taps_needed(session) {
            session.enable(Domain::Page).await?;
            session.enable(Domain::Runtime).await?;
            session.enable(Domain::Network).await?;
            let mut taps_map = self.taps.lock();
            if taps_needed_locked(&taps_map, session) {
                let _tap = taps::spawn(session.connection(), telemetry.clone());
                taps_map.insert(
                    session.tab_id().to_string(),
                    Arc::downgrade(session.connection()),
                );
                telemetry.mark_taps_attached();
                telemetry.set_lifecycle(TabLifecycle::Live);
                debug!(tab_id = session.tab_id(), "Tier-0 taps attached");
            }
        }

        Ok(TelemetryReport {
            enabled: true,
            tier: "tier0".to_string(),
        })
    }

    /// Whether this session's connection still needs a tap task.
    fn taps_needed(&self, session: &Session) -> bool {
        taps_needed_locked(&self.taps.lock(), session)
    }

    /// Install Tier-1 diagnostics when it is safe to do so.
    pub async fn ensure_diagnostics(&self, session: &Session) -> InstallReport {
        diagnostics::install(session).await
    }

    /// Paginated Tier-0 view for a tab.
    pub fn tier0_snapshot(&self, tab_id: &str, query: &SnapshotQuery) -> Option<Tier0Snapshot> {
        self.telemetry
            .read()
            .get(tab_id)
            .map(|t| t.snapshot(query))
    }

    /// Raw telemetry state for a tab (exposes the dialog flag).
    pub fn telemetry(&self, tab_id: &str) -> Option<Arc<TabTelemetry>> {
        self.telemetry.read().get(tab_id).cloned()
    }

    /// Reset a tab's buffers; the cursor is preserved.
    pub fn clear_telemetry(&self, tab_id: &str) -> bool {
        match self.telemetry.read().get(tab_id) {
            Some(telemetry) => {
                telemetry.clear();
                true
            }
            None => false,
        }
    }

    // Affordances

    /// Cache action specs for a tab and return their stable refs.
    pub fn set_affordances(
        &self,
        tab_id: &str,
        items: &[ActionSpec],
        url: Option<String>,
        cursor: Option<u64>,
    ) -> Vec<String> {
        let mut stores = self.affordances.lock();
        stores
            .entry(tab_id.to_string())
            .or_default()
            .set(items, url, cursor)
    }

    /// Resolve a ref to its cached action spec.
    pub fn resolve_affordance(&self, tab_id: &str, ref_: &str) -> Option<ActionSpec> {
        self.affordances
            .lock()
            .get(tab_id)
            .and_then(|store| store.resolve(ref_).cloned())
    }

    // Navigation graph

    /// Record a visited page and its discovered link edges.
    pub fn note_nav_graph_observation(
        &self,
        tab_id: &str,
        url: &str,
        title: Option<&str>,
        link_edges: &[LinkEdge],
    ) -> GraphSummary {
        let mut graphs = self.nav_graphs.lock();
        graphs
            .entry(tab_id.to_string())
            .or_default()
            .observe(url, title, link_edges)
    }

    /// Bounded graph view for a tab; `None` until something was observed.
    pub fn nav_graph_view(
        &self,
        tab_id: &str,
        node_limit: usize,
        edge_limit: usize,
    ) -> Option<NavGraphView> {
        let graphs = self.nav_graphs.lock();
        let graph = graphs.get(tab_id)?;
        if graph.is_empty() {
            return None;
        }
        Some(graph.view(node_limit, edge_limit))
    }

    // CAPTCHA workbench

    /// Cache a fresh CAPTCHA analysis for a tab.
    pub fn set_captcha_state(&self, tab_id: &str, state: CaptchaState) {
        self.workbenches
            .lock()
            .insert(tab_id.to_string(), CaptchaWorkbench::new(state));
    }

    /// The cached CAPTCHA state, when younger than `max_age_ms`.
    pub fn captcha_state(&self, tab_id: &str, max_age_ms: u64) -> Option<CaptchaState> {
        self.workbenches
            .lock()
            .get(tab_id)
            .and_then(|bench| bench.get(max_age_ms).cloned())
    }

    /// Invalidate the workbench when the page scrolled past tolerance.
    pub fn note_scroll(&self, tab_id: &str, x: f64, y: f64) {
        let mut benches = self.workbenches.lock();
        if benches
            .get(tab_id)
            .is_some_and(|bench| bench.invalidated_by_scroll(x, y))
        {
            benches.remove(tab_id);
            debug!(tab_id = tab_id, "CAPTCHA workbench invalidated by scroll");
        }
    }

    /// Invalidate the workbench on a viewport resize.
    pub fn note_viewport_resize(&self, tab_id: &str) {
        if self.workbenches.lock().remove(tab_id).is_some() {
            debug!(tab_id = tab_id, "CAPTCHA workbench invalidated by resize");
        }
    }

    // Policy

    /// Current safety policy (atomic read).
    pub fn policy(&self) -> SafetyPolicy {
        *self.policy.read()
    }

    /// Switch the safety mode.
    pub fn set_policy(&self, mode: SafetyMode) {
        self.policy.write().mode = mode;
        debug!(mode = mode.as_str(), "Safety policy updated");
    }

    // Lifecycle

    /// Expire per-tab caches after a tab closed. Telemetry buffers are
    /// kept, keyed by tab id, until an explicit reset.
    pub fn note_tab_closed(&self, tab_id: &str) {
        self.affordances.lock().remove(tab_id);
        self.workbenches.lock().remove(tab_id);
        self.taps.lock().remove(tab_id);
        if let Some(telemetry) = self.telemetry(tab_id) {
            telemetry.set_lifecycle(TabLifecycle::Closed);
        }
        let mut current = self.session_tab_id.lock();
        if current.as_deref() == Some(tab_id) {
            *current = None;
        }
    }

    /// Drop every registry entry and release the shared session, e.g.
    /// after a browser restart.
    pub async fn recover_reset(&self) {
        if let Some(slot) = self.shared.lock().await.take() {
            slot.session.close().await;
        }
        self.telemetry.write().clear();
        self.taps.lock().clear();
        self.affordances.lock().clear();
        self.nav_graphs.lock().clear();
        self.workbenches.lock().clear();
        *self.session_tab_id.lock() = None;
        debug!("Session manager reset");
    }

    /// Test seam: pretend a session for this tab is active.
    #[cfg(test)]
    pub(crate) fn set_session_tab_id(&self, tab_id: &str) {
        *self.session_tab_id.lock() = Some(tab_id.to_string());
    }
}

fn taps_needed_locked(taps: &HashMap<String, Weak<CdpConnection>>, session: &Session) -> bool {
    match taps.get(session.tab_id()).and_then(Weak::upgrade) {
        Some(conn) => !Arc::ptr_eq(&conn, session.connection()),
        None => true,
    }
}

fn connect_error(reason: String) -> CoreError {
    ToolError::new(
        "session",
        "connect",
        reason,
        "Ensure Chrome is running with --remote-debugging-port=9222",
    )
    .into()
}

/// RAII handle for the shared-session scope.
///
/// Call [`release`](Self::release) on every exit path; dropping the guard
/// without releasing leaves the refcount high and the transport open until
/// [`SessionManager::recover_reset`].
pub struct SharedSessionGuard<'a> {
    manager: &'a SessionManager,
    session: Arc<Session>,
    released: bool,
}

impl SharedSessionGuard<'_> {
    /// The shared session bound to this scope.
    pub fn session(&self) -> Arc<Session> {
        self.session.clone()
    }

    /// Leave the scope; the outermost release closes the transport and
    /// expires the tab's caches.
    pub async fn release(mut self) {
        self.released = true;
        let mut slot = self.manager.shared.lock().await;
        let close_now = match slot.as_mut() {
            Some(existing) => {
                existing.depth = existing.depth.saturating_sub(1);
                existing.depth == 0
            }
            None => false,
        };
        let session = if close_now {
            slot.take().map(|s| s.session)
        } else {
            None
        };
        drop(slot);

        if let Some(session) = session {
            session.close().await;
            self.manager.note_tab_closed(session.tab_id());
            debug!(tab_id = session.tab_id(), "Shared session released");
        }
    }
}

impl Drop for SharedSessionGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                tab_id = self.session.tab_id(),
                "Shared session guard dropped without release; transport stays open"
            );
        }
    }
}
