//! A live CDP session bound to one browser tab.
//!
//! The session owns its transport exclusively: one [`CdpConnection`] with
//! one read pump and one serialized writer. It caches enabled domains,
//! exposes the typed primitives higher-level tools compose (eval, input,
//! navigation, DOM, screenshots, metrics), and refuses JavaScript
//! evaluation while a dialog is holding the page.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use spyglass_cdp::error::CdpError;
use spyglass_cdp::protocol::dom::{GetDocumentParams, GetDocumentResult, Node};
use spyglass_cdp::protocol::input::{
    DispatchKeyEventParams, DispatchMouseEventParams, InsertTextParams, KeyEventType, MouseButton,
};
use spyglass_cdp::protocol::page::{
    CaptureScreenshotParams, CaptureScreenshotResult, FrameStoppedLoadingEvent,
    GetNavigationHistoryResult, NavigateParams, NavigateResult, ScreenshotFormat,
};
use spyglass_cdp::protocol::performance::GetMetricsResult;
use spyglass_cdp::protocol::runtime::{EvaluateParams, EvaluateResult};
use spyglass_cdp::transport::CdpEvent;
use spyglass_cdp::{CdpConnection, CdpConnectionOptions};

use crate::error::{CoreError, ToolError};
use crate::telemetry::{TabLifecycle, TabTelemetry};

/// Deadline for `Page.navigate` load waits.
const NAVIGATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra wire budget on top of the in-page evaluation timeout.
const EVAL_WIRE_MARGIN: Duration = Duration::from_millis(500);

/// CDP domains a session can enable, cached per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Page lifecycle and navigation.
    Page,
    /// DOM access.
    Dom,
    /// JavaScript runtime.
    Runtime,
    /// Network instrumentation.
    Network,
    /// Performance metrics.
    Performance,
    /// Accessibility tree.
    Accessibility,
}

impl Domain {
    fn enable_method(self) -> &'static str {
        match self {
            Self::Page => "Page.enable",
            Self::Dom => "DOM.enable",
            Self::Runtime => "Runtime.enable",
            Self::Network => "Network.enable",
            Self::Performance => "Performance.enable",
            Self::Accessibility => "Accessibility.enable",
        }
    }
}

/// The tab a session attaches to.
#[derive(Debug, Clone)]
pub struct TargetHandle {
    /// Stable target id.
    pub target_id: String,
    /// Last known tab URL.
    pub url: String,
    /// Tab-level WebSocket debugger URL.
    pub ws_debugger_url: String,
}

/// One live connection to one tab.
#[derive(Debug)]
pub struct Session {
    connection: Arc<CdpConnection>,
    tab_id: String,
    tab_url: Mutex<String>,
    enabled: Mutex<HashSet<Domain>>,
    telemetry: Mutex<Option<Arc<TabTelemetry>>>,
    closed: AtomicBool,
}

impl Session {
    /// Open the transport to a target and start the dispatcher pump.
    ///
    /// # Errors
    ///
    /// Returns an error if the WebSocket handshake fails.
    #[instrument(level = "debug", skip(target, timeout), fields(tab_id = %target.target_id))]
    pub async fn attach(target: &TargetHandle, timeout: Duration) -> Result<Self, CoreError> {
        let options = CdpConnectionOptions::new().command_timeout(timeout);
        let connection = tokio::time::timeout(
            timeout,
            CdpConnection::connect_with_options(&target.ws_debugger_url, &options),
        )
        .await
        .map_err(|_| CoreError::Cdp(CdpError::Timeout(timeout)))??;
        debug!("Session attached");
        Ok(Self {
            connection: Arc::new(connection),
            tab_id: target.target_id.clone(),
            tab_url: Mutex::new(target.url.clone()),
            enabled: Mutex::new(HashSet::new()),
            telemetry: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    /// Tab this session is bound to.
    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }

    /// Last known tab URL.
    pub fn tab_url(&self) -> String {
        self.tab_url.lock().clone()
    }

    /// The underlying connection, for event subscription.
    pub fn connection(&self) -> &Arc<CdpConnection> {
        &self.connection
    }

    /// Bind the per-tab telemetry handle. Done by the session manager when
    /// taps are attached; the session only reads the dialog flag from it.
    pub(crate) fn bind_telemetry(&self, telemetry: Arc<TabTelemetry>) {
        *self.telemetry.lock() = Some(telemetry);
    }

    /// The bound telemetry handle, when telemetry was ensured.
    pub fn telemetry(&self) -> Option<Arc<TabTelemetry>> {
        self.telemetry.lock().clone()
    }

    /// Whether a JavaScript dialog currently holds the page.
    pub fn dialog_open(&self) -> bool {
        self.telemetry().is_some_and(|t| t.dialog_open())
    }

    /// Enable a CDP domain, once per session.
    pub async fn enable(&self, domain: Domain) -> Result<(), CoreError> {
        if self.enabled.lock().contains(&domain) {
            return Ok(());
        }
        self.send_typed::<Value, Value>(domain.enable_method(), None)
            .await?;
        self.enabled.lock().insert(domain);
        Ok(())
    }

    /// Send a raw CDP command.
    pub async fn send(&self, method: &str, params: Option<Value>) -> Result<Value, CoreError> {
        self.send_typed(method, params).await
    }

    /// Send a raw CDP command with an explicit deadline.
    pub async fn send_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value, CoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CoreError::Cdp(CdpError::ConnectionLost));
        }
        Ok(self
            .connection
            .send_command_with_timeout(method, params, timeout)
            .await?)
    }

    /// Send a typed CDP command.
    pub async fn send_typed<P, R>(&self, method: &str, params: Option<P>) -> Result<R, CoreError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CoreError::Cdp(CdpError::ConnectionLost));
        }
        Ok(self.connection.send_command(method, params).await?)
    }

    /// Evaluate a JavaScript expression and materialize its value.
    ///
    /// Uses `returnByValue` and `awaitPromise`. Refused with
    /// [`CoreError::DialogBlocked`] while a dialog is open, because the
    /// evaluation would hang until the dialog is handled.
    pub async fn eval_js(&self, expression: &str) -> Result<Value, CoreError> {
        self.eval_js_with_timeout(expression, Duration::from_secs(5))
            .await
    }

    /// Evaluate a JavaScript expression with an explicit budget.
    #[instrument(level = "trace", skip(self, expression))]
    pub async fn eval_js_with_timeout(
        &self,
        expression: &str,
        timeout: Duration,
    ) -> Result<Value, CoreError> {
        if self.dialog_open() {
            return Err(CoreError::DialogBlocked);
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(CoreError::Cdp(CdpError::ConnectionLost));
        }

        let mut params = EvaluateParams::by_value(expression);
        params.timeout = Some(timeout.as_secs_f64() * 1000.0);

        let result: EvaluateResult = self
            .connection
            .send_command_with_timeout(
                "Runtime.evaluate",
                Some(params),
                timeout + EVAL_WIRE_MARGIN,
            )
            .await?;

        if let Some(details) = result.exception_details {
            return Err(ToolError::new(
                "session",
                "evaluate",
                details.message(),
                "Check the expression for errors and ensure the page is responsive",
            )
            .into());
        }

        Ok(result.result.value.unwrap_or(Value::Null))
    }

    /// Click at viewport coordinates: move, then press/release pairs.
    pub async fn click(
        &self,
        x: f64,
        y: f64,
        button: MouseButton,
        count: i32,
    ) -> Result<(), CoreError> {
        self.dispatch_mouse(DispatchMouseEventParams::mouse_move(x, y))
            .await?;
        for i in 1..=count.max(1) {
            self.dispatch_mouse(DispatchMouseEventParams::mouse_down(x, y, button, i))
                .await?;
            self.dispatch_mouse(DispatchMouseEventParams::mouse_up(x, y, button, i))
                .await?;
        }
        Ok(())
    }

    /// Insert text at the current selection, as an IME would.
    pub async fn type_text(&self, text: &str) -> Result<(), CoreError> {
        self.send_typed::<_, Value>(
            "Input.insertText",
            Some(InsertTextParams {
                text: text.to_string(),
            }),
        )
        .await?;
        Ok(())
    }

    /// Press a named key (Enter, Tab, ArrowDown, ...) or a single
    /// character, as a deterministic down/up pair.
    pub async fn press_key(&self, key: &str) -> Result<(), CoreError> {
        if let Some(def) = key_definition(key) {
            self.dispatch_key(DispatchKeyEventParams {
                event_type: KeyEventType::RawKeyDown,
                key: Some(def.key.to_string()),
                code: Some(def.code.to_string()),
                text: None,
                windows_virtual_key_code: Some(def.key_code),
                native_virtual_key_code: Some(def.key_code),
            })
            .await?;
            self.dispatch_key(DispatchKeyEventParams {
                event_type: KeyEventType::KeyUp,
                key: Some(def.key.to_string()),
                code: Some(def.code.to_string()),
                text: None,
                windows_virtual_key_code: Some(def.key_code),
                native_virtual_key_code: Some(def.key_code),
            })
            .await?;
            return Ok(());
        }

        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                self.dispatch_key(DispatchKeyEventParams {
                    event_type: KeyEventType::Char,
                    key: Some(c.to_string()),
                    code: None,
                    text: Some(c.to_string()),
                    windows_virtual_key_code: None,
                    native_virtual_key_code: None,
                })
                .await
            }
            _ => Err(CoreError::Validation(format!("unknown key name: {key}"))),
        }
    }

    /// Scroll by a wheel delta at the given viewport position.
    pub async fn scroll(&self, dx: f64, dy: f64, x: f64, y: f64) -> Result<(), CoreError> {
        self.dispatch_mouse(DispatchMouseEventParams::wheel(x, y, dx, dy))
            .await
    }

    /// Drag from one point to another with interpolated moves.
    pub async fn drag(
        &self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        steps: u32,
    ) -> Result<(), CoreError> {
        let steps = steps.max(1);
        self.dispatch_mouse(DispatchMouseEventParams::mouse_move(x1, y1))
            .await?;
        self.dispatch_mouse(DispatchMouseEventParams::mouse_down(
            x1,
            y1,
            MouseButton::Left,
            1,
        ))
        .await?;
        for i in 1..=steps {
            let progress = f64::from(i) / f64::from(steps);
            let x = x1 + (x2 - x1) * progress;
            let y = y1 + (y2 - y1) * progress;
            self.dispatch_mouse(DispatchMouseEventParams::mouse_move(x, y))
                .await?;
        }
        self.dispatch_mouse(DispatchMouseEventParams::mouse_up(
            x2,
            y2,
            MouseButton::Left,
            1,
        ))
        .await?;
        Ok(())
    }

    /// Navigate the tab, optionally waiting for the load to settle.
    ///
    /// The event subscription is taken before `Page.navigate` is issued so
    /// a fast load cannot slip between command and wait.
    #[instrument(level = "debug", skip(self, url), fields(url = %url))]
    pub async fn navigate(&self, url: &str, wait_load: bool) -> Result<NavigateResult, CoreError> {
        self.enable(Domain::Page).await?;

        let mut events = wait_load.then(|| self.connection.subscribe_events());

        let result: NavigateResult = self
            .send_typed("Page.navigate", Some(NavigateParams::new(url)))
            .await?;

        if let Some(error_text) = result.error_text.as_deref().filter(|t| !t.is_empty()) {
            return Err(ToolError::new(
                "session",
                "navigate",
                error_text,
                "Check the URL; the browser refused to load it",
            )
            .into());
        }

        *self.tab_url.lock() = url.to_string();

        if let Some(events) = events.as_mut() {
            self.wait_load_on(events, Some(&result.frame_id), NAVIGATE_TIMEOUT)
                .await?;
        }

        Ok(result)
    }

    /// Wait for the current load to settle.
    pub async fn wait_load(&self, timeout: Duration) -> Result<(), CoreError> {
        self.enable(Domain::Page).await?;
        let mut events = self.connection.subscribe_events();
        self.wait_load_on(&mut events, None, timeout).await
    }

    async fn wait_load_on(
        &self,
        events: &mut broadcast::Receiver<CdpEvent>,
        frame_id: Option<&str>,
        timeout: Duration,
    ) -> Result<(), CoreError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Err(CoreError::Cdp(CdpError::Timeout(timeout)));
            }
            let remaining = deadline - now;
            match tokio::time::timeout(remaining, events.recv()).await {
                Err(_) => return Err(CoreError::Cdp(CdpError::Timeout(timeout))),
                Ok(Err(broadcast::error::RecvError::Closed)) => {
                    return Err(CoreError::Cdp(CdpError::ConnectionLost));
                }
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    warn!(skipped = skipped, "Load waiter lagged behind events");
                }
                Ok(Ok(event)) => match event.method.as_str() {
                    "Page.loadEventFired" => return Ok(()),
                    "Page.frameStoppedLoading" => {
                        let stopped: Option<FrameStoppedLoadingEvent> =
                            serde_json::from_value(event.params_or_empty()).ok();
                        match (frame_id, stopped) {
                            (Some(expected), Some(ev)) if ev.frame_id == expected => {
                                return Ok(());
                            }
                            (None, Some(_)) => return Ok(()),
                            _ => {}
                        }
                    }
                    _ => {}
                },
            }
        }
    }

    /// Fetch the document tree to the given depth.
    pub async fn get_dom(&self, depth: i32) -> Result<Node, CoreError> {
        self.enable(Domain::Dom).await?;
        let result: GetDocumentResult = self
            .send_typed(
                "DOM.getDocument",
                Some(GetDocumentParams {
                    depth: Some(depth),
                    pierce: Some(true),
                }),
            )
            .await?;
        Ok(result.root)
    }

    /// Capture a screenshot, returning decoded image bytes.
    pub async fn capture_screenshot(
        &self,
        format: ScreenshotFormat,
    ) -> Result<Vec<u8>, CoreError> {
        let result: CaptureScreenshotResult = self
            .send_typed(
                "Page.captureScreenshot",
                Some(CaptureScreenshotParams {
                    format: Some(format),
                    ..CaptureScreenshotParams::default()
                }),
            )
            .await?;
        BASE64
            .decode(result.data.as_bytes())
            .map_err(|e| CoreError::Validation(format!("invalid screenshot payload: {e}")))
    }

    /// Current performance metrics, fetched on demand.
    pub async fn metrics(&self) -> Result<GetMetricsResult, CoreError> {
        self.enable(Domain::Performance).await?;
        self.send_typed::<Value, GetMetricsResult>("Performance.getMetrics", None)
            .await
    }

    /// The tab's navigation history.
    pub async fn navigation_history(&self) -> Result<GetNavigationHistoryResult, CoreError> {
        self.send_typed::<Value, GetNavigationHistoryResult>("Page.getNavigationHistory", None)
            .await
    }

    async fn dispatch_mouse(&self, params: DispatchMouseEventParams) -> Result<(), CoreError> {
        self.send_typed::<_, Value>("Input.dispatchMouseEvent", Some(params))
            .await?;
        Ok(())
    }

    async fn dispatch_key(&self, params: DispatchKeyEventParams) -> Result<(), CoreError> {
        self.send_typed::<_, Value>("Input.dispatchKeyEvent", Some(params))
            .await?;
        Ok(())
    }

    /// Whether `close` has completed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.connection.is_closed()
    }

    /// Release the transport. Idempotent; safe on every exit path.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(telemetry) = self.telemetry() {
            telemetry.set_lifecycle(TabLifecycle::Closing);
        }
        self.connection.close().await;
        if let Some(telemetry) = self.telemetry() {
            telemetry.set_lifecycle(TabLifecycle::Closed);
        }
        debug!(tab_id = %self.tab_id, "Session closed");
    }
}

/// A named key with its CDP identity.
struct KeyDefinition {
    key: &'static str,
    code: &'static str,
    key_code: i32,
}

fn key_definition(name: &str) -> Option<KeyDefinition> {
    let (key, code, key_code) = match name {
        "Enter" => ("Enter", "Enter", 13),
        "Tab" => ("Tab", "Tab", 9),
        "Escape" => ("Escape", "Escape", 27),
        "Backspace" => ("Backspace", "Backspace", 8),
        "Delete" => ("Delete", "Delete", 46),
        "ArrowLeft" => ("ArrowLeft", "ArrowLeft", 37),
        "ArrowUp" => ("ArrowUp", "ArrowUp", 38),
        "ArrowRight" => ("ArrowRight", "ArrowRight", 39),
        "ArrowDown" => ("ArrowDown", "ArrowDown", 40),
        "Home" => ("Home", "Home", 36),
        "End" => ("End", "End", 35),
        "PageUp" => ("PageUp", "PageUp", 33),
        "PageDown" => ("PageDown", "PageDown", 34),
        "Space" => (" ", "Space", 32),
        _ => return None,
    };
    Some(KeyDefinition {
        key,
        code,
        key_code,
    })
}
