//! Tier-0 telemetry: bounded per-tab buffers fed purely by CDP events.
//!
//! Nothing in this module injects page script. The taps (see [`taps`])
//! transform raw Console/Runtime/Network/Page events into compact records
//! and append them here; readers take paginated snapshots against a
//! monotonic sequence cursor.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

pub(crate) mod taps;

/// Ring capacity for console, error, and network buffers.
const CAP_LARGE: usize = 200;
/// Ring capacity for navigation and dialog buffers.
const CAP_MEDIUM: usize = 100;
/// Ring capacity for rejection and overlay-hint buffers.
const CAP_SMALL: usize = 50;

/// Upper bound on a single stringified console argument.
pub(crate) const MAX_ARG_LEN: usize = 300;

/// Wall-clock timestamp in milliseconds.
pub(crate) fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Tab lifecycle as tracked by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabLifecycle {
    /// Known but not yet attached.
    #[default]
    New,
    /// Transport open, domains not yet enabled.
    Attached,
    /// Fully live.
    Live,
    /// A JavaScript dialog is holding the page; eval is refused.
    DialogBlocked,
    /// Close requested.
    Closing,
    /// Transport released.
    Closed,
}

/// One captured console call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleEntry {
    /// Level: "log", "info", "warn", "error", "debug".
    pub level: String,
    /// Stringified arguments, each bounded in length.
    pub args: Vec<String>,
    /// Event timestamp in ms.
    pub ts: f64,
    /// Source file of the call site, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Source line of the call site, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<i64>,
}

/// An uncaught error or failed resource load.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageErrorEntry {
    /// "error" for JS exceptions, "resource" for failed loads.
    #[serde(rename = "type")]
    pub kind: String,
    /// Error message.
    pub message: String,
    /// Script or resource URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Line number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<i64>,
    /// Column number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colno: Option<i64>,
    /// Failing element tag for resource errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Resource URL for resource errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Event timestamp in ms.
    pub ts: f64,
}

/// An unhandled promise rejection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionEntry {
    /// Rejection reason rendered as text.
    pub message: String,
    /// Stack trace when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Event timestamp in ms.
    pub ts: f64,
}

/// One finished or failed network request (HAR-lite record).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEntry {
    /// CDP request id.
    pub request_id: String,
    /// Request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Response status, when one arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    /// Resource type (Document, XHR, Fetch, ...).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// False when the request failed or answered >= 400.
    pub ok: bool,
    /// Wall time from request start to completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    /// Encoded body size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_data_length: Option<f64>,
    /// Network error, e.g. "net::ERR_BLOCKED_BY_CLIENT".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
    /// Blocked reason, e.g. "blockedByClient".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
    /// Monotonic start timestamp in seconds.
    pub start_ts: f64,
}

/// One observed navigation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEntry {
    /// Navigated URL.
    pub url: String,
    /// Document title, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Event timestamp in ms.
    pub ts: f64,
}

/// A dialog open/close transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogEntry {
    /// "open" or "close".
    pub event: String,
    /// Dialog type: alert, confirm, prompt, beforeunload.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub dialog_type: Option<String>,
    /// Dialog message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Event timestamp in ms.
    pub ts: f64,
}

/// A framework dev-overlay hint derived from console output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayHint {
    /// Framework marker: "vite", "next", "webpack".
    #[serde(rename = "type")]
    pub framework: String,
    /// Matched console text.
    pub text: String,
    /// Event timestamp in ms.
    pub ts: f64,
}

/// Bounded ring buffer whose entries carry a shared sequence number.
#[derive(Debug)]
struct Ring<T> {
    entries: VecDeque<(u64, T)>,
    cap: usize,
}

impl<T: Clone> Ring<T> {
    fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap.min(64)),
            cap,
        }
    }

    fn push(&mut self, seq: u64, item: T) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back((seq, item));
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries with seq > since, paginated. `limit == 0` yields only the
    /// match count.
    fn page(&self, since: u64, offset: usize, limit: usize) -> (Vec<T>, usize) {
        let matching: Vec<&T> = self
            .entries
            .iter()
            .filter(|(seq, _)| *seq > since)
            .map(|(_, item)| item)
            .collect();
        let count = matching.len();
        if limit == 0 {
            return (Vec::new(), count);
        }
        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        (items, count)
    }
}

/// An in-flight network request awaiting completion.
#[derive(Debug, Clone)]
struct InflightRequest {
    url: String,
    method: String,
    resource_type: Option<String>,
    status: Option<i64>,
    start_ts: f64,
}

#[derive(Debug)]
struct TelemetryInner {
    next_seq: u64,
    console: Ring<ConsoleEntry>,
    errors: Ring<PageErrorEntry>,
    rejections: Ring<RejectionEntry>,
    network: Ring<NetworkEntry>,
    navigation: Ring<NavigationEntry>,
    dialogs: Ring<DialogEntry>,
    overlay_hints: Ring<OverlayHint>,
    inflight: HashMap<String, InflightRequest>,
    last_dialog: Option<DialogEntry>,
    url: Option<String>,
    title: Option<String>,
}

impl TelemetryInner {
    fn new() -> Self {
        Self {
            next_seq: 1,
            console: Ring::new(CAP_LARGE),
            errors: Ring::new(CAP_LARGE),
            rejections: Ring::new(CAP_SMALL),
            network: Ring::new(CAP_LARGE),
            navigation: Ring::new(CAP_MEDIUM),
            dialogs: Ring::new(CAP_MEDIUM),
            overlay_hints: Ring::new(CAP_SMALL),
            inflight: HashMap::new(),
            last_dialog: None,
            url: None,
            title: None,
        }
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn cursor(&self) -> u64 {
        self.next_seq - 1
    }
}

/// Query parameters for [`TabTelemetry::snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotQuery {
    /// Only entries with sequence number strictly greater than this.
    pub since: Option<u64>,
    /// Entries to skip per category.
    pub offset: usize,
    /// Max entries per category; 0 returns counts only.
    pub limit: usize,
    /// Page URL override for the snapshot header.
    pub url: Option<String>,
    /// Page title override for the snapshot header.
    pub title: Option<String>,
    /// Document readyState, when the caller knows it.
    pub ready_state: Option<String>,
}

impl Default for SnapshotQuery {
    fn default() -> Self {
        Self {
            since: None,
            offset: 0,
            limit: 50,
            url: None,
            title: None,
            ready_state: None,
        }
    }
}

/// A paginated Tier-0 snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier0Snapshot {
    /// Always "tier0".
    pub tier: String,
    /// Page URL, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Page title, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Document readyState, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_state: Option<String>,
    /// Console entries.
    pub console: Vec<ConsoleEntry>,
    /// Uncaught errors.
    pub errors: Vec<PageErrorEntry>,
    /// Unhandled promise rejections.
    pub unhandled_rejections: Vec<RejectionEntry>,
    /// Failed requests only.
    pub network: Vec<NetworkEntry>,
    /// All finished requests, HAR-lite form.
    pub har_lite: Vec<NetworkEntry>,
    /// Navigation events.
    pub navigation: Vec<NavigationEntry>,
    /// Dialog open/close events.
    pub dialogs: Vec<DialogEntry>,
    /// Framework dev-overlay hints.
    pub overlay_hints: Vec<OverlayHint>,
    /// Latest overlay hint, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_overlay: Option<OverlayHint>,
    /// Whether a dialog is currently holding the page.
    pub dialog_open: bool,
    /// Metadata of the currently open dialog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialog: Option<DialogEntry>,
    /// Highest assigned sequence number.
    pub cursor: u64,
    /// Per-category match counts, present when `limit == 0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<BTreeMap<String, usize>>,
}

impl Tier0Snapshot {
    /// The snapshot as a JSON value, the shape insight derivation consumes.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Per-tab Tier-0 telemetry state.
///
/// Owned by the session manager, keyed by tab id, and shared with the tap
/// task and any session bound to the tab. Appends and reads are short
/// critical sections; nothing here blocks.
#[derive(Debug)]
pub struct TabTelemetry {
    tab_id: String,
    dialog_open: AtomicBool,
    taps_attached: AtomicBool,
    lifecycle: Mutex<TabLifecycle>,
    inner: Mutex<TelemetryInner>,
}

impl TabTelemetry {
    /// Fresh state for one tab.
    #[must_use]
    pub fn new(tab_id: impl Into<String>) -> Self {
        Self {
            tab_id: tab_id.into(),
            dialog_open: AtomicBool::new(false),
            taps_attached: AtomicBool::new(false),
            lifecycle: Mutex::new(TabLifecycle::New),
            inner: Mutex::new(TelemetryInner::new()),
        }
    }

    /// Tab this state belongs to.
    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }

    /// Whether a JavaScript dialog is currently holding the page.
    pub fn dialog_open(&self) -> bool {
        self.dialog_open.load(Ordering::SeqCst)
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> TabLifecycle {
        *self.lifecycle.lock()
    }

    /// Record a lifecycle transition.
    pub fn set_lifecycle(&self, state: TabLifecycle) {
        *self.lifecycle.lock() = state;
    }

    /// Mark taps attached; returns false when they already were.
    pub(crate) fn mark_taps_attached(&self) -> bool {
        !self.taps_attached.swap(true, Ordering::SeqCst)
    }

    /// Whether taps are attached.
    pub fn taps_attached(&self) -> bool {
        self.taps_attached.load(Ordering::SeqCst)
    }

    /// Highest assigned sequence number.
    pub fn cursor(&self) -> u64 {
        self.inner.lock().cursor()
    }

    pub(crate) fn record_console(&self, entry: ConsoleEntry) {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq();
        inner.console.push(seq, entry);
    }

    pub(crate) fn record_error(&self, entry: PageErrorEntry) {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq();
        inner.errors.push(seq, entry);
    }

    pub(crate) fn record_rejection(&self, entry: RejectionEntry) {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq();
        inner.rejections.push(seq, entry);
    }

    pub(crate) fn record_overlay_hint(&self, hint: OverlayHint) {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq();
        inner.overlay_hints.push(seq, hint);
    }

    pub(crate) fn record_navigation(&self, url: String, title: Option<String>) {
        let mut inner = self.inner.lock();
        inner.url = Some(url.clone());
        if title.is_some() {
            inner.title.clone_from(&title);
        }
        let seq = inner.next_seq();
        inner.navigation.push(
            seq,
            NavigationEntry {
                url,
                title,
                ts: now_ms(),
            },
        );
    }

    pub(crate) fn begin_request(
        &self,
        request_id: String,
        url: String,
        method: String,
        resource_type: Option<String>,
        start_ts: f64,
    ) {
        let mut inner = self.inner.lock();
        // The in-flight map is bounded by the same cap as the ring; a page
        // spraying requests cannot grow it without finishing them.
        if inner.inflight.len() >= CAP_LARGE {
            inner.inflight.clear();
        }
        inner.inflight.insert(
            request_id,
            InflightRequest {
                url,
                method,
                resource_type,
                status: None,
                start_ts,
            },
        );
    }

    pub(crate) fn note_response(&self, request_id: &str, status: i64, resource_type: Option<String>) {
        let mut inner = self.inner.lock();
        if let Some(inflight) = inner.inflight.get_mut(request_id) {
            inflight.status = Some(status);
            if resource_type.is_some() {
                inflight.resource_type = resource_type;
            }
        }
    }

    pub(crate) fn finish_request(&self, request_id: &str, end_ts: f64, encoded_data_length: f64) {
        let mut inner = self.inner.lock();
        let Some(inflight) = inner.inflight.remove(request_id) else {
            return;
        };
        let ok = inflight.status.is_none_or(|s| s < 400);
        let entry = NetworkEntry {
            request_id: request_id.to_string(),
            url: inflight.url,
            method: inflight.method,
            status: inflight.status,
            resource_type: inflight.resource_type,
            ok,
            duration_ms: Some(((end_ts - inflight.start_ts) * 1000.0).max(0.0)),
            encoded_data_length: Some(encoded_data_length),
            error_text: None,
            blocked_reason: None,
            start_ts: inflight.start_ts,
        };
        let seq = inner.next_seq();
        inner.network.push(seq, entry);
    }

    pub(crate) fn fail_request(
        &self,
        request_id: &str,
        end_ts: f64,
        error_text: String,
        blocked_reason: Option<String>,
    ) {
        let mut inner = self.inner.lock();
        let Some(inflight) = inner.inflight.remove(request_id) else {
            return;
        };
        let entry = NetworkEntry {
            request_id: request_id.to_string(),
            url: inflight.url,
            method: inflight.method,
            status: inflight.status,
            resource_type: inflight.resource_type,
            ok: false,
            duration_ms: Some(((end_ts - inflight.start_ts) * 1000.0).max(0.0)),
            encoded_data_length: None,
            error_text: (!error_text.is_empty()).then_some(error_text),
            blocked_reason,
            start_ts: inflight.start_ts,
        };
        let seq = inner.next_seq();
        inner.network.push(seq, entry);
    }

    pub(crate) fn dialog_opened(&self, dialog_type: Option<String>, message: Option<String>) {
        let entry = DialogEntry {
            event: "open".to_string(),
            dialog_type,
            message,
            ts: now_ms(),
        };
        self.dialog_open.store(true, Ordering::SeqCst);
        if self.lifecycle() == TabLifecycle::Live {
            self.set_lifecycle(TabLifecycle::DialogBlocked);
        }
        let mut inner = self.inner.lock();
        inner.last_dialog = Some(entry.clone());
        let seq = inner.next_seq();
        inner.dialogs.push(seq, entry);
    }

    pub(crate) fn dialog_closed(&self) {
        self.dialog_open.store(false, Ordering::SeqCst);
        if self.lifecycle() == TabLifecycle::DialogBlocked {
            self.set_lifecycle(TabLifecycle::Live);
        }
        let mut inner = self.inner.lock();
        inner.last_dialog = None;
        let entry = DialogEntry {
            event: "close".to_string(),
            dialog_type: None,
            message: None,
            ts: now_ms(),
        };
        let seq = inner.next_seq();
        inner.dialogs.push(seq, entry);
    }

    /// Take a paginated snapshot of every buffer.
    pub fn snapshot(&self, query: &SnapshotQuery) -> Tier0Snapshot {
        let inner = self.inner.lock();
        let since = query.since.unwrap_or(0);
        let (offset, limit) = (query.offset, query.limit);

        let (console, console_count) = inner.console.page(since, offset, limit);
        let (errors, errors_count) = inner.errors.page(since, offset, limit);
        let (rejections, rejections_count) = inner.rejections.page(since, offset, limit);
        let (har_lite, network_count) = inner.network.page(since, offset, limit);
        let (navigation, navigation_count) = inner.navigation.page(since, offset, limit);
        let (dialogs, dialogs_count) = inner.dialogs.page(since, offset, limit);
        let (overlay_hints, _) = inner.overlay_hints.page(since, offset, limit);

        let network: Vec<NetworkEntry> =
            har_lite.iter().filter(|e| !e.ok).cloned().collect();

        let counts = (limit == 0).then(|| {
            let mut map = BTreeMap::new();
            map.insert("console".to_string(), console_count);
            map.insert("errors".to_string(), errors_count);
            map.insert("unhandledRejections".to_string(), rejections_count);
            map.insert("network".to_string(), network_count);
            map.insert("navigation".to_string(), navigation_count);
            map.insert("dialogs".to_string(), dialogs_count);
            map
        });

        let dev_overlay = overlay_hints.last().cloned();

        Tier0Snapshot {
            tier: "tier0".to_string(),
            url: query.url.clone().or_else(|| inner.url.clone()),
            title: query.title.clone().or_else(|| inner.title.clone()),
            ready_state: query.ready_state.clone(),
            console,
            errors,
            unhandled_rejections: rejections,
            network,
            har_lite,
            navigation,
            dialogs,
            overlay_hints,
            dev_overlay,
            dialog_open: self.dialog_open(),
            dialog: inner.last_dialog.clone(),
            cursor: inner.cursor(),
            counts,
        }
    }

    /// Reset every buffer. The sequence cursor is preserved so `since`
    /// tokens issued before the clear stay valid.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.console.clear();
        inner.errors.clear();
        inner.rejections.clear();
        inner.network.clear();
        inner.navigation.clear();
        inner.dialogs.clear();
        inner.overlay_hints.clear();
        inner.inflight.clear();
    }
}

#[cfg(test)]
mod tests;
