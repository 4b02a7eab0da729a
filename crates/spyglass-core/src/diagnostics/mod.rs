//! Tier-1 diagnostics: best-effort in-page instrumentation.
//!
//! The installer plants one namespaced global (`__spyDiag`) exposing
//! snapshot/summary/vitals/resources/locators/clear. Installation is lazy,
//! idempotent per document revision, refused while a dialog is open, and
//! allowed to fail — a failed install never blocks tool execution. Callers
//! that cannot use Tier-1 fall back to the Tier-0 buffers.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::CoreError;
use crate::session::Session;
use crate::telemetry::SnapshotQuery;

pub mod insights;

/// Name of the page global the installer plants.
pub const DIAG_GLOBAL: &str = "__spyDiag";

/// Bumped whenever the in-page script changes shape.
const DIAG_VERSION: u32 = 3;

/// Outcome of a Tier-1 installation attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallReport {
    /// Tier-1 is part of this build.
    pub enabled: bool,
    /// The global is present and callable.
    pub available: bool,
    /// Installation was skipped without touching the wire.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
    /// Why installation was skipped or failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl InstallReport {
    fn skipped(reason: &str) -> Self {
        Self {
            enabled: true,
            available: false,
            skipped: true,
            reason: Some(reason.to_string()),
        }
    }

    fn failed(reason: String) -> Self {
        Self {
            enabled: true,
            available: false,
            skipped: false,
            reason: Some(reason),
        }
    }

    fn installed() -> Self {
        Self {
            enabled: true,
            available: true,
            skipped: false,
            reason: None,
        }
    }
}

/// The in-page instrumentation source.
///
/// Revision marker: the page global stores `v<N>:<performance.timeOrigin>`;
/// a reload (new document) changes timeOrigin, forcing reinstallation,
/// while repeated installs on the same document no-op.
fn installer_js() -> String {
    format!(
        r#"(() => {{
  const g = globalThis;
  const revision = 'v{version}:' + String(performance.timeOrigin);
  if (g.{global} && g.{global}.revision === revision) {{
    return {{ installed: true, fresh: false, revision }};
  }}
  const state = {{ console: [], errors: [], unhandledRejections: [], network: [], seq: 0, cursor: 0 }};
  const push = (buf, entry) => {{
    state.cursor = ++state.seq;
    entry.seq = state.seq;
    buf.push(entry);
    if (buf.length > 200) buf.shift();
  }};
  for (const level of ['log', 'info', 'warn', 'error', 'debug']) {{
    const orig = console[level] && console[level].bind(console);
    if (!orig) continue;
    console[level] = (...args) => {{
      try {{
        push(state.console, {{
          level,
          args: args.map((a) => {{ try {{ return String(a).slice(0, 300); }} catch {{ return '<unprintable>'; }} }}),
          ts: Date.now(),
        }});
      }} catch {{}}
      return orig(...args);
    }};
  }}
  g.addEventListener('error', (e) => {{
    try {{
      if (e && e.target && e.target !== g && e.target.tagName) {{
        push(state.errors, {{
          type: 'resource',
          tag: String(e.target.tagName).toLowerCase(),
          url: e.target.src || e.target.href || null,
          ts: Date.now(),
        }});
      }} else {{
        push(state.errors, {{
          type: 'error',
          message: e && e.message,
          filename: e && e.filename,
          lineno: e && e.lineno,
          colno: e && e.colno,
          ts: Date.now(),
        }});
      }}
    }} catch {{}}
  }}, true);
  g.addEventListener('unhandledrejection', (e) => {{
    try {{
      let message = 'Unhandled promise rejection';
      let stack = null;
      const r = e && e.reason;
      if (r) {{ message = r.message || String(r); stack = r.stack || null; }}
      push(state.unhandledRejections, {{ message: String(message).slice(0, 300), stack, ts: Date.now() }});
    }} catch {{}}
  }});
  const vitals = {{ cls: 0, lcp: null, longTasks: {{ count: 0, maxDuration: 0 }} }};
  try {{
    new PerformanceObserver((list) => {{
      for (const entry of list.getEntries()) {{ if (!entry.hadRecentInput) vitals.cls += entry.value; }}
    }}).observe({{ type: 'layout-shift', buffered: true }});
    new PerformanceObserver((list) => {{
      const entries = list.getEntries();
      const last = entries[entries.length - 1];
      if (last) vitals.lcp = {{
        startTime: last.startTime,
        element: (last.element && last.element.tagName) || null,
        url: last.url || null,
      }};
    }}).observe({{ type: 'largest-contentful-paint', buffered: true }});
    new PerformanceObserver((list) => {{
      for (const entry of list.getEntries()) {{
        vitals.longTasks.count += 1;
        if (entry.duration > vitals.longTasks.maxDuration) vitals.longTasks.maxDuration = entry.duration;
      }}
    }}).observe({{ type: 'longtask', buffered: true }});
  }} catch {{}}
  const resources = () => {{
    try {{
      const entries = performance.getEntriesByType('resource');
      const rows = entries.map((e) => ({{
        url: e.name,
        initiatorType: e.initiatorType,
        transferSize: e.transferSize || 0,
        duration: e.duration,
      }}));
      let total = 0;
      for (const r of rows) total += r.transferSize;
      const largest = rows.slice().sort((a, b) => b.transferSize - a.transferSize).slice(0, 5);
      const slowest = rows.slice().sort((a, b) => b.duration - a.duration).slice(0, 5);
      return {{ summary: {{ count: rows.length, totalTransferSize: total, largest, slowest }} }};
    }} catch {{
      return {{ summary: null }};
    }}
  }};
  const summary = () => ({{
    consoleErrors: state.console.filter((e) => e.level === 'error').length,
    consoleWarnings: state.console.filter((e) => e.level === 'warn').length,
    jsErrors: state.errors.filter((e) => e.type === 'error').length,
    resourceErrors: state.errors.filter((e) => e.type === 'resource').length,
    unhandledRejections: state.unhandledRejections.length,
    failedRequests: state.network.length,
  }});
  const snapshot = (opts) => {{
    opts = opts || {{}};
    const since = opts.since || 0;
    const offset = opts.offset || 0;
    const limit = opts.limit == null ? 50 : opts.limit;
    const pageOf = (buf) => {{
      const match = since ? buf.filter((e) => e.seq > since) : buf.slice();
      return limit === 0 ? [] : match.slice(offset, offset + limit);
    }};
    return {{
      tier: 'tier1',
      url: location.href,
      title: document.title,
      readyState: document.readyState,
      console: pageOf(state.console),
      errors: pageOf(state.errors),
      unhandledRejections: pageOf(state.unhandledRejections),
      network: pageOf(state.network),
      summary: summary(),
      vitals,
      resources: resources(),
      cursor: state.cursor,
      revision,
    }};
  }};
  g.{global} = {{
    revision,
    snapshot,
    summary,
    vitals: () => vitals,
    resources,
    locators: () => [],
    clear: () => {{
      state.console.length = 0;
      state.errors.length = 0;
      state.unhandledRejections.length = 0;
      state.network.length = 0;
    }},
  }};
  return {{ installed: true, fresh: true, revision }};
}})()"#,
        version = DIAG_VERSION,
        global = DIAG_GLOBAL,
    )
}

/// Install the Tier-1 global into the session's page.
///
/// Dialog-safe and failure-tolerant: with a dialog open the wire is not
/// touched at all, and any evaluation failure is reported, not raised.
pub async fn install(session: &Session) -> InstallReport {
    if session.dialog_open() {
        return InstallReport::skipped("dialog_open");
    }

    match session.eval_js(&installer_js()).await {
        Ok(value) => {
            let installed = value
                .get("installed")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if installed {
                debug!(revision = ?value.get("revision"), "Tier-1 diagnostics installed");
                InstallReport::installed()
            } else {
                InstallReport::failed("installer returned no confirmation".to_string())
            }
        }
        Err(CoreError::DialogBlocked) => InstallReport::skipped("dialog_open"),
        Err(err) => InstallReport::failed(err.to_string()),
    }
}

/// Take a Tier-1 snapshot, if the global is installed and reachable.
///
/// Returns `None` on any failure; callers fall back to Tier-0.
pub async fn tier1_snapshot(session: &Session, query: &SnapshotQuery) -> Option<Value> {
    if session.dialog_open() {
        return None;
    }

    let mut opts = json!({
        "offset": query.offset,
        "limit": query.limit,
    });
    if let Some(since) = query.since {
        opts["since"] = json!(since);
    }

    let js = format!(
        "(() => {{ const d = globalThis.{DIAG_GLOBAL}; \
         if (!d || typeof d.snapshot !== 'function') return null; \
         return d.snapshot({opts}); }})()"
    );

    match session.eval_js(&js).await {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(_) => None,
    }
}

/// Best-effort clear of the Tier-1 buffers.
pub async fn clear(session: &Session) -> bool {
    if session.dialog_open() {
        return false;
    }
    let js = format!(
        "globalThis.{DIAG_GLOBAL} && globalThis.{DIAG_GLOBAL}.clear && globalThis.{DIAG_GLOBAL}.clear()"
    );
    session.eval_js(&js).await.is_ok()
}
