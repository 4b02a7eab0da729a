//! Tier-0 event taps.
//!
//! One spawned task per tab consumes the connection's event broadcast and
//! folds raw CDP events into the tab's telemetry buffers. The task never
//! issues commands and never blocks; heavy consumers read snapshots
//! instead of subscribing.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use spyglass_cdp::CdpConnection;
use spyglass_cdp::protocol::network::{
    LoadingFailedEvent, LoadingFinishedEvent, RequestWillBeSentEvent, ResponseReceivedEvent,
};
use spyglass_cdp::protocol::page::{FrameNavigatedEvent, JavascriptDialogOpeningEvent, NavigatedWithinDocumentEvent};
use spyglass_cdp::protocol::runtime::{
    ConsoleApiCalledEvent, ConsoleApiType, ExceptionThrownEvent, RemoteObject,
};
use spyglass_cdp::transport::CdpEvent;

use super::{ConsoleEntry, MAX_ARG_LEN, OverlayHint, PageErrorEntry, RejectionEntry, TabTelemetry, now_ms};

/// Dev-overlay console markers, checked against warn/error output.
const OVERLAY_MARKERS: &[(&str, &str)] = &[
    ("[vite]", "vite"),
    ("[webpack-dev-server]", "webpack"),
    ("[HMR]", "webpack"),
    ("[Fast Refresh]", "next"),
];

/// Spawn the tap task for one tab.
pub(crate) fn spawn(connection: &Arc<CdpConnection>, telemetry: Arc<TabTelemetry>) -> JoinHandle<()> {
    let mut events = connection.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => route(&telemetry, &event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(tab_id = telemetry.tab_id(), skipped = skipped, "Telemetry tap lagged; events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        trace!(tab_id = telemetry.tab_id(), "Telemetry tap ended");
    })
}

/// Fold one raw event into the buffers. Unknown methods are ignored.
fn route(telemetry: &TabTelemetry, event: &CdpEvent) {
    let params = event.params_or_empty();
    match event.method.as_str() {
        "Runtime.consoleAPICalled" => {
            if let Ok(ev) = serde_json::from_value::<ConsoleApiCalledEvent>(params) {
                on_console(telemetry, ev);
            }
        }
        "Runtime.exceptionThrown" => {
            if let Ok(ev) = serde_json::from_value::<ExceptionThrownEvent>(params) {
                on_exception(telemetry, ev);
            }
        }
        "Network.requestWillBeSent" => {
            if let Ok(ev) = serde_json::from_value::<RequestWillBeSentEvent>(params) {
                telemetry.begin_request(
                    ev.request_id,
                    ev.request.url,
                    ev.request.method,
                    ev.resource_type,
                    ev.timestamp,
                );
            }
        }
        "Network.responseReceived" => {
            if let Ok(ev) = serde_json::from_value::<ResponseReceivedEvent>(params) {
                telemetry.note_response(&ev.request_id, ev.response.status, ev.resource_type);
            }
        }
        "Network.loadingFinished" => {
            if let Ok(ev) = serde_json::from_value::<LoadingFinishedEvent>(params) {
                telemetry.finish_request(&ev.request_id, ev.timestamp, ev.encoded_data_length);
            }
        }
        "Network.loadingFailed" => {
            if let Ok(ev) = serde_json::from_value::<LoadingFailedEvent>(params) {
                telemetry.fail_request(
                    &ev.request_id,
                    ev.timestamp,
                    ev.error_text,
                    ev.blocked_reason,
                );
            }
        }
        "Page.javascriptDialogOpening" => {
            if let Ok(ev) = serde_json::from_value::<JavascriptDialogOpeningEvent>(params) {
                telemetry.dialog_opened(Some(ev.dialog_type.to_string()), Some(ev.message));
            }
        }
        "Page.javascriptDialogClosed" => {
            telemetry.dialog_closed();
        }
        "Page.frameNavigated" => {
            if let Ok(ev) = serde_json::from_value::<FrameNavigatedEvent>(params) {
                // Only top-frame navigations count.
                if ev.frame.parent_id.is_none() {
                    telemetry.record_navigation(ev.frame.url, None);
                }
            }
        }
        "Page.navigatedWithinDocument" => {
            if let Ok(ev) = serde_json::from_value::<NavigatedWithinDocumentEvent>(params) {
                telemetry.record_navigation(ev.url, None);
            }
        }
        _ => {}
    }
}

fn on_console(telemetry: &TabTelemetry, event: ConsoleApiCalledEvent) {
    let level = match event.call_type {
        ConsoleApiType::Error | ConsoleApiType::Assert => "error",
        ConsoleApiType::Warning => "warn",
        ConsoleApiType::Info => "info",
        ConsoleApiType::Debug => "debug",
        _ => "log",
    };

    let args: Vec<String> = event.args.iter().map(stringify_arg).collect();

    let (source, line) = event
        .stack_trace
        .as_ref()
        .and_then(|st| st.call_frames.first())
        .map_or((None, None), |frame| {
            (Some(frame.url.clone()), Some(frame.line_number))
        });

    if matches!(level, "warn" | "error") {
        let joined = args.join(" ");
        for (marker, framework) in OVERLAY_MARKERS {
            if joined.contains(marker) {
                telemetry.record_overlay_hint(OverlayHint {
                    framework: (*framework).to_string(),
                    text: truncate(&joined, MAX_ARG_LEN),
                    ts: now_ms(),
                });
                break;
            }
        }
    }

    telemetry.record_console(ConsoleEntry {
        level: level.to_string(),
        args,
        ts: event.timestamp,
        source,
        line,
    });
}

fn on_exception(telemetry: &TabTelemetry, event: ExceptionThrownEvent) {
    let details = event.exception_details;
    let message = details.message();

    // Promise rejections arrive as exceptionThrown with an "Uncaught (in
    // promise)" prefix; keep them in their own buffer.
    if message.contains("(in promise)") {
        telemetry.record_rejection(RejectionEntry {
            message,
            stack: details
                .stack_trace
                .as_ref()
                .and_then(|st| st.call_frames.first())
                .map(|f| f.url.clone()),
            ts: event.timestamp,
        });
        return;
    }

    telemetry.record_error(PageErrorEntry {
        kind: "error".to_string(),
        message,
        filename: details.url,
        lineno: Some(details.line_number),
        colno: Some(details.column_number),
        tag: None,
        url: None,
        ts: event.timestamp,
    });
}

fn stringify_arg(arg: &RemoteObject) -> String {
    let rendered = if let Some(value) = &arg.value {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    } else if let Some(description) = &arg.description {
        description.clone()
    } else {
        arg.object_type.clone()
    };
    truncate(&rendered, MAX_ARG_LEN)
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}
