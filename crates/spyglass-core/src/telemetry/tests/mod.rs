use super::*;

fn console_entry(text: &str) -> ConsoleEntry {
    ConsoleEntry {
        level: "log".to_string(),
        args: vec![text.to_string()],
        ts: 1.0,
        source: None,
        line: None,
    }
}

#[test]
fn test_cursor_starts_at_zero_and_grows() {
    let telemetry = TabTelemetry::new("tab1");
    assert_eq!(telemetry.cursor(), 0);
    telemetry.record_console(console_entry("a"));
    telemetry.record_console(console_entry("b"));
    assert_eq!(telemetry.cursor(), 2);
}

#[test]
fn test_ring_overflow_drops_oldest() {
    let telemetry = TabTelemetry::new("tab1");
    for i in 0..(CAP_LARGE + 10) {
        telemetry.record_console(console_entry(&format!("msg {i}")));
    }
    let snapshot = telemetry.snapshot(&SnapshotQuery {
        limit: CAP_LARGE + 10,
        ..SnapshotQuery::default()
    });
    assert_eq!(snapshot.console.len(), CAP_LARGE);
    assert_eq!(snapshot.console[0].args[0], "msg 10");
    // The cursor keeps counting past the cap.
    assert_eq!(snapshot.cursor, (CAP_LARGE + 10) as u64);
}

#[test]
fn test_snapshot_since_filters_strictly() {
    let telemetry = TabTelemetry::new("tab1");
    telemetry.record_console(console_entry("first"));
    let cursor = telemetry.cursor();
    telemetry.record_console(console_entry("second"));

    let snapshot = telemetry.snapshot(&SnapshotQuery {
        since: Some(cursor),
        ..SnapshotQuery::default()
    });
    assert_eq!(snapshot.console.len(), 1);
    assert_eq!(snapshot.console[0].args[0], "second");

    // since == current cursor returns nothing.
    let snapshot = telemetry.snapshot(&SnapshotQuery {
        since: Some(telemetry.cursor()),
        ..SnapshotQuery::default()
    });
    assert!(snapshot.console.is_empty());
}

#[test]
fn test_snapshot_offset_and_limit() {
    let telemetry = TabTelemetry::new("tab1");
    for i in 0..10 {
        telemetry.record_console(console_entry(&format!("{i}")));
    }
    let snapshot = telemetry.snapshot(&SnapshotQuery {
        offset: 3,
        limit: 4,
        ..SnapshotQuery::default()
    });
    assert_eq!(snapshot.console.len(), 4);
    assert_eq!(snapshot.console[0].args[0], "3");
    assert_eq!(snapshot.console[3].args[0], "6");
}

#[test]
fn test_limit_zero_returns_counts_only() {
    let telemetry = TabTelemetry::new("tab1");
    telemetry.record_console(console_entry("a"));
    telemetry.record_error(PageErrorEntry {
        kind: "error".to_string(),
        message: "boom".to_string(),
        filename: None,
        lineno: None,
        colno: None,
        tag: None,
        url: None,
        ts: 1.0,
    });

    let snapshot = telemetry.snapshot(&SnapshotQuery {
        limit: 0,
        ..SnapshotQuery::default()
    });
    assert!(snapshot.console.is_empty());
    assert!(snapshot.errors.is_empty());
    let counts = snapshot.counts.unwrap();
    assert_eq!(counts["console"], 1);
    assert_eq!(counts["errors"], 1);
    assert_eq!(counts["network"], 0);
}

#[test]
fn test_clear_resets_buffers_but_not_cursor() {
    let telemetry = TabTelemetry::new("tab1");
    telemetry.record_console(console_entry("a"));
    telemetry.record_console(console_entry("b"));
    let pre_clear = telemetry.cursor();

    telemetry.clear();

    let snapshot = telemetry.snapshot(&SnapshotQuery::default());
    assert!(snapshot.console.is_empty());
    assert!(snapshot.cursor >= pre_clear);

    // New entries continue the old sequence.
    telemetry.record_console(console_entry("c"));
    assert_eq!(telemetry.cursor(), pre_clear + 1);
}

#[test]
fn test_network_lifecycle_finished_ok() {
    let telemetry = TabTelemetry::new("tab1");
    telemetry.begin_request(
        "R1".to_string(),
        "https://example.com/api".to_string(),
        "GET".to_string(),
        Some("XHR".to_string()),
        100.0,
    );
    telemetry.note_response("R1", 200, None);
    telemetry.finish_request("R1", 100.25, 1024.0);

    let snapshot = telemetry.snapshot(&SnapshotQuery::default());
    assert_eq!(snapshot.har_lite.len(), 1);
    let entry = &snapshot.har_lite[0];
    assert!(entry.ok);
    assert_eq!(entry.status, Some(200));
    assert_eq!(entry.duration_ms, Some(250.0));
    assert_eq!(entry.encoded_data_length, Some(1024.0));
    // Successful requests do not show up in the failure view.
    assert!(snapshot.network.is_empty());
}

#[test]
fn test_network_status_400_is_not_ok() {
    let telemetry = TabTelemetry::new("tab1");
    telemetry.begin_request(
        "R1".to_string(),
        "https://example.com/api".to_string(),
        "GET".to_string(),
        None,
        1.0,
    );
    telemetry.note_response("R1", 403, Some("Fetch".to_string()));
    telemetry.finish_request("R1", 2.0, 0.0);

    let snapshot = telemetry.snapshot(&SnapshotQuery::default());
    assert_eq!(snapshot.network.len(), 1);
    assert!(!snapshot.network[0].ok);
    assert_eq!(snapshot.network[0].resource_type.as_deref(), Some("Fetch"));
}

#[test]
fn test_network_loading_failed_carries_blocked_reason() {
    let telemetry = TabTelemetry::new("tab1");
    telemetry.begin_request(
        "R2".to_string(),
        "https://example.com/ads.js".to_string(),
        "GET".to_string(),
        Some("Script".to_string()),
        5.0,
    );
    telemetry.fail_request(
        "R2",
        5.5,
        "net::ERR_BLOCKED_BY_CLIENT".to_string(),
        Some("blockedByClient".to_string()),
    );

    let snapshot = telemetry.snapshot(&SnapshotQuery::default());
    assert_eq!(snapshot.network.len(), 1);
    let entry = &snapshot.network[0];
    assert!(!entry.ok);
    assert_eq!(entry.error_text.as_deref(), Some("net::ERR_BLOCKED_BY_CLIENT"));
    assert_eq!(entry.blocked_reason.as_deref(), Some("blockedByClient"));
}

#[test]
fn test_finish_unknown_request_is_ignored() {
    let telemetry = TabTelemetry::new("tab1");
    telemetry.finish_request("ghost", 1.0, 0.0);
    assert_eq!(telemetry.cursor(), 0);
}

#[test]
fn test_dialog_flag_and_lifecycle() {
    let telemetry = TabTelemetry::new("tab1");
    telemetry.set_lifecycle(TabLifecycle::Live);

    telemetry.dialog_opened(Some("confirm".to_string()), Some("Proceed?".to_string()));
    assert!(telemetry.dialog_open());
    assert_eq!(telemetry.lifecycle(), TabLifecycle::DialogBlocked);

    let snapshot = telemetry.snapshot(&SnapshotQuery::default());
    assert!(snapshot.dialog_open);
    let dialog = snapshot.dialog.unwrap();
    assert_eq!(dialog.dialog_type.as_deref(), Some("confirm"));
    assert_eq!(dialog.message.as_deref(), Some("Proceed?"));

    telemetry.dialog_closed();
    assert!(!telemetry.dialog_open());
    assert_eq!(telemetry.lifecycle(), TabLifecycle::Live);
    let snapshot = telemetry.snapshot(&SnapshotQuery::default());
    assert!(!snapshot.dialog_open);
    assert!(snapshot.dialog.is_none());
    assert_eq!(snapshot.dialogs.len(), 2);
}

#[test]
fn test_navigation_updates_header_url() {
    let telemetry = TabTelemetry::new("tab1");
    telemetry.record_navigation("https://example.com/a".to_string(), Some("A".to_string()));
    let snapshot = telemetry.snapshot(&SnapshotQuery::default());
    assert_eq!(snapshot.url.as_deref(), Some("https://example.com/a"));
    assert_eq!(snapshot.navigation.len(), 1);

    // Caller-provided URL wins over the recorded one.
    let snapshot = telemetry.snapshot(&SnapshotQuery {
        url: Some("https://override.example/".to_string()),
        ..SnapshotQuery::default()
    });
    assert_eq!(snapshot.url.as_deref(), Some("https://override.example/"));
}

#[test]
fn test_snapshot_serializes_camel_case() {
    let telemetry = TabTelemetry::new("tab1");
    telemetry.begin_request(
        "R1".to_string(),
        "https://example.com/x".to_string(),
        "GET".to_string(),
        None,
        1.0,
    );
    telemetry.fail_request("R1", 2.0, "net::ERR_FAILED".to_string(), None);

    let value = telemetry.snapshot(&SnapshotQuery::default()).to_value();
    assert_eq!(value["dialogOpen"], false);
    assert_eq!(value["harLite"][0]["errorText"], "net::ERR_FAILED");
    assert!(value["unhandledRejections"].as_array().unwrap().is_empty());
}
