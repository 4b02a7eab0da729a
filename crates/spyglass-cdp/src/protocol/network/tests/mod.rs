use super::*;

#[test]
fn test_request_will_be_sent_event() {
    let json = r#"{
        "requestId": "R1",
        "request": {"url": "https://example.com/api", "method": "GET", "headers": {}},
        "timestamp": 100.5,
        "type": "XHR"
    }"#;
    let event: RequestWillBeSentEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event.request_id, "R1");
    assert_eq!(event.request.method, "GET");
    assert_eq!(event.resource_type.as_deref(), Some("XHR"));
}

#[test]
fn test_response_received_event() {
    let json = r#"{
        "requestId": "R1",
        "response": {"url": "https://example.com/api", "status": 403, "statusText": "Forbidden"},
        "timestamp": 101.0
    }"#;
    let event: ResponseReceivedEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event.response.status, 403);
    assert!(!event.response.from_disk_cache);
}

#[test]
fn test_loading_failed_event_blocked() {
    let json = r#"{
        "requestId": "R2",
        "timestamp": 102.0,
        "errorText": "net::ERR_BLOCKED_BY_CLIENT",
        "canceled": false,
        "blockedReason": "blockedByClient"
    }"#;
    let event: LoadingFailedEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event.error_text, "net::ERR_BLOCKED_BY_CLIENT");
    assert_eq!(event.blocked_reason.as_deref(), Some("blockedByClient"));
}

#[test]
fn test_loading_finished_event_defaults() {
    let json = r#"{"requestId": "R3", "timestamp": 103.0}"#;
    let event: LoadingFinishedEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event.encoded_data_length, 0.0);
}
