use super::*;

#[tokio::test]
async fn test_ws_url_passthrough() {
    let url = "ws://localhost:9222/devtools/page/ABC";
    let result = discover_websocket_url(url).await.unwrap();
    assert_eq!(result, url);
}

#[tokio::test]
async fn test_invalid_scheme_rejected() {
    let err = list_targets("ftp://localhost:9222").await.unwrap_err();
    assert!(matches!(err, CdpError::InvalidEndpointUrl(_)));
}

#[tokio::test]
async fn test_unparseable_url_rejected() {
    let err = discover_websocket_url("not a url").await.unwrap_err();
    assert!(matches!(err, CdpError::InvalidEndpointUrl(_)));
}

#[test]
fn test_target_summary_page_detection() {
    let json = r#"{
        "id": "T1",
        "type": "page",
        "url": "https://example.com",
        "title": "Example",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/T1"
    }"#;
    let target: TargetSummary = serde_json::from_str(json).unwrap();
    assert!(target.is_page());
    assert_eq!(target.id, "T1");
}

#[test]
fn test_target_summary_worker_is_not_page() {
    let json = r#"{"id": "W1", "type": "service_worker", "url": "", "title": ""}"#;
    let target: TargetSummary = serde_json::from_str(json).unwrap();
    assert!(!target.is_page());
    assert!(target.web_socket_debugger_url.is_none());
}
