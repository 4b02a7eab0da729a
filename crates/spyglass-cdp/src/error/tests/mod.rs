use std::time::Duration;

use super::*;

#[test]
fn test_connection_failed_error_display() {
    let err = CdpError::ConnectionFailed("connection refused".to_string());
    assert_eq!(
        err.to_string(),
        "WebSocket connection failed: connection refused"
    );
}

#[test]
fn test_connection_lost_error_display() {
    let err = CdpError::ConnectionLost;
    assert_eq!(err.to_string(), "WebSocket connection lost");
}

#[test]
fn test_send_failed_error_display() {
    let err = CdpError::SendFailed("channel closed".to_string());
    assert_eq!(err.to_string(), "failed to send CDP message: channel closed");
}

#[test]
fn test_protocol_error_display() {
    let err = CdpError::Protocol {
        code: -32601,
        message: "Method not found".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "CDP protocol error -32601: Method not found"
    );
}

#[test]
fn test_timeout_error_display() {
    let err = CdpError::Timeout(Duration::from_secs(5));
    assert_eq!(err.to_string(), "response timeout after 5s");
}

#[test]
fn test_timeout_error_with_millis() {
    let err = CdpError::Timeout(Duration::from_millis(300));
    assert_eq!(err.to_string(), "response timeout after 300ms");
}

#[test]
fn test_frame_too_large_display() {
    let err = CdpError::FrameTooLarge {
        size: 99,
        max: 10,
    };
    assert_eq!(err.to_string(), "frame too large: 99 bytes (max 10)");
}

#[test]
fn test_json_error_from_serde() {
    let json_err: serde_json::Error = serde_json::from_str::<i32>("not a number").unwrap_err();
    let err: CdpError = json_err.into();
    assert!(err.to_string().starts_with("JSON error:"));
}

#[test]
fn test_invalid_url_error_display() {
    let err = CdpError::InvalidUrl("not-a-valid-url".to_string());
    assert_eq!(err.to_string(), "invalid WebSocket URL: not-a-valid-url");
}

#[test]
fn test_target_not_found_display() {
    let err = CdpError::TargetNotFound("ABC123".to_string());
    assert_eq!(err.to_string(), "target not found: ABC123");
}

#[test]
fn test_from_tungstenite_connection_closed() {
    let ws_err = tokio_tungstenite::tungstenite::Error::ConnectionClosed;
    let err: CdpError = ws_err.into();
    assert!(matches!(err, CdpError::ConnectionLost));
}

#[test]
fn test_from_tungstenite_already_closed() {
    let ws_err = tokio_tungstenite::tungstenite::Error::AlreadyClosed;
    let err: CdpError = ws_err.into();
    assert!(matches!(err, CdpError::ConnectionLost));
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CdpError>();
}
