use super::*;

#[test]
fn test_request_serialization_minimal() {
    let req = CdpRequest {
        id: 1,
        method: "Target.getTargets".to_string(),
        params: None,
    };
    let json = serde_json::to_string(&req).unwrap();
    assert_eq!(json, r#"{"id":1,"method":"Target.getTargets"}"#);
}

#[test]
fn test_request_serialization_with_params() {
    let req = CdpRequest {
        id: 42,
        method: "Page.navigate".to_string(),
        params: Some(serde_json::json!({"url": "https://example.com"})),
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains(r#""id":42"#));
    assert!(json.contains(r#""method":"Page.navigate""#));
    assert!(json.contains(r#""url":"https://example.com""#));
}

#[test]
fn test_response_deserialization_success() {
    let json = r#"{"id":1,"result":{"value":42}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.id, 1);
    assert!(resp.result.is_some());
    assert!(resp.error.is_none());
}

#[test]
fn test_response_deserialization_error() {
    let json = r#"{"id":2,"error":{"code":-32601,"message":"Method not found"}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.id, 2);
    assert!(resp.result.is_none());
    let err = resp.error.unwrap();
    assert_eq!(err.code, -32601);
    assert_eq!(err.message, "Method not found");
}

#[test]
fn test_response_error_with_data() {
    let json = r#"{"id":4,"error":{"code":-32000,"message":"Error","data":{"hint":"more"}}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    let err = resp.error.unwrap();
    assert_eq!(err.data.unwrap()["hint"], "more");
}

#[test]
fn test_event_deserialization_simple() {
    let json = r#"{"method":"Page.loadEventFired","params":{"timestamp":12345.6}}"#;
    let evt: CdpEvent = serde_json::from_str(json).unwrap();
    assert_eq!(evt.method, "Page.loadEventFired");
    assert!(evt.params.is_some());
}

#[test]
fn test_event_without_params_yields_empty_object() {
    let json = r#"{"method":"Target.targetCrashed"}"#;
    let evt: CdpEvent = serde_json::from_str(json).unwrap();
    assert!(evt.params.is_none());
    assert_eq!(evt.params_or_empty(), serde_json::json!({}));
}

#[test]
fn test_message_parses_as_response() {
    let json = r#"{"id":1,"result":{"success":true}}"#;
    let msg: CdpMessage = serde_json::from_str(json).unwrap();
    assert!(matches!(msg, CdpMessage::Response(_)));
    assert!(msg.is_response_for(1));
    assert!(!msg.is_response_for(2));
}

#[test]
fn test_message_parses_as_event() {
    let json = r#"{"method":"Page.frameNavigated","params":{}}"#;
    let msg: CdpMessage = serde_json::from_str(json).unwrap();
    assert!(matches!(msg, CdpMessage::Event(_)));
    assert!(!msg.is_response_for(1));
}

#[test]
fn test_message_into_response() {
    let json = r#"{"id":10,"result":null}"#;
    let msg: CdpMessage = serde_json::from_str(json).unwrap();
    let resp = msg.into_response();
    assert!(resp.is_some());
    assert_eq!(resp.unwrap().id, 10);
}

#[test]
fn test_message_into_event() {
    let json = r#"{"method":"Runtime.consoleAPICalled","params":{}}"#;
    let msg: CdpMessage = serde_json::from_str(json).unwrap();
    let evt = msg.into_event();
    assert!(evt.is_some());
    assert_eq!(evt.unwrap().method, "Runtime.consoleAPICalled");
}

#[test]
fn test_message_error_response_discriminates() {
    // A frame with an error object and no result must still parse as a response.
    let json = r#"{"id":7,"error":{"code":-32000,"message":"boom"}}"#;
    let msg: CdpMessage = serde_json::from_str(json).unwrap();
    assert!(msg.is_response_for(7));
}

#[test]
fn test_event_with_complex_params() {
    let json = r#"{
        "method": "Network.responseReceived",
        "params": {
            "requestId": "123",
            "response": {
                "url": "https://example.com",
                "status": 200,
                "headers": {"content-type": "text/html"}
            }
        }
    }"#;
    let evt: CdpEvent = serde_json::from_str(json).unwrap();
    let params = evt.params.unwrap();
    assert_eq!(params["requestId"], "123");
    assert_eq!(params["response"]["status"], 200);
}
