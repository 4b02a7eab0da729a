use super::*;

#[test]
fn test_get_targets_result() {
    let json = r#"{
        "targetInfos": [
            {"targetId": "T1", "type": "page", "title": "Example", "url": "https://example.com", "attached": false},
            {"targetId": "T2", "type": "service_worker", "url": "https://example.com/sw.js"}
        ]
    }"#;
    let result: GetTargetsResult = serde_json::from_str(json).unwrap();
    assert_eq!(result.target_infos.len(), 2);
    assert_eq!(result.target_infos[0].target_type, "page");
    assert!(!result.target_infos[1].attached);
}

#[test]
fn test_create_target_params() {
    let params = CreateTargetParams {
        url: "about:blank".to_string(),
        background: Some(true),
    };
    let json = serde_json::to_value(&params).unwrap();
    assert_eq!(json["url"], "about:blank");
    assert_eq!(json["background"], true);
}

#[test]
fn test_close_target_result() {
    let json = r#"{"success": true}"#;
    let result: CloseTargetResult = serde_json::from_str(json).unwrap();
    assert!(result.success);
}
