use super::*;

#[test]
fn test_ax_node_role_and_name() {
    let json = r#"{
        "nodeId": "7",
        "ignored": false,
        "role": {"type": "role", "value": "button"},
        "name": {"type": "computedString", "value": "Save"},
        "backendDOMNodeId": 42
    }"#;
    let node: AxNode = serde_json::from_str(json).unwrap();
    assert_eq!(node.role_str(), Some("button"));
    assert_eq!(node.name_str(), Some("Save"));
}

#[test]
fn test_ax_node_bool_property_variants() {
    let json = r#"{
        "nodeId": "1",
        "properties": [
            {"name": "disabled", "value": {"type": "boolean", "value": true}},
            {"name": "focusable", "value": {"type": "booleanOrUndefined", "value": "false"}}
        ]
    }"#;
    let node: AxNode = serde_json::from_str(json).unwrap();
    assert_eq!(node.bool_property("disabled"), Some(true));
    assert_eq!(node.bool_property("focusable"), Some(false));
    assert_eq!(node.bool_property("hidden"), None);
}

#[test]
fn test_full_ax_tree_result() {
    let json = r#"{"nodes": [{"nodeId": "1"}, {"nodeId": "2", "ignored": true}]}"#;
    let result: GetFullAxTreeResult = serde_json::from_str(json).unwrap();
    assert_eq!(result.nodes.len(), 2);
    assert!(result.nodes[1].ignored);
}
