use super::*;

#[test]
fn test_get_document_result() {
    let json = r##"{
        "root": {
            "nodeId": 1,
            "backendNodeId": 2,
            "nodeType": 9,
            "nodeName": "#document",
            "documentUrl": "https://example.com/",
            "children": [
                {"nodeId": 3, "backendNodeId": 4, "nodeType": 1, "nodeName": "HTML",
                 "attributes": ["lang", "en"]}
            ]
        }
    }"##;
    let result: GetDocumentResult = serde_json::from_str(json).unwrap();
    assert_eq!(result.root.node_name, "#document");
    let html = &result.root.children.unwrap()[0];
    assert_eq!(html.attributes.as_ref().unwrap()[1], "en");
}

#[test]
fn test_box_model_content_center() {
    let model = BoxModel {
        content: vec![0.0, 0.0, 10.0, 0.0, 10.0, 20.0, 0.0, 20.0],
        border: vec![],
        width: 10.0,
        height: 20.0,
    };
    assert_eq!(model.content_center(), Some((5.0, 10.0)));
}

#[test]
fn test_box_model_degenerate_quad() {
    let model = BoxModel {
        content: vec![1.0, 2.0],
        border: vec![],
        width: 0.0,
        height: 0.0,
    };
    assert!(model.content_center().is_none());
}

#[test]
fn test_set_file_input_files_params() {
    let params = SetFileInputFilesParams {
        files: vec!["/tmp/a.txt".to_string()],
        node_id: None,
        backend_node_id: Some(42),
    };
    let json = serde_json::to_value(&params).unwrap();
    assert_eq!(json["backendNodeId"], 42);
    assert!(json.get("nodeId").is_none());
}
