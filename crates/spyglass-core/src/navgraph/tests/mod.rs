use super::*;

fn link(ref_: &str, label: &str, to: &str) -> LinkEdge {
    LinkEdge {
        aff_ref: Some(ref_.to_string()),
        label: Some(label.to_string()),
        to: to.to_string(),
    }
}

#[test]
fn test_observation_redacts_urls() {
    let mut graph = NavGraph::default();
    let summary = graph.observe(
        "https://example.com/a?token=1#frag",
        Some("A"),
        &[link("aff:1", "Docs", "https://example.com/docs?x=1")],
    );
    assert_eq!(summary.nodes, 2);
    assert_eq!(summary.edges, 1);

    let view = graph.view(10, 20);
    assert!(view.nodes.iter().any(|n| n.url == "https://example.com/a"));
    assert!(view.nodes.iter().any(|n| n.url == "https://example.com/docs"));
    for node in &view.nodes {
        assert!(!node.url.contains('?'));
        assert!(!node.url.contains('#'));
        assert!(!node.url.contains("token"));
    }

    let link_edges: Vec<_> = view.edges.iter().filter(|e| e.kind == EdgeKind::Link).collect();
    assert_eq!(link_edges.len(), 1);
    assert_eq!(link_edges[0].aff_ref.as_deref(), Some("aff:1"));
    assert_eq!(link_edges[0].label.as_deref(), Some("Docs"));
}

#[test]
fn test_nav_edge_between_visits() {
    let mut graph = NavGraph::default();
    graph.observe("https://example.com/", Some("Home"), &[]);
    graph.observe("https://example.com/pricing", Some("Pricing"), &[]);

    let view = graph.view(10, 20);
    assert_eq!(view.current.as_deref(), Some("https://example.com/pricing"));
    let nav_edges: Vec<_> = view.edges.iter().filter(|e| e.kind == EdgeKind::Nav).collect();
    assert_eq!(nav_edges.len(), 1);

    // Revisiting the same page adds no self-edge and bumps visits.
    graph.observe("https://example.com/pricing", None, &[]);
    let view = graph.view(10, 20);
    assert_eq!(view.edges.iter().filter(|e| e.kind == EdgeKind::Nav).count(), 1);
    let pricing = view
        .nodes
        .iter()
        .find(|n| n.url == "https://example.com/pricing")
        .unwrap();
    assert_eq!(pricing.visits, 2);
    assert_eq!(pricing.title.as_deref(), Some("Pricing"));
}

#[test]
fn test_repeated_transition_bumps_edge_count() {
    let mut graph = NavGraph::default();
    graph.observe("https://example.com/a", None, &[]);
    graph.observe("https://example.com/b", None, &[]);
    graph.observe("https://example.com/a", None, &[]);
    graph.observe("https://example.com/b", None, &[]);

    let view = graph.view(10, 20);
    let ab = view
        .edges
        .iter()
        .find(|e| e.kind == EdgeKind::Nav && e.count == 2)
        .expect("a->b observed twice");
    assert_eq!(ab.count, 2);
}

#[test]
fn test_linked_pages_start_with_zero_visits() {
    let mut graph = NavGraph::default();
    graph.observe(
        "https://example.com/",
        None,
        &[link("aff:1", "Docs", "https://example.com/docs")],
    );
    let view = graph.view(10, 20);
    let docs = view
        .nodes
        .iter()
        .find(|n| n.url == "https://example.com/docs")
        .unwrap();
    assert_eq!(docs.visits, 0);
}

#[test]
fn test_node_pruning_drops_oldest_and_their_edges() {
    let mut graph = NavGraph::default();
    for i in 0..200 {
        graph.observe(&format!("https://example.com/page{i}"), None, &[]);
    }
    let view = graph.view(500, 1000);
    assert!(view.summary.nodes <= 120);
    assert!(view.summary.edges <= 360);
    // The earliest page is gone, the latest survives.
    assert!(!view.nodes.iter().any(|n| n.url == "https://example.com/page0"));
    assert!(view.nodes.iter().any(|n| n.url == "https://example.com/page199"));
    // No dangling edges survive pruning.
    for edge in &view.edges {
        assert!(graph.view(500, 1000).nodes.iter().any(|n| n.id == edge.from));
        assert!(graph.view(500, 1000).nodes.iter().any(|n| n.id == edge.to));
    }
}

#[test]
fn test_view_limits_and_order() {
    let mut graph = NavGraph::default();
    for i in 0..10 {
        graph.observe(&format!("https://example.com/p{i}"), None, &[]);
    }
    let view = graph.view(3, 2);
    assert_eq!(view.nodes.len(), 3);
    assert_eq!(view.edges.len(), 2);
    // Most recently seen first.
    assert_eq!(view.nodes[0].url, "https://example.com/p9");
    // Summary still reports the full graph.
    assert_eq!(view.summary.nodes, 10);
}

#[test]
fn test_view_serializes_ref_field_name() {
    let mut graph = NavGraph::default();
    graph.observe(
        "https://example.com/",
        None,
        &[link("aff:abc", "Docs", "https://example.com/docs")],
    );
    let value = serde_json::to_value(graph.view(10, 10)).unwrap();
    let edges = value["edges"].as_array().unwrap();
    let link_edge = edges.iter().find(|e| e["kind"] == "link").unwrap();
    assert_eq!(link_edge["ref"], "aff:abc");
    assert!(link_edge.get("lastSeen").is_none());
}
