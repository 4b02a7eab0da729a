//! Per-tab navigation graph: visited pages plus discovered link edges.
//!
//! This is a memory feature. It persists across tool calls within one
//! process, is bounded (oldest pruned on insert), and stores only redacted
//! URLs (query and fragment stripped) so exported views cannot leak
//! secrets.

use serde::Serialize;

use crate::safety::redact_url;
use crate::telemetry::now_ms;

/// Node cap; oldest-seen nodes are pruned first.
const MAX_NODES: usize = 120;
/// Edge cap; oldest edges are pruned first.
const MAX_EDGES: usize = 360;

/// A visited (or linked-to) page.
#[derive(Debug, Clone, Serialize)]
pub struct NavNode {
    /// Stable node id within this graph.
    pub id: String,
    /// Redacted URL.
    pub url: String,
    /// Last known title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Times this page was visited.
    pub visits: u32,
    #[serde(skip)]
    last_seen: u64,
}

/// Edge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// An observed navigation from one page to another.
    Nav,
    /// A link affordance discovered on the page.
    Link,
}

/// A transition or discovered link between two nodes.
#[derive(Debug, Clone, Serialize)]
pub struct NavEdge {
    /// Source node id.
    pub from: String,
    /// Destination node id.
    pub to: String,
    /// Edge kind.
    pub kind: EdgeKind,
    /// Link label, for link edges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Affordance ref that triggers this link.
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub aff_ref: Option<String>,
    /// Times this edge was observed.
    pub count: u32,
    #[serde(skip)]
    last_seen: u64,
}

/// A link affordance reported by a locator/map producer.
#[derive(Debug, Clone)]
pub struct LinkEdge {
    /// Affordance ref of the link.
    pub aff_ref: Option<String>,
    /// Visible label.
    pub label: Option<String>,
    /// Link target URL (redacted on insert).
    pub to: String,
}

/// Counts reported back to observers.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSummary {
    /// Node count after the observation.
    pub nodes: usize,
    /// Edge count after the observation.
    pub edges: usize,
}

/// A bounded view of the graph for export.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavGraphView {
    /// Totals before view bounding.
    pub summary: GraphSummary,
    /// Redacted URL of the current node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    /// Most recently seen nodes first.
    pub nodes: Vec<NavNode>,
    /// Most recently seen edges first.
    pub edges: Vec<NavEdge>,
    /// Last update, ms since epoch.
    pub updated_at: f64,
}

/// The per-tab graph.
#[derive(Debug, Default)]
pub struct NavGraph {
    nodes: Vec<NavNode>,
    edges: Vec<NavEdge>,
    current: Option<String>,
    clock: u64,
    next_node: u64,
    updated_at: f64,
}

impl NavGraph {
    /// Record a visit to `url`, an implicit nav edge from the previous
    /// current node, and any discovered link edges.
    pub fn observe(
        &mut self,
        url: &str,
        title: Option<&str>,
        link_edges: &[LinkEdge],
    ) -> GraphSummary {
        let redacted = redact_url(url);
        self.clock += 1;
        let tick = self.clock;

        let node_id = self.upsert_node(&redacted, title, tick, true);

        if let Some(prev) = self.current.clone()
            && prev != node_id
        {
            self.upsert_edge(&prev, &node_id, EdgeKind::Nav, None, None, tick);
        }
        self.current = Some(node_id.clone());

        for link in link_edges {
            let to_url = redact_url(&link.to);
            if to_url.is_empty() {
                continue;
            }
            let to_id = self.upsert_node(&to_url, None, tick, false);
            self.upsert_edge(
                &node_id,
                &to_id,
                EdgeKind::Link,
                link.label.clone(),
                link.aff_ref.clone(),
                tick,
            );
        }

        self.prune();
        self.updated_at = now_ms();
        GraphSummary {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
        }
    }

    fn upsert_node(&mut self, url: &str, title: Option<&str>, tick: u64, visit: bool) -> String {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.url == url) {
            node.last_seen = tick;
            if visit {
                node.visits += 1;
            }
            if let Some(title) = title.filter(|t| !t.is_empty()) {
                node.title = Some(title.to_string());
            }
            return node.id.clone();
        }
        self.next_node += 1;
        let id = format!("n{}", self.next_node);
        self.nodes.push(NavNode {
            id: id.clone(),
            url: url.to_string(),
            title: title.filter(|t| !t.is_empty()).map(ToString::to_string),
            visits: u32::from(visit),
            last_seen: tick,
        });
        id
    }

    fn upsert_edge(
        &mut self,
        from: &str,
        to: &str,
        kind: EdgeKind,
        label: Option<String>,
        aff_ref: Option<String>,
        tick: u64,
    ) {
        if let Some(edge) = self
            .edges
            .iter_mut()
            .find(|e| e.from == from && e.to == to && e.kind == kind)
        {
            edge.count += 1;
            edge.last_seen = tick;
            if label.is_some() {
                edge.label = label;
            }
            if aff_ref.is_some() {
                edge.aff_ref = aff_ref;
            }
            return;
        }
        self.edges.push(NavEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            label,
            aff_ref,
            count: 1,
            last_seen: tick,
        });
    }

    fn prune(&mut self) {
        while self.nodes.len() > MAX_NODES {
            let Some(oldest) = self
                .nodes
                .iter()
                .enumerate()
                .min_by_key(|(_, n)| n.last_seen)
                .map(|(i, _)| i)
            else {
                break;
            };
            let removed = self.nodes.remove(oldest);
            self.edges
                .retain(|e| e.from != removed.id && e.to != removed.id);
            if self.current.as_deref() == Some(&removed.id) {
                self.current = None;
            }
        }
        while self.edges.len() > MAX_EDGES {
            let Some(oldest) = self
                .edges
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.last_seen)
                .map(|(i, _)| i)
            else {
                break;
            };
            self.edges.remove(oldest);
        }
    }

    /// Whether anything was observed yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Export a bounded view, most recently seen first.
    pub fn view(&self, node_limit: usize, edge_limit: usize) -> NavGraphView {
        let mut nodes = self.nodes.clone();
        nodes.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        nodes.truncate(node_limit);

        let mut edges = self.edges.clone();
        edges.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        edges.truncate(edge_limit);

        let current = self
            .current
            .as_ref()
            .and_then(|id| self.nodes.iter().find(|n| &n.id == id))
            .map(|n| n.url.clone());

        NavGraphView {
            summary: GraphSummary {
                nodes: self.nodes.len(),
                edges: self.edges.len(),
            },
            current,
            nodes,
            edges,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests;
