//! Sentinel removal and structural validation.

use petgraph::algo::is_cyclic_directed;

use crate::model::TaskGraph;

/// What the sanitizer did and found. The acyclicity flag is advisory; a
/// cyclic graph points at an instrumentation bug upstream, and the artifact
/// is still worth emitting to debug exactly that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeReport {
    pub removed_sentinels: usize,
    pub acyclic: bool,
}

/// Remove every sentinel node (`vertex_id == 0`) together with its incident
/// edges, then validate that the remainder is a DAG.
///
/// Removal is atomic per node: `StableDiGraph::remove_node` drops the
/// incident edges in the same step, so no dangling edges can survive. Nodes
/// without a `vertex_id` attribute are never removed.
pub fn sanitize(graph: &mut TaskGraph) -> SanitizeReport {
    let sentinels: Vec<_> = graph
        .node_indices()
        .filter(|&ix| graph[ix].is_sentinel())
        .collect();

    for ix in &sentinels {
        graph.remove_node(*ix);
    }

    let acyclic = !is_cyclic_directed(&*graph);
    if acyclic {
        tracing::info!(
            removed = sentinels.len(),
            "Sanitized graph is a directed acyclic graph"
        );
    } else {
        tracing::warn!(
            removed = sentinels.len(),
            "Sanitized graph contains a directed cycle; the trace writer likely misbehaved"
        );
    }

    SanitizeReport {
        removed_sentinels: sentinels.len(),
        acyclic,
    }
}

#[cfg(test)]
mod test {
    use serde_json::Value;

    use super::*;
    use crate::model::{DependencyEdge, TaskNode, VERTEX_ID};

    fn node(id: &str, vertex_id: Option<i64>) -> TaskNode {
        let mut node = TaskNode::new(id);
        if let Some(v) = vertex_id {
            node.attrs.insert(VERTEX_ID.into(), Value::from(v));
        }
        node
    }

    #[test]
    fn removes_sentinels_and_incident_edges() {
        let mut graph = TaskGraph::default();
        let n0 = graph.add_node(node("n0", Some(0)));
        let n1 = graph.add_node(node("n1", Some(1)));
        let n2 = graph.add_node(node("n2", Some(2)));
        let n3 = graph.add_node(node("n3", Some(3)));
        graph.add_edge(n1, n2, DependencyEdge::new());
        graph.add_edge(n2, n3, DependencyEdge::new());
        graph.add_edge(n0, n1, DependencyEdge::new());

        let report = sanitize(&mut graph);

        assert_eq!(report.removed_sentinels, 1);
        assert!(report.acyclic);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.node_weights().all(|n| !n.is_sentinel()));
    }

    #[test]
    fn nodes_without_vertex_id_survive() {
        let mut graph = TaskGraph::default();
        graph.add_node(node("n0", None));
        graph.add_node(node("n1", Some(0)));

        let report = sanitize(&mut graph);

        assert_eq!(report.removed_sentinels, 1);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node_weights().next().map(|n| n.id.as_str()), Some("n0"));
    }

    #[test]
    fn cycle_is_reported_not_fatal() {
        let mut graph = TaskGraph::default();
        let a = graph.add_node(node("a", Some(1)));
        let b = graph.add_node(node("b", Some(2)));
        graph.add_edge(a, b, DependencyEdge::new());
        graph.add_edge(b, a, DependencyEdge::new());

        let report = sanitize(&mut graph);

        assert!(!report.acyclic);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn sentinel_removal_cannot_introduce_a_cycle() {
        let mut graph = TaskGraph::default();
        let s = graph.add_node(node("s", Some(0)));
        let a = graph.add_node(node("a", Some(1)));
        let b = graph.add_node(node("b", Some(2)));
        graph.add_edge(a, s, DependencyEdge::new());
        graph.add_edge(s, b, DependencyEdge::new());
        graph.add_edge(a, b, DependencyEdge::new());

        let report = sanitize(&mut graph);
        assert!(report.acyclic);
    }
}
