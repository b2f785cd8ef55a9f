//! Default visualization attributes.

use crate::model::TaskGraph;

/// Reset every node to `active = true, hidden = false` and every edge to
/// `hidden = false`. The visualizer owns these flags afterwards; this step
/// only guarantees a known starting state. Total and idempotent.
pub fn annotate(graph: &mut TaskGraph) {
    for node in graph.node_weights_mut() {
        node.active = true;
        node.hidden = false;
    }
    for edge in graph.edge_weights_mut() {
        edge.hidden = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{DependencyEdge, TaskNode};

    #[test]
    fn sets_defaults_everywhere() {
        let mut graph = TaskGraph::default();
        let mut tainted = TaskNode::new("n1");
        tainted.active = false;
        tainted.hidden = true;
        let a = graph.add_node(tainted);
        let b = graph.add_node(TaskNode::new("n2"));
        let mut edge = DependencyEdge::new();
        edge.hidden = true;
        graph.add_edge(a, b, edge);

        annotate(&mut graph);

        assert!(graph.node_weights().all(|n| n.active && !n.hidden));
        assert!(graph.edge_weights().all(|e| !e.hidden));
    }

    #[test]
    fn idempotent() {
        let mut graph = TaskGraph::default();
        let a = graph.add_node(TaskNode::new("n1"));
        let b = graph.add_node(TaskNode::new("n2"));
        graph.add_edge(a, b, DependencyEdge::new());

        annotate(&mut graph);
        let once: Vec<_> = graph.node_weights().cloned().collect();
        annotate(&mut graph);
        let twice: Vec<_> = graph.node_weights().cloned().collect();

        assert_eq!(once, twice);
    }
}
