//! Assembly of the final artifact.

use std::collections::HashSet;

use crate::model::{EnrichedArtifact, LinkRecord, NodeRecord, TargetRegion, TaskGraph};

/// Attach the parsed target regions to the annotated graph under one
/// top-level structure.
///
/// The region node identifiers are *not* validated against the graph here:
/// the two traces are captured by independent mechanisms and may legitimately
/// disagree on addressing. See [`consistency_warnings`] for the optional
/// advisory check.
pub fn merge(graph: &TaskGraph, target: Vec<TargetRegion>) -> EnrichedArtifact {
    let nodes = graph
        .node_indices()
        .map(|ix| {
            let node = &graph[ix];
            NodeRecord {
                attrs: node.attrs.clone(),
                active: node.active,
                hidden: node.hidden,
                id: node.id.clone(),
            }
        })
        .collect();

    let links = graph
        .edge_indices()
        .filter_map(|ix| {
            let (s, t) = graph.edge_endpoints(ix)?;
            let edge = &graph[ix];
            Some(LinkRecord {
                source: graph[s].id.clone(),
                target: graph[t].id.clone(),
                attrs: edge.attrs.clone(),
                hidden: edge.hidden,
            })
        })
        .collect();

    EnrichedArtifact {
        nodes,
        links,
        target,
    }
}

/// Report region boundary identifiers that do not name any graph node.
///
/// Purely advisory; a mismatch usually means the two traces used different
/// addressing, which the visualizer tolerates.
pub fn consistency_warnings(artifact: &EnrichedArtifact) -> Vec<String> {
    let known: HashSet<&str> = artifact.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut warnings = Vec::new();

    for (index, region) in artifact.target.iter().enumerate() {
        for (role, id) in [("begin_node", &region.begin_node), ("end_node", &region.end_node)] {
            if !known.contains(id.as_str()) {
                warnings.push(format!(
                    "target region {index}: {role} '{id}' does not match any graph node"
                ));
            }
        }
    }

    warnings
}
