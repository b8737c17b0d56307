//! Degree centrality.
//!
//! Degree (incident-edge count) stands in for dependency strength:
//! an entity referenced from many places matters to many places. One
//! pass over the edge set, O(E).

use crate::graph::DependencyGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::HashMap;

impl DependencyGraph {
    /// Incident-edge count per node id.
    ///
    /// Every node appears in the result, isolated nodes at 0.
    pub fn node_centrality(&self) -> HashMap<String, usize> {
        let mut degrees: HashMap<String, usize> = self
            .nodes()
            .map(|node| (node.id.clone(), 0))
            .collect();

        for edge_ref in self.graph.edge_references() {
            for endpoint in [edge_ref.source(), edge_ref.target()] {
                if let Some(node) = self.graph.node_weight(endpoint) {
                    if let Some(count) = degrees.get_mut(&node.id) {
                        *count += 1;
                    }
                }
            }
        }

        degrees
    }

    /// Degree of a single node; 0 for unknown ids.
    pub fn degree(&self, id: &str) -> usize {
        match self.index_of(id) {
            Some(index) => self.graph.edges_directed(index, petgraph::Direction::Outgoing).count()
                + self.graph.edges_directed(index, petgraph::Direction::Incoming).count(),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::{DependencyEdge, DependencyNode, EdgeKind, FileAnalysis, NodeKind};

    #[test]
    fn test_degree_counts_both_directions() {
        //   A → hub ← B, hub → C
        let mut graph = DependencyGraph::new();
        graph.ingest_file_analysis(
            "star.ts",
            FileAnalysis {
                nodes: vec![
                    DependencyNode::new("hub", "hub", NodeKind::Function, "star.ts"),
                    DependencyNode::new("A", "A", NodeKind::Function, "star.ts"),
                    DependencyNode::new("B", "B", NodeKind::Function, "star.ts"),
                    DependencyNode::new("C", "C", NodeKind::Function, "star.ts"),
                ],
                edges: vec![
                    DependencyEdge::new("A", "hub", EdgeKind::Calls),
                    DependencyEdge::new("B", "hub", EdgeKind::Calls),
                    DependencyEdge::new("hub", "C", EdgeKind::Calls),
                ],
            },
        );

        let centrality = graph.node_centrality();
        assert_eq!(centrality["hub"], 3);
        assert_eq!(centrality["A"], 1);
        assert_eq!(centrality["C"], 1);
        assert_eq!(graph.degree("hub"), 3);
        assert_eq!(graph.degree("ghost"), 0);
    }

    #[test]
    fn test_isolated_nodes_present_at_zero() {
        let mut graph = DependencyGraph::new();
        graph.ingest_file_analysis(
            "lone.ts",
            FileAnalysis {
                nodes: vec![DependencyNode::new("lone", "lone", NodeKind::Function, "lone.ts")],
                edges: vec![],
            },
        );
        let centrality = graph.node_centrality();
        assert_eq!(centrality["lone"], 0);
    }
}
