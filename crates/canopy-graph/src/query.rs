//! Structural queries: neighborhoods, paths, components.
//!
//! All traversals here view the graph as undirected. Edge kinds do
//! suggest a direction, but for proximity purposes "A imports B" and
//! "B is imported by A" put the two entities equally close together.
//! Unknown ids yield empty results, never errors.

use crate::graph::{DependencyGraph, NodeId};
use canopy_core::DependencyNode;
use std::collections::{HashMap, HashSet, VecDeque};

impl DependencyGraph {
    /// Direct neighbors of a node, one hop in either edge direction.
    ///
    /// Results are deduplicated (parallel edges count once) and sorted
    /// by id for deterministic output.
    pub fn related_nodes(&self, id: &str) -> Vec<&DependencyNode> {
        let Some(index) = self.index_of(id) else {
            return Vec::new();
        };

        let neighbors: HashSet<NodeId> = self.graph.neighbors_undirected(index).collect();
        let mut nodes: Vec<&DependencyNode> = neighbors
            .into_iter()
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Breadth-first shortest path between two nodes over the
    /// undirected view.
    ///
    /// Returns the ordered id path including both endpoints, or `None`
    /// when either id is unknown or no path exists.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let start = self.index_of(from)?;
        let goal = self.index_of(to)?;

        if start == goal {
            return Some(vec![from.to_string()]);
        }

        let mut predecessor: HashMap<NodeId, NodeId> = HashMap::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();

        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.graph.neighbors_undirected(current) {
                if !visited.insert(neighbor) {
                    continue;
                }
                predecessor.insert(neighbor, current);
                if neighbor == goal {
                    return Some(self.reconstruct_path(&predecessor, start, goal));
                }
                queue.push_back(neighbor);
            }
        }

        None
    }

    fn reconstruct_path(
        &self,
        predecessor: &HashMap<NodeId, NodeId>,
        start: NodeId,
        goal: NodeId,
    ) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = goal;
        loop {
            if let Some(node) = self.graph.node_weight(current) {
                path.push(node.id.clone());
            }
            if current == start {
                break;
            }
            current = predecessor[&current];
        }
        path.reverse();
        path
    }

    /// Partitions all nodes into maximal connected sets.
    ///
    /// Components are sorted internally by id and ordered by their
    /// first id, so the output is stable across runs.
    pub fn connected_components(&self) -> Vec<Vec<String>> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut components = Vec::new();

        for start in self.graph.node_indices() {
            if visited.contains(&start) {
                continue;
            }

            let mut component = Vec::new();
            let mut stack = vec![start];
            visited.insert(start);

            while let Some(current) = stack.pop() {
                if let Some(node) = self.graph.node_weight(current) {
                    component.push(node.id.clone());
                }
                for neighbor in self.graph.neighbors_undirected(current) {
                    if visited.insert(neighbor) {
                        stack.push(neighbor);
                    }
                }
            }

            component.sort();
            components.push(component);
        }

        components.sort_by(|a, b| a.first().cmp(&b.first()));
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::{DependencyEdge, DependencyNode, EdgeKind, FileAnalysis, NodeKind};

    fn chain_graph() -> DependencyGraph {
        // A — B — C, with the B→C edge pointing "backwards" to prove
        // traversal ignores direction.
        let mut graph = DependencyGraph::new();
        graph.ingest_file_analysis(
            "chain.ts",
            FileAnalysis {
                nodes: vec![
                    DependencyNode::new("A", "A", NodeKind::Function, "chain.ts"),
                    DependencyNode::new("B", "B", NodeKind::Function, "chain.ts"),
                    DependencyNode::new("C", "C", NodeKind::Function, "chain.ts"),
                ],
                edges: vec![
                    DependencyEdge::new("A", "B", EdgeKind::Calls),
                    DependencyEdge::new("C", "B", EdgeKind::Calls),
                ],
            },
        );
        graph
    }

    #[test]
    fn test_shortest_path_on_chain() {
        let graph = chain_graph();
        assert_eq!(
            graph.shortest_path("A", "C"),
            Some(vec!["A".to_string(), "B".to_string(), "C".to_string()])
        );
    }

    #[test]
    fn test_shortest_path_unknown_target() {
        let graph = chain_graph();
        assert_eq!(graph.shortest_path("A", "D"), None);
    }

    #[test]
    fn test_shortest_path_unreachable() {
        let mut graph = chain_graph();
        graph.ingest_file_analysis(
            "island.ts",
            FileAnalysis {
                nodes: vec![DependencyNode::new("X", "X", NodeKind::Function, "island.ts")],
                edges: vec![],
            },
        );
        assert_eq!(graph.shortest_path("A", "X"), None);
    }

    #[test]
    fn test_shortest_path_to_self() {
        let graph = chain_graph();
        assert_eq!(graph.shortest_path("B", "B"), Some(vec!["B".to_string()]));
    }

    #[test]
    fn test_related_nodes_one_hop_both_directions() {
        let graph = chain_graph();
        let related: Vec<&str> = graph
            .related_nodes("B")
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(related, vec!["A", "C"]);
        assert!(graph.related_nodes("nope").is_empty());
    }

    #[test]
    fn test_connected_components() {
        let mut graph = chain_graph();
        graph.ingest_file_analysis(
            "island.ts",
            FileAnalysis {
                nodes: vec![DependencyNode::new("X", "X", NodeKind::Function, "island.ts")],
                edges: vec![],
            },
        );
        let components = graph.connected_components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0], vec!["A", "B", "C"]);
        assert_eq!(components[1], vec!["X"]);
    }
}
