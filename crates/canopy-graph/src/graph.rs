//! Core graph data structure.
//!
//! The DependencyGraph wraps petgraph and adds indexes for fast
//! lookups. Mutation goes through `ingest_file_analysis` / `remove_file`;
//! both maintain the invariant that every stored edge has two live
//! endpoints.

use canopy_core::{DependencyEdge, DependencyNode, EdgeKind, FileAnalysis};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Unique identifier for a node in the graph.
pub type NodeId = NodeIndex;

/// The code dependency graph.
///
/// Stores all code entities as nodes and their relationships as edges,
/// with indexes for id and file lookups. Node identity is the string
/// id; the file index groups nodes by owning path so a re-analysis can
/// replace exactly that file's slice of the graph.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// The underlying petgraph graph. Edge weights are the relation kind.
    pub(crate) graph: StableDiGraph<DependencyNode, EdgeKind>,

    /// Maps string ids to graph node indexes.
    pub(crate) id_index: HashMap<String, NodeId>,

    /// Maps file paths to the nodes that file owns.
    pub(crate) file_index: HashMap<String, Vec<NodeId>>,
}

impl DependencyGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a file's slice of the graph with a fresh analysis.
    ///
    /// Every node previously owned by `path` is deleted first, along
    /// with its incident edges, then the new nodes and edges go in.
    /// Edges whose endpoints are not present after insertion are
    /// dropped, never stored.
    pub fn ingest_file_analysis(&mut self, path: &str, analysis: FileAnalysis) {
        self.remove_file(path);

        for node in analysis.nodes {
            self.insert_node(node);
        }

        let mut dropped = 0usize;
        for edge in &analysis.edges {
            if !self.insert_edge(edge) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!(path, dropped, "dropped edges with missing endpoints");
        }
    }

    /// Removes all nodes owned by a file.
    ///
    /// petgraph removes incident edges together with each node, so no
    /// dangling edge can survive this.
    pub fn remove_file(&mut self, path: &str) {
        let Some(indexes) = self.file_index.remove(path) else {
            return;
        };
        for index in indexes {
            if let Some(node) = self.graph.remove_node(index) {
                self.id_index.remove(&node.id);
            }
        }
        debug!(path, "removed file from graph");
    }

    /// Inserts one node, replacing any existing node with the same id.
    pub(crate) fn insert_node(&mut self, node: DependencyNode) -> NodeId {
        if let Some(&existing) = self.id_index.get(&node.id) {
            // Same identity: swap the payload in place and fix the file
            // index if the node moved between files.
            let old_path = self
                .graph
                .node_weight(existing)
                .and_then(|n| n.path.clone());
            if old_path != node.path {
                if let Some(old) = old_path {
                    if let Some(list) = self.file_index.get_mut(&old) {
                        list.retain(|&idx| idx != existing);
                    }
                }
                if let Some(new_path) = &node.path {
                    self.file_index
                        .entry(new_path.clone())
                        .or_default()
                        .push(existing);
                }
            }
            if let Some(weight) = self.graph.node_weight_mut(existing) {
                *weight = node;
            }
            return existing;
        }

        let id = node.id.clone();
        let path = node.path.clone();
        let index = self.graph.add_node(node);
        self.id_index.insert(id, index);
        if let Some(path) = path {
            self.file_index.entry(path).or_default().push(index);
        }
        index
    }

    /// Inserts an edge if both endpoints exist. Returns false otherwise.
    pub(crate) fn insert_edge(&mut self, edge: &DependencyEdge) -> bool {
        match (self.id_index.get(&edge.source), self.id_index.get(&edge.target)) {
            (Some(&from), Some(&to)) => {
                self.graph.add_edge(from, to, edge.kind);
                true
            }
            _ => false,
        }
    }

    /// Returns the nodes owned by a file, synthesizing a placeholder
    /// file node for paths that were never analyzed.
    ///
    /// The placeholder keeps downstream queries total: asking about an
    /// unseen file yields a minimal file entity rather than nothing.
    pub fn nodes_for_file(&mut self, path: &str) -> Vec<DependencyNode> {
        if self.nodes_in_file(path).is_empty() {
            debug!(path, "synthesizing placeholder file node");
            self.insert_node(DependencyNode::file(path));
        }
        self.nodes_in_file(path).into_iter().cloned().collect()
    }

    /// Returns the nodes owned by a file without synthesizing anything.
    pub fn nodes_in_file(&self, path: &str) -> Vec<&DependencyNode> {
        self.file_index
            .get(path)
            .map(|indexes| {
                indexes
                    .iter()
                    .filter_map(|idx| self.graph.node_weight(*idx))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Gets a node by its string id.
    pub fn get(&self, id: &str) -> Option<&DependencyNode> {
        let index = self.id_index.get(id)?;
        self.graph.node_weight(*index)
    }

    /// Gets the graph index for a string id.
    pub(crate) fn index_of(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    /// Whether a node with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterates over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode> {
        self.graph.node_weights()
    }

    /// All edges with endpoint ids resolved, for export and context
    /// assembly.
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.graph
            .edge_references()
            .filter_map(|edge_ref| {
                let source = self.graph.node_weight(edge_ref.source())?;
                let target = self.graph.node_weight(edge_ref.target())?;
                Some(DependencyEdge::new(
                    source.id.clone(),
                    target.id.clone(),
                    *edge_ref.weight(),
                ))
            })
            .collect()
    }

    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            files: self.file_index.len(),
        }
    }
}

/// Graph statistics for status output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub files: usize,
}
