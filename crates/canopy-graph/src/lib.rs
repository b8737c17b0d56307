//! Canopy Graph - Dependency graph storage and structural queries
//!
//! This crate owns the node/edge store and answers the structural
//! questions the weighting engine asks: who is adjacent to whom, how
//! far apart two entities are, which entities are hubs.
//!
//! # Architecture
//!
//! The graph uses petgraph's `StableDiGraph` internally (stable indices
//! survive removals, which matters for incremental re-ingestion) with
//! additional indexes for:
//! - Id-based lookups
//! - File-based grouping (for replace-on-reanalysis updates)
//!
//! Ingestion has replace semantics: re-analyzing a file deletes every
//! node previously owned by that file before inserting the new set, and
//! any edge that loses an endpoint goes with it. Queries never observe
//! a dangling edge.
//!
//! # Example
//!
//! ```
//! use canopy_graph::DependencyGraph;
//! use canopy_core::{DependencyNode, DependencyEdge, EdgeKind, FileAnalysis, NodeKind};
//!
//! let mut graph = DependencyGraph::new();
//! graph.ingest_file_analysis("user.rs", FileAnalysis {
//!     nodes: vec![DependencyNode::new("user.rs::validate", "validate", NodeKind::Function, "user.rs")],
//!     edges: vec![],
//! });
//!
//! let nodes = graph.nodes_in_file("user.rs");
//! assert_eq!(nodes.len(), 1);
//! ```

mod centrality;
mod graph;
mod query;

pub use graph::{DependencyGraph, GraphStats, NodeId};
