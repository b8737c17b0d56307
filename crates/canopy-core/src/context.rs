//! Ranked context output types.

use crate::{DependencyEdge, DependencyNode, ModificationEvent, ModificationPattern};
use serde::{Deserialize, Serialize};

/// A node annotated with its relevance to the focal file.
///
/// Scores are transient: they are computed per query and are only
/// meaningful relative to the query's focal file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredNode {
    pub node: DependencyNode,
    pub relevance: f64,
}

/// The ranked, size-bounded context for a focal file.
///
/// This is what downstream consumers receive: the highest-relevance
/// nodes, the edges among them, the change patterns the focal file
/// participates in, and its most recent modifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticContext {
    /// The file this context was computed for.
    pub focal_path: String,

    /// Ranked nodes, focal file first at relevance 1.0.
    pub relevant_nodes: Vec<ScoredNode>,

    /// Edges whose endpoints are both in `relevant_nodes`.
    pub relevant_edges: Vec<DependencyEdge>,

    /// Patterns involving the focal file.
    pub modification_patterns: Vec<ModificationPattern>,

    /// The focal file's most recent modification events.
    pub recent_modifications: Vec<ModificationEvent>,
}

impl SemanticContext {
    /// An empty context for a path, used when nothing is known yet.
    pub fn empty(focal_path: impl Into<String>) -> Self {
        Self {
            focal_path: focal_path.into(),
            relevant_nodes: Vec::new(),
            relevant_edges: Vec::new(),
            modification_patterns: Vec::new(),
            recent_modifications: Vec::new(),
        }
    }
}

/// A related-file recommendation with a blended relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSuggestion {
    pub file: String,
    pub relevance: f64,
}

impl FileSuggestion {
    pub fn new(file: impl Into<String>, relevance: f64) -> Self {
        Self {
            file: file.into(),
            relevance,
        }
    }
}
