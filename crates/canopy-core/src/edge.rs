//! Edge types for the dependency graph.
//!
//! Edges relate two nodes by id. They carry no identity of their own:
//! an edge is only meaningful while both endpoints exist, and the graph
//! prunes it the moment either side goes away.

use serde::{Deserialize, Serialize};

/// The type of relationship between two code entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Module A imports from module B.
    Imports,

    /// Function A calls function B.
    Calls,

    /// Class A extends class B.
    Extends,

    /// Class implements interface/trait.
    Implements,

    /// General reference to a symbol.
    References,

    /// Container relationship (file contains function).
    Contains,

    /// Type or value usage.
    Uses,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Imports => "imports",
            Self::Calls => "calls",
            Self::Extends => "extends",
            Self::Implements => "implements",
            Self::References => "references",
            Self::Contains => "contains",
            Self::Uses => "uses",
        };
        write!(f, "{}", s)
    }
}

/// A directed relation between two nodes, by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl DependencyEdge {
    /// Creates a new edge.
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    /// Whether the edge touches the given node id on either end.
    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}
