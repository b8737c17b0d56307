//! Node types for the dependency graph.
//!
//! A node is any code entity worth tracking: a file, a class, a
//! function. Identity is the string `id`; everything else is payload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kind of code entity a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A source file as a whole.
    File,

    /// A module or namespace.
    Module,

    /// A class or struct definition.
    Class,

    /// An interface or trait.
    Interface,

    /// A free function.
    Function,

    /// A method bound to a class.
    Method,

    /// A property or field.
    Property,

    /// A variable or constant binding.
    Variable,

    /// An import statement.
    Import,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::File => "file",
            Self::Module => "module",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Function => "function",
            Self::Method => "method",
            Self::Property => "property",
            Self::Variable => "variable",
            Self::Import => "import",
        };
        write!(f, "{}", s)
    }
}

/// A code entity tracked by the dependency graph.
///
/// Relevance is never stored here — scores are transient per query and
/// reported through `ScoredNode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyNode {
    /// Unique identifier, stable across re-analysis of the same entity.
    pub id: String,

    /// What kind of entity this is.
    pub kind: NodeKind,

    /// Display name (e.g. "validateUser").
    pub name: String,

    /// Owning file, if the entity lives in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Source language, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// First line of the entity's span (1-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,

    /// Last line of the entity's span (1-based, inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,

    /// Open metadata bag for analyzer-specific extras.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl DependencyNode {
    /// Creates a new node.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: NodeKind,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            path: Some(path.into()),
            language: None,
            start_line: None,
            end_line: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Creates a bare file node for a path.
    ///
    /// This is the placeholder the graph synthesizes for files that
    /// were never analyzed, so queries on unseen files still resolve.
    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(path.as_str())
            .to_string();
        Self {
            id: path.clone(),
            kind: NodeKind::File,
            name,
            path: Some(path),
            language: None,
            start_line: None,
            end_line: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Sets the line span.
    pub fn with_span(mut self, start: u32, end: u32) -> Self {
        self.start_line = Some(start);
        self.end_line = Some(end);
        self
    }

    /// Sets the source language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Attaches a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the line span if both ends are known.
    pub fn span(&self) -> Option<(u32, u32)> {
        Some((self.start_line?, self.end_line?))
    }

    /// Whether the node's span overlaps the given inclusive line range.
    pub fn overlaps_lines(&self, start: u32, end: u32) -> bool {
        match self.span() {
            Some((s, e)) => s <= end && start <= e,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_placeholder_uses_path_as_id() {
        let node = DependencyNode::file("src/auth/login.ts");
        assert_eq!(node.id, "src/auth/login.ts");
        assert_eq!(node.name, "login.ts");
        assert_eq!(node.kind, NodeKind::File);
        assert_eq!(node.path.as_deref(), Some("src/auth/login.ts"));
    }

    #[test]
    fn test_span_requires_both_ends() {
        let mut node = DependencyNode::new("f", "f", NodeKind::Function, "a.rs");
        assert_eq!(node.span(), None);
        node.start_line = Some(3);
        assert_eq!(node.span(), None);
        node.end_line = Some(9);
        assert_eq!(node.span(), Some((3, 9)));
    }

    #[test]
    fn test_overlap() {
        let node = DependencyNode::new("f", "f", NodeKind::Function, "a.rs").with_span(10, 20);
        assert!(node.overlaps_lines(20, 25));
        assert!(node.overlaps_lines(1, 10));
        assert!(node.overlaps_lines(12, 14));
        assert!(!node.overlaps_lines(21, 30));
        assert!(!node.overlaps_lines(1, 9));
    }

    #[test]
    fn test_serde_round_trip() {
        let node = DependencyNode::new("a.rs::foo", "foo", NodeKind::Function, "a.rs")
            .with_span(1, 4)
            .with_language("rust");
        let json = serde_json::to_string(&node).unwrap();
        let back: DependencyNode = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }
}
