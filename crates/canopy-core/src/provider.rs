//! Traits for Canopy's external collaborators.
//!
//! Parsing, version control, and persistence are someone else's job.
//! Canopy consumes parsed facts and commit logs through these traits
//! and emits ranked facts; swap in any implementation that honors the
//! contracts.

use crate::error::ProviderResult;
use crate::{DependencyEdge, DependencyNode, ModificationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parsed facts for one file: the entities it defines and the
/// relations the analyzer could see from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub nodes: Vec<DependencyNode>,
    pub edges: Vec<DependencyEdge>,
}

impl FileAnalysis {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Produces parsed facts for a file on demand.
pub trait AnalysisProvider: Send {
    /// Analyzes `path` and returns its nodes and edges.
    ///
    /// A file that no longer exists should yield an empty analysis,
    /// not an error.
    fn analyze(&self, path: &str) -> ProviderResult<FileAnalysis>;
}

/// An analysis provider that knows nothing.
///
/// With this provider every unanalyzed file falls back to the graph's
/// synthesized placeholder node. Useful for tests and for consumers
/// that push analysis in themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnalysisProvider;

impl AnalysisProvider for NullAnalysisProvider {
    fn analyze(&self, _path: &str) -> ProviderResult<FileAnalysis> {
        Ok(FileAnalysis::default())
    }
}

/// Per-file status within a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
}

impl From<FileStatus> for ModificationKind {
    fn from(status: FileStatus) -> Self {
        match status {
            FileStatus::Added => ModificationKind::Created,
            FileStatus::Modified => ModificationKind::Updated,
            FileStatus::Deleted => ModificationKind::Deleted,
        }
    }
}

/// One changed file in a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitFile {
    pub path: String,
    pub status: FileStatus,
}

/// A version-control commit with its changed files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub files: Vec<CommitFile>,
}

/// Reads commit history from a version-control system.
pub trait ChangeLogSource: Send {
    /// All commits newer than `since`, most recent first.
    fn commits_since(&self, since: DateTime<Utc>) -> ProviderResult<Vec<Commit>>;

    /// The last `limit` commits that touched `path`, most recent first.
    fn recent_commits_touching(&self, path: &str, limit: usize) -> ProviderResult<Vec<Commit>>;
}

/// Opaque key → JSON value persistence.
///
/// Canopy stores small snapshots (the access ledger) through this
/// interface at startup, on a debounce after changes, and at shutdown.
pub trait ContextStore: Send {
    fn load(&self, key: &str) -> ProviderResult<Option<serde_json::Value>>;
    fn save(&self, key: &str, value: &serde_json::Value) -> ProviderResult<()>;
}
