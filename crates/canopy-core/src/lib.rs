//! Canopy Core - Shared data model for the Canopy context engine
//!
//! This crate defines the vocabulary the rest of Canopy speaks: code
//! entities and their relations, file modification events, mined
//! change patterns, and the ranked context handed to consumers.
//!
//! It also declares the traits for everything Canopy treats as an
//! external collaborator — the analyzer that produces parsed facts,
//! the version-control log, and the persistence store. Canopy never
//! parses source or talks to a network itself; any implementation of
//! these traits can be plugged in.

mod context;
mod edge;
mod error;
mod event;
mod node;
mod pattern;
mod provider;

pub use context::{FileSuggestion, ScoredNode, SemanticContext};
pub use edge::{DependencyEdge, EdgeKind};
pub use error::{ProviderError, ProviderResult};
pub use event::{ModificationEvent, ModificationKind};
pub use node::{DependencyNode, NodeKind};
pub use pattern::{ModificationPattern, PatternKind};
pub use provider::{
    AnalysisProvider, ChangeLogSource, Commit, CommitFile, ContextStore, FileAnalysis, FileStatus,
    NullAnalysisProvider,
};
