//! Canopy Engine - Adaptive context weighting and runtime
//!
//! This crate is what consumers talk to. It owns one instance of
//! everything stateful — the dependency graph, the temporal engine,
//! the access ledger — and combines them into a single relevance score
//! per node and a ranked, size-bounded `SemanticContext` per file.
//!
//! # Runtime model
//!
//! All mutable state lives inside a `ContextEngine` owned by a single
//! consumer task. External sources (editor events, history import,
//! queries) push typed `EngineMessage`s through an `EngineHandle`;
//! nothing mutates the engine from outside. Ingestion is debounced:
//! changed paths collect in a pending set and are analyzed in batches,
//! and paths queued while a batch is being processed drain in the
//! follow-up pass, so no update is ever lost.
//!
//! The `ContextEngine` itself is a plain synchronous struct and can be
//! embedded directly when an async runtime is unwanted (tests do this).

mod actor;
mod config;
mod engine;
mod ledger;
mod scheduler;
mod store;
mod weighting;

pub use actor::{EngineError, EngineHandle, EngineMessage};
pub use config::EngineConfig;
pub use engine::{ContextEngine, EngineStats};
pub use ledger::AccessLedger;
pub use scheduler::DebouncedBatch;
pub use store::{MemoryStore, SledStore};
pub use weighting::{RelevanceWeights, WeightingEngine};
