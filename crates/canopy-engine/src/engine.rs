//! The context engine.
//!
//! One `ContextEngine` instance owns every piece of mutable state:
//! the dependency graph, the temporal engine, the access ledger and
//! the weighting configuration. There is no ambient global anywhere —
//! construct one per workspace and hand it to a single owner (usually
//! the actor in `actor.rs`, but embedding it directly works too).

use crate::config::EngineConfig;
use crate::ledger::AccessLedger;
use crate::weighting::WeightingEngine;
use canopy_core::{
    AnalysisProvider, ChangeLogSource, Commit, ContextStore, FileAnalysis, FileSuggestion,
    ModificationEvent, ModificationKind, ModificationPattern, SemanticContext,
};
use canopy_graph::DependencyGraph;
use canopy_temporal::TemporalEngine;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Store key under which the access ledger snapshot lives.
const LEDGER_KEY: &str = "access_ledger";

/// Store key under which the graph snapshot lives.
const GRAPH_KEY: &str = "dependency_graph";

/// Aggregate counters for status output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub nodes: usize,
    pub edges: usize,
    pub files: usize,
    pub patterns: usize,
    pub tracked_files: usize,
}

/// Owns the graph, the temporal engine and the access ledger, and
/// serves ranked context queries over them.
pub struct ContextEngine {
    config: EngineConfig,
    graph: DependencyGraph,
    temporal: TemporalEngine,
    ledger: AccessLedger,
    weighting: WeightingEngine,
    analyzer: Box<dyn AnalysisProvider>,
    change_log: Option<Arc<dyn ChangeLogSource + Send + Sync>>,
    store: Option<Arc<dyn ContextStore + Send + Sync>>,
    ledger_dirty: bool,
    graph_dirty: bool,
}

impl ContextEngine {
    pub fn new(config: EngineConfig, analyzer: Box<dyn AnalysisProvider>) -> Self {
        let weighting = WeightingEngine::new(
            config.weights,
            config.max_context_nodes,
            config.recent_modifications,
        );
        Self {
            config,
            graph: DependencyGraph::new(),
            temporal: TemporalEngine::new(),
            ledger: AccessLedger::new(),
            weighting,
            analyzer,
            change_log: None,
            store: None,
            ledger_dirty: false,
            graph_dirty: false,
        }
    }

    /// Attaches a version-control log source.
    pub fn with_change_log(mut self, source: Arc<dyn ChangeLogSource + Send + Sync>) -> Self {
        self.change_log = Some(source);
        self
    }

    /// Attaches a persistence store.
    pub fn with_store(mut self, store: Arc<dyn ContextStore + Send + Sync>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Restores the access ledger and graph snapshot from the store,
    /// if both exist. Failures are logged and leave state empty.
    pub fn load_persisted(&mut self) {
        let Some(store) = &self.store else { return };
        match store.load(LEDGER_KEY) {
            Ok(Some(value)) => match serde_json::from_value::<AccessLedger>(value) {
                Ok(ledger) => {
                    info!("restored access ledger from store");
                    self.ledger = ledger;
                }
                Err(err) => warn!(%err, "stored ledger is unreadable, starting fresh"),
            },
            Ok(None) => {}
            Err(err) => warn!(%err, "could not read store, starting fresh"),
        }
        match store.load(GRAPH_KEY) {
            Ok(Some(value)) => match serde_json::from_value::<DependencyGraph>(value) {
                Ok(graph) => {
                    info!(nodes = graph.node_count(), "restored graph from store");
                    self.graph = graph;
                }
                Err(err) => warn!(%err, "stored graph is unreadable, starting fresh"),
            },
            Ok(None) => {}
            Err(err) => warn!(%err, "could not read stored graph"),
        }
    }

    /// Writes the ledger snapshot if it changed since the last write.
    /// Returns whether a write happened.
    pub fn persist_ledger(&mut self) -> bool {
        if !self.ledger_dirty {
            return false;
        }
        let Some(store) = &self.store else {
            return false;
        };
        match serde_json::to_value(&self.ledger) {
            Ok(value) => {
                if let Err(err) = store.save(LEDGER_KEY, &value) {
                    warn!(%err, "failed to persist access ledger");
                    return false;
                }
                self.ledger_dirty = false;
                debug!("persisted access ledger");
                true
            }
            Err(err) => {
                warn!(%err, "failed to serialize access ledger");
                false
            }
        }
    }

    /// Writes the graph snapshot if it changed since the last write.
    pub fn persist_graph(&mut self) -> bool {
        if !self.graph_dirty {
            return false;
        }
        let Some(store) = &self.store else {
            return false;
        };
        match serde_json::to_value(&self.graph) {
            Ok(value) => {
                if let Err(err) = store.save(GRAPH_KEY, &value) {
                    warn!(%err, "failed to persist graph");
                    return false;
                }
                self.graph_dirty = false;
                debug!("persisted graph snapshot");
                true
            }
            Err(err) => {
                warn!(%err, "failed to serialize graph");
                false
            }
        }
    }

    /// Flushes everything dirty to the store.
    pub fn persist_all(&mut self) {
        self.persist_ledger();
        self.persist_graph();
    }

    pub fn ledger_dirty(&self) -> bool {
        self.ledger_dirty
    }

    /// Replaces a file's slice of the graph with externally produced
    /// facts. An empty analysis is a no-op: analyzers report empty for
    /// files that no longer exist, and deletion only ever comes
    /// through `remove_file`.
    pub fn ingest_file_analysis(&mut self, path: &str, analysis: FileAnalysis) {
        if analysis.is_empty() {
            debug!(path, "skipping empty analysis");
            return;
        }
        self.graph.ingest_file_analysis(path, analysis);
        self.graph_dirty = true;
    }

    /// Runs the analyzer over a batch of changed paths.
    pub fn analyze_paths(&mut self, paths: &[String]) {
        for path in paths {
            match self.analyzer.analyze(path) {
                Ok(analysis) => self.ingest_file_analysis(path, analysis),
                Err(err) => warn!(path, %err, "analysis failed, keeping previous graph slice"),
            }
        }
    }

    /// Records a live file touch with the temporal engine.
    pub fn note_modification(&mut self, path: &str, kind: ModificationKind) {
        self.temporal.record_event(ModificationEvent::now(path, kind));
    }

    /// Drops a deleted file from the graph and records the deletion.
    pub fn remove_file(&mut self, path: &str) {
        self.graph.remove_file(path);
        self.graph_dirty = true;
        self.temporal
            .record_event(ModificationEvent::now(path, ModificationKind::Deleted));
    }

    /// Bumps a file's access counter.
    pub fn record_file_access(&mut self, path: &str) {
        self.ledger.record_file(path);
        self.ledger_dirty = true;
    }

    /// Bumps the counters of every node whose span overlaps the
    /// selection. Returns whether anything was hit.
    pub fn record_selection(&mut self, path: &str, start_line: u32, end_line: u32) -> bool {
        let hits: Vec<String> = self
            .graph
            .nodes_in_file(path)
            .into_iter()
            .filter(|n| n.overlaps_lines(start_line, end_line))
            .map(|n| n.id.clone())
            .collect();
        for id in &hits {
            self.ledger.record_node(id);
        }
        if hits.is_empty() {
            false
        } else {
            self.ledger_dirty = true;
            true
        }
    }

    /// The ranked context for a file. Triggers analysis first when the
    /// file was never ingested.
    pub fn weighted_context(&mut self, path: &str) -> SemanticContext {
        if self.graph.nodes_in_file(path).is_empty() {
            self.analyze_paths(&[path.to_string()]);
        }
        self.weighting
            .weighted_context(&mut self.graph, &self.temporal, &self.ledger, path)
    }

    /// Ranked related-file suggestions for a file.
    pub fn related_file_suggestions(&self, path: &str) -> Vec<FileSuggestion> {
        self.weighting
            .related_file_suggestions(&self.graph, &self.temporal, &self.ledger, path)
    }

    /// Patterns involving a file, lazily mining its recent commits on
    /// a cold cache.
    pub fn modification_patterns(&mut self, path: &str) -> Vec<ModificationPattern> {
        let source = self.change_log.clone();
        self.temporal
            .patterns_for(path, source.as_deref().map(|s| s as &dyn ChangeLogSource))
    }

    /// Replays already-fetched commits through the miners.
    pub fn import_commits(&mut self, commits: Vec<Commit>) -> usize {
        self.temporal.import_commits(commits)
    }

    /// Blocking history import over the configured window. The actor
    /// wraps this in a timeout; call it directly only when embedding
    /// the engine synchronously.
    pub fn import_history(&mut self) -> usize {
        let Some(source) = self.change_log.clone() else {
            return 0;
        };
        let since = Utc::now() - Duration::days(self.config.history_days);
        self.temporal.import_history(source.as_ref(), since)
    }

    pub fn change_log(&self) -> Option<Arc<dyn ChangeLogSource + Send + Sync>> {
        self.change_log.clone()
    }

    pub fn stats(&self) -> EngineStats {
        let graph = self.graph.stats();
        EngineStats {
            nodes: graph.node_count,
            edges: graph.edge_count,
            files: graph.files,
            patterns: self.temporal.pattern_count(),
            tracked_files: self.temporal.tracked_file_count(),
        }
    }
}
