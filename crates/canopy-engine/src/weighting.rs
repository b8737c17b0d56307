//! Composite relevance scoring.
//!
//! Four independent signals go into one score per node:
//! structural proximity to the focal file, how often the user touches
//! the node, how strongly history ties the node's file to others, and
//! how central the node is in the dependency graph. Weights are
//! configurable but must stay a convex combination.

use crate::ledger::AccessLedger;
use canopy_core::{DependencyNode, FileSuggestion, ScoredNode, SemanticContext};
use canopy_graph::DependencyGraph;
use canopy_temporal::TemporalEngine;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Same-file proximity when line spans are unknown.
const SAME_FILE_NO_SPAN: f64 = 0.8;

/// Cross-file proximity when no path connects the nodes.
const UNREACHABLE_PROXIMITY: f64 = 0.1;

/// Line distance at which same-file proximity reaches zero.
const LINE_DISTANCE_SPAN: f64 = 100.0;

/// Access counts normalize against this ceiling.
const ACCESS_NORMALIZATION: f64 = 100.0;

/// Node degree normalizes against this ceiling.
const DEGREE_NORMALIZATION: f64 = 20.0;

/// Suggestion blend weights.
const DEPENDENT_WEIGHT: f64 = 0.4;
const DEPENDENCY_WEIGHT: f64 = 0.3;
const TEMPORAL_SUGGESTION_WEIGHT: f64 = 0.3;
const ACCESS_SUGGESTION_WEIGHT: f64 = 0.2;
const RECENCY_SUGGESTION_WEIGHT: f64 = 0.1;

/// How long access recency takes to fade entirely.
const RECENCY_HORIZON_DAYS: i64 = 7;

/// Relative weights of the four relevance signals. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelevanceWeights {
    pub proximity: f64,
    pub access: f64,
    pub temporal: f64,
    pub dependency: f64,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            proximity: 0.3,
            access: 0.25,
            temporal: 0.2,
            dependency: 0.25,
        }
    }
}

impl RelevanceWeights {
    pub fn sum(&self) -> f64 {
        self.proximity + self.access + self.temporal + self.dependency
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-6
    }
}

/// Scores graph nodes against a focal file and assembles ranked
/// contexts.
#[derive(Debug, Clone)]
pub struct WeightingEngine {
    weights: RelevanceWeights,
    max_nodes: usize,
    recent_limit: usize,
}

impl Default for WeightingEngine {
    fn default() -> Self {
        Self::new(RelevanceWeights::default(), 50, 10)
    }
}

impl WeightingEngine {
    pub fn new(weights: RelevanceWeights, max_nodes: usize, recent_limit: usize) -> Self {
        if !weights.is_normalized() {
            warn!(sum = weights.sum(), "relevance weights do not sum to 1");
        }
        Self {
            weights,
            max_nodes,
            recent_limit,
        }
    }

    /// Builds the ranked context for a file.
    ///
    /// Every other node in the graph is scored against the file's own
    /// node, the best `max_nodes` survive, and the focal node is
    /// pinned on top at exactly 1.0. Edges are restricted to the
    /// surviving subset.
    pub fn weighted_context(
        &self,
        graph: &mut DependencyGraph,
        temporal: &TemporalEngine,
        ledger: &AccessLedger,
        path: &str,
    ) -> SemanticContext {
        let file_nodes = graph.nodes_for_file(path);
        let focal = file_nodes
            .iter()
            .find(|n| n.kind == canopy_core::NodeKind::File)
            .unwrap_or(&file_nodes[0])
            .clone();

        let centrality = graph.node_centrality();
        let mut temporal_cache: HashMap<String, f64> = HashMap::new();

        let mut scored: Vec<ScoredNode> = graph
            .nodes()
            .filter(|node| node.id != focal.id)
            .map(|node| ScoredNode {
                relevance: self.relevance(graph, temporal, ledger, &centrality, &mut temporal_cache, &focal, node),
                node: node.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node.id.cmp(&b.node.id))
        });
        scored.truncate(self.max_nodes);
        scored.insert(
            0,
            ScoredNode {
                node: focal.clone(),
                relevance: 1.0,
            },
        );

        let selected: HashSet<&str> = scored.iter().map(|s| s.node.id.as_str()).collect();
        let relevant_edges = graph
            .edges()
            .into_iter()
            .filter(|e| selected.contains(e.source.as_str()) && selected.contains(e.target.as_str()))
            .collect();

        SemanticContext {
            focal_path: path.to_string(),
            relevant_nodes: scored,
            relevant_edges,
            modification_patterns: temporal.related_patterns(path),
            recent_modifications: temporal.recent_modifications(path, self.recent_limit),
        }
    }

    /// Combined relevance of one node to the focal node, in [0, 1].
    fn relevance(
        &self,
        graph: &DependencyGraph,
        temporal: &TemporalEngine,
        ledger: &AccessLedger,
        centrality: &HashMap<String, usize>,
        temporal_cache: &mut HashMap<String, f64>,
        focal: &DependencyNode,
        node: &DependencyNode,
    ) -> f64 {
        let proximity = self.proximity(graph, focal, node);
        let access = self.access_score(ledger, node);
        let temporal_score = match &node.path {
            Some(path) => *temporal_cache
                .entry(path.clone())
                .or_insert_with(|| temporal_affinity(temporal, path)),
            None => 0.0,
        };
        let dependency = (centrality.get(&node.id).copied().unwrap_or(0) as f64
            / DEGREE_NORMALIZATION)
            .min(1.0);

        let w = &self.weights;
        (w.proximity * proximity
            + w.access * access
            + w.temporal * temporal_score
            + w.dependency * dependency)
            .clamp(0.0, 1.0)
    }

    /// Structural proximity signal.
    fn proximity(
        &self,
        graph: &DependencyGraph,
        focal: &DependencyNode,
        node: &DependencyNode,
    ) -> f64 {
        if node.path.is_some() && node.path == focal.path {
            return match (focal.span(), node.span()) {
                (Some((fs, fe)), Some((ns, ne))) => {
                    if fs <= ne && ns <= fe {
                        1.0
                    } else {
                        // Gap between the nearest range boundaries.
                        let gap = if ns > fe { ns - fe } else { fs - ne };
                        (1.0 - gap as f64 / LINE_DISTANCE_SPAN).max(0.0)
                    }
                }
                _ => SAME_FILE_NO_SPAN,
            };
        }

        match graph.shortest_path(&focal.id, &node.id) {
            Some(path) => (1.0 - (path.len() as f64 - 2.0) * 0.2).max(0.0),
            None => UNREACHABLE_PROXIMITY,
        }
    }

    /// Access-frequency signal.
    fn access_score(&self, ledger: &AccessLedger, node: &DependencyNode) -> f64 {
        let node_part = (ledger.node_count(&node.id) as f64 / ACCESS_NORMALIZATION).min(1.0);
        let file_part = node
            .path
            .as_deref()
            .map(|p| (ledger.file_count(p) as f64 / ACCESS_NORMALIZATION).min(1.0))
            .unwrap_or(0.0);
        0.7 * node_part + 0.3 * file_part
    }

    /// Blends four sources into one ranked related-file list:
    /// structural dependents and dependencies, temporal suggestions,
    /// and the user's own access habits.
    pub fn related_file_suggestions(
        &self,
        graph: &DependencyGraph,
        temporal: &TemporalEngine,
        ledger: &AccessLedger,
        path: &str,
    ) -> Vec<FileSuggestion> {
        let own_ids: HashSet<&str> = graph
            .nodes_in_file(path)
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();

        let mut dependents: HashSet<String> = HashSet::new();
        let mut dependencies: HashSet<String> = HashSet::new();
        for edge in graph.edges() {
            let source_in = own_ids.contains(edge.source.as_str());
            let target_in = own_ids.contains(edge.target.as_str());
            if target_in && !source_in {
                if let Some(p) = graph.get(&edge.source).and_then(|n| n.path.clone()) {
                    dependents.insert(p);
                }
            }
            if source_in && !target_in {
                if let Some(p) = graph.get(&edge.target).and_then(|n| n.path.clone()) {
                    dependencies.insert(p);
                }
            }
        }

        let mut scores: HashMap<String, f64> = HashMap::new();
        for file in dependents {
            *scores.entry(file).or_insert(0.0) += DEPENDENT_WEIGHT;
        }
        for file in dependencies {
            *scores.entry(file).or_insert(0.0) += DEPENDENCY_WEIGHT;
        }
        for suggestion in temporal.suggestions(path) {
            *scores.entry(suggestion.file).or_insert(0.0) +=
                TEMPORAL_SUGGESTION_WEIGHT * suggestion.relevance;
        }

        let now = Utc::now();
        let horizon = Duration::days(RECENCY_HORIZON_DAYS);
        for (file, score) in scores.iter_mut() {
            *score += ACCESS_SUGGESTION_WEIGHT
                * (ledger.file_count(file) as f64 / ACCESS_NORMALIZATION).min(1.0);
            *score += RECENCY_SUGGESTION_WEIGHT * ledger.file_recency(file, now, horizon);
        }
        scores.remove(path);

        let mut suggestions: Vec<FileSuggestion> = scores
            .into_iter()
            .map(|(file, relevance)| FileSuggestion { file, relevance })
            .collect();
        suggestions.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.file.cmp(&b.file))
        });
        suggestions
    }
}

/// Frequency-weighted mean confidence of the patterns a file
/// participates in; 0 when history knows nothing about it.
fn temporal_affinity(temporal: &TemporalEngine, path: &str) -> f64 {
    let patterns = temporal.related_patterns(path);
    if patterns.is_empty() {
        return 0.0;
    }
    let total_frequency: f64 = patterns.iter().map(|p| p.frequency as f64).sum();
    if total_frequency == 0.0 {
        return 0.0;
    }
    patterns
        .iter()
        .map(|p| p.frequency as f64 * p.confidence)
        .sum::<f64>()
        / total_frequency
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::{DependencyEdge, DependencyNode, EdgeKind, FileAnalysis, NodeKind};

    fn node(id: &str, file: &str) -> DependencyNode {
        DependencyNode::new(id, id, NodeKind::Function, file)
    }

    fn engine() -> WeightingEngine {
        WeightingEngine::default()
    }

    #[test]
    fn test_proximity_same_file_overlap() {
        let graph = DependencyGraph::new();
        let focal = node("f", "a.ts").with_span(10, 30);
        let overlapping = node("g", "a.ts").with_span(25, 40);
        let distant = node("h", "a.ts").with_span(81, 90);
        let unspanned = node("i", "a.ts");

        let w = engine();
        assert_eq!(w.proximity(&graph, &focal, &overlapping), 1.0);
        // Gap of 51 lines between line 30 and line 81.
        let d = w.proximity(&graph, &focal, &distant);
        assert!((d - 0.49).abs() < 1e-9);
        assert_eq!(w.proximity(&graph, &focal, &unspanned), SAME_FILE_NO_SPAN);
    }

    #[test]
    fn test_proximity_cross_file_uses_path_length() {
        let mut graph = DependencyGraph::new();
        graph.ingest_file_analysis(
            "a.ts",
            FileAnalysis {
                nodes: vec![node("A", "a.ts")],
                edges: vec![],
            },
        );
        graph.ingest_file_analysis(
            "b.ts",
            FileAnalysis {
                nodes: vec![node("B", "b.ts"), node("C", "b.ts"), node("X", "b.ts")],
                edges: vec![
                    DependencyEdge::new("B", "C", EdgeKind::Calls),
                ],
            },
        );
        // A → B added from a second pass over a.ts so both ends exist.
        graph.ingest_file_analysis(
            "a.ts",
            FileAnalysis {
                nodes: vec![node("A", "a.ts")],
                edges: vec![DependencyEdge::new("A", "B", EdgeKind::Calls)],
            },
        );

        let w = engine();
        let a = graph.get("A").unwrap().clone();
        let b = graph.get("B").unwrap().clone();
        let c = graph.get("C").unwrap().clone();
        let x = graph.get("X").unwrap().clone();

        // Direct edge: path [A, B].
        assert_eq!(w.proximity(&graph, &a, &b), 1.0);
        // Two hops: path [A, B, C].
        assert!((w.proximity(&graph, &a, &c) - 0.8).abs() < 1e-9);
        // No path at all.
        assert_eq!(w.proximity(&graph, &a, &x), UNREACHABLE_PROXIMITY);
    }

    #[test]
    fn test_access_score_normalizes_and_caps() {
        let mut ledger = AccessLedger::new();
        for _ in 0..50 {
            ledger.record_node("n");
        }
        for _ in 0..200 {
            ledger.record_file("a.ts");
        }

        let w = engine();
        let scored = w.access_score(&ledger, &node("n", "a.ts"));
        // 0.7 * 0.5 + 0.3 * 1.0
        assert!((scored - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_stays_in_unit_interval() {
        let mut graph = DependencyGraph::new();
        let mut edges = Vec::new();
        let mut nodes = vec![node("hub", "a.ts").with_span(1, 5)];
        for i in 0..40 {
            let id = format!("n{i}");
            nodes.push(node(&id, "a.ts").with_span(1, 5));
            edges.push(DependencyEdge::new(id, "hub".to_string(), EdgeKind::Calls));
        }
        graph.ingest_file_analysis("a.ts", FileAnalysis { nodes, edges });

        let mut ledger = AccessLedger::new();
        for _ in 0..500 {
            ledger.record_node("hub");
            ledger.record_file("a.ts");
        }

        let temporal = TemporalEngine::new();
        let w = engine();
        let context = w.weighted_context(&mut graph, &temporal, &ledger, "a.ts");

        for scored in &context.relevant_nodes {
            assert!(
                (0.0..=1.0).contains(&scored.relevance),
                "{} scored {}",
                scored.node.id,
                scored.relevance
            );
        }
        // Focal falls back to the file's first node when the analysis
        // carried no file-kind node.
        assert_eq!(context.relevant_nodes[0].relevance, 1.0);
        assert_eq!(context.relevant_nodes[0].node.id, "hub");
    }

    #[test]
    fn test_context_size_is_bounded() {
        let mut graph = DependencyGraph::new();
        let nodes = (0..80).map(|i| node(&format!("n{i}"), "big.ts")).collect();
        graph.ingest_file_analysis("big.ts", FileAnalysis { nodes, edges: vec![] });

        let w = engine();
        let context =
            w.weighted_context(&mut graph, &TemporalEngine::new(), &AccessLedger::new(), "big.ts");

        // 50 ranked nodes plus the focal node.
        assert!(context.relevant_nodes.len() <= 51);
        assert_eq!(context.relevant_nodes[0].relevance, 1.0);
    }

    #[test]
    fn test_context_edges_restricted_to_selection() {
        let mut graph = DependencyGraph::new();
        let mut nodes: Vec<DependencyNode> = (0..60).map(|i| node(&format!("n{i}"), "big.ts")).collect();
        nodes.push(node("far", "big.ts"));
        // Edges make n0..n10 well-connected; "far" links to n0 only.
        let mut edges: Vec<DependencyEdge> = (1..11)
            .map(|i| DependencyEdge::new(format!("n{i}"), "n0".to_string(), EdgeKind::Calls))
            .collect();
        edges.push(DependencyEdge::new("far", "n0", EdgeKind::Calls));
        graph.ingest_file_analysis("big.ts", FileAnalysis { nodes, edges });

        let w = engine();
        let context =
            w.weighted_context(&mut graph, &TemporalEngine::new(), &AccessLedger::new(), "big.ts");

        let selected: HashSet<&str> = context
            .relevant_nodes
            .iter()
            .map(|s| s.node.id.as_str())
            .collect();
        for edge in &context.relevant_edges {
            assert!(selected.contains(edge.source.as_str()));
            assert!(selected.contains(edge.target.as_str()));
        }
    }

    #[test]
    fn test_suggestions_blend_structure_and_history() {
        let mut graph = DependencyGraph::new();
        graph.ingest_file_analysis(
            "b.ts",
            FileAnalysis {
                nodes: vec![node("B", "b.ts")],
                edges: vec![],
            },
        );
        graph.ingest_file_analysis(
            "a.ts",
            FileAnalysis {
                nodes: vec![node("A", "a.ts")],
                edges: vec![DependencyEdge::new("A", "B", EdgeKind::Imports)],
            },
        );

        let mut temporal = TemporalEngine::new();
        use canopy_core::{Commit, CommitFile, FileStatus};
        use chrono::TimeZone;
        let commits = (0..3)
            .map(|i| Commit {
                hash: format!("c{i}"),
                author: "dev".into(),
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1 + i, 12, 0, 0).unwrap(),
                message: "m".into(),
                files: vec![
                    CommitFile { path: "a.ts".into(), status: FileStatus::Modified },
                    CommitFile { path: "c.ts".into(), status: FileStatus::Modified },
                ],
            })
            .collect();
        temporal.import_commits(commits);

        let w = engine();
        let suggestions = w.related_file_suggestions(&graph, &temporal, &AccessLedger::new(), "a.ts");

        let files: Vec<&str> = suggestions.iter().map(|s| s.file.as_str()).collect();
        // b.ts from the import edge, c.ts from co-modification history.
        assert!(files.contains(&"b.ts"));
        assert!(files.contains(&"c.ts"));
        assert!(!files.contains(&"a.ts"));

        let b = suggestions.iter().find(|s| s.file == "b.ts").unwrap();
        assert!((b.relevance - DEPENDENCY_WEIGHT).abs() < 1e-9);
        let c = suggestions.iter().find(|s| s.file == "c.ts").unwrap();
        assert!((c.relevance - TEMPORAL_SUGGESTION_WEIGHT * 0.3).abs() < 1e-9);
    }
}
