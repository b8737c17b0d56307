//! The temporal correlation engine.
//!
//! Owns the event log and the pattern index, and answers the queries
//! the weighting engine needs: which patterns involve a file, which
//! files does history suggest, what changed recently.

use crate::log::EventLog;
use crate::patterns::PatternIndex;
use canopy_core::{
    ChangeLogSource, Commit, FileSuggestion, ModificationEvent, ModificationPattern,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// How many commits a lazy mining pass inspects.
const LAZY_MINING_COMMITS: usize = 10;

/// Mines modification patterns from a stream of file-change events and
/// version-control history.
///
/// Version-control failures degrade to empty results with a warning;
/// nothing here is fatal to the caller.
#[derive(Debug, Default)]
pub struct TemporalEngine {
    log: EventLog,
    patterns: PatternIndex,

    /// Commits already replayed, so history import and lazy mining
    /// never double-count.
    seen_commits: HashSet<String>,
}

impl TemporalEngine {
    pub fn new() -> Self {
        Self {
            log: EventLog::new(),
            patterns: PatternIndex::new(),
            seen_commits: HashSet::new(),
        }
    }

    /// Records one live file-touch event.
    pub fn record_event(&mut self, event: ModificationEvent) {
        self.patterns.observe(&event);
        self.log.record(event);
    }

    /// Replays commit history through the miners.
    ///
    /// Commits are applied oldest first regardless of input order so
    /// sequential mining sees time moving forward. Already-seen commits
    /// are skipped. Returns the number of events recorded.
    pub fn import_commits(&mut self, mut commits: Vec<Commit>) -> usize {
        commits.sort_by_key(|c| c.timestamp);

        let mut recorded = 0usize;
        for commit in commits {
            if !self.seen_commits.insert(commit.hash.clone()) {
                continue;
            }
            for file in &commit.files {
                let event = ModificationEvent::at(commit.timestamp, &file.path, file.status.into())
                    .with_commit(&commit.hash)
                    .with_author(&commit.author);
                self.record_event(event);
                recorded += 1;
            }
        }

        if recorded > 0 {
            debug!(recorded, patterns = self.patterns.pattern_count(), "imported history");
        }
        recorded
    }

    /// Imports all commits newer than `since` from a log source.
    ///
    /// A failing source is logged and treated as empty history.
    pub fn import_history(&mut self, source: &dyn ChangeLogSource, since: DateTime<Utc>) -> usize {
        match source.commits_since(since) {
            Ok(commits) => {
                info!(commits = commits.len(), "importing version-control history");
                self.import_commits(commits)
            }
            Err(err) => {
                warn!(%err, "history import failed, continuing without it");
                0
            }
        }
    }

    /// Patterns involving a file, highest confidence first.
    pub fn related_patterns(&self, path: &str) -> Vec<ModificationPattern> {
        self.patterns.related_to(path)
    }

    /// Patterns involving a file, mining the file's recent commits
    /// first if nothing is known yet.
    ///
    /// The lazy pass covers the last few commits touching `path`; it
    /// exists so a file opened cold still gets history-backed context.
    pub fn patterns_for(
        &mut self,
        path: &str,
        source: Option<&dyn ChangeLogSource>,
    ) -> Vec<ModificationPattern> {
        let related = self.related_patterns(path);
        if !related.is_empty() {
            return related;
        }

        let Some(source) = source else {
            return related;
        };

        match source.recent_commits_touching(path, LAZY_MINING_COMMITS) {
            Ok(commits) => {
                debug!(path, commits = commits.len(), "lazy mining pass");
                self.import_commits(commits);
            }
            Err(err) => {
                warn!(path, %err, "lazy mining failed");
            }
        }
        self.related_patterns(path)
    }

    /// Flattens a file's patterns into `{file, relevance}` pairs,
    /// deduplicated by maximum confidence, sorted descending.
    pub fn suggestions(&self, path: &str) -> Vec<FileSuggestion> {
        let mut best: HashMap<String, f64> = HashMap::new();
        for pattern in self.patterns.all().filter(|p| p.mentions(path)) {
            for other in pattern.counterparts(path) {
                let entry = best.entry(other.to_string()).or_insert(0.0);
                if pattern.confidence > *entry {
                    *entry = pattern.confidence;
                }
            }
        }

        let mut suggestions: Vec<FileSuggestion> = best
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

    /// The most recent `limit` events for a file, newest first.
    pub fn recent_modifications(&self, path: &str, limit: usize) -> Vec<ModificationEvent> {
        self.log.recent_for(path, limit)
    }

    /// The most recent `limit` events across all files, newest first.
    pub fn recent_activity(&self, limit: usize) -> Vec<ModificationEvent> {
        self.log.recent(limit)
    }

    /// Number of materialized patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.pattern_count()
    }

    /// Number of files with retained events.
    pub fn tracked_file_count(&self) -> usize {
        self.log.file_count()
    }
}
