//! Incremental pattern index.
//!
//! The original formulation of this mining recomputed every pattern
//! from the full event log after each event. Here each event only
//! touches the counters it can affect: one commit membership list for
//! co-modification, a short list of "open" events for sequential
//! mining. Thresholds and confidence formulas are unchanged.

use canopy_core::{ModificationEvent, ModificationPattern, PatternKind};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// A pair must co-occur in at least this many commits to become a pattern.
const COMOD_MIN_COUNT: u32 = 3;

/// Co-modification confidence is count / 10, capped at 1.
const COMOD_CONFIDENCE_SCALE: f64 = 10.0;

/// An ordered pair must repeat at least this often to become a pattern.
const SEQUENTIAL_MIN_COUNT: u32 = 2;

/// Sequential confidence is count / 5, capped at 1.
const SEQUENTIAL_CONFIDENCE_SCALE: f64 = 5.0;

/// How long after an event a follow-up on another file still counts.
pub(crate) const SEQUENTIAL_WINDOW_MINUTES: i64 = 30;

/// An event still waiting for its first follow-up on another file.
#[derive(Debug, Clone)]
struct OpenEvent {
    path: String,
    timestamp: DateTime<Utc>,
}

/// Incrementally maintained pattern counters and materialized patterns.
#[derive(Debug, Default)]
pub(crate) struct PatternIndex {
    /// Files seen so far per commit id.
    commit_files: HashMap<String, Vec<String>>,

    /// Unordered-pair commit co-occurrence counts. Keys are sorted pairs.
    comod_counts: HashMap<(String, String), u32>,

    /// Ordered-pair sequential counts (first file, follow-up file).
    sequential_counts: HashMap<(String, String), u32>,

    /// Events whose first cross-file successor has not arrived yet.
    open_events: VecDeque<OpenEvent>,

    /// Patterns that crossed their threshold, by pattern id. BTreeMap
    /// keeps iteration deterministic.
    patterns: BTreeMap<String, ModificationPattern>,
}

impl PatternIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the counters.
    pub(crate) fn observe(&mut self, event: &ModificationEvent) {
        if let Some(commit) = event.commit_id.clone() {
            self.observe_commit_member(&commit, &event.path);
        }
        self.observe_sequential(event);
    }

    /// Co-modification: pair the file with every other file already
    /// seen in the same commit.
    fn observe_commit_member(&mut self, commit: &str, path: &str) {
        let members = self.commit_files.entry(commit.to_string()).or_default();
        if members.iter().any(|m| m == path) {
            return;
        }

        let counterparts: Vec<String> = members.clone();
        members.push(path.to_string());

        for other in counterparts {
            let key = ordered_pair(&other, path);
            let count = self.comod_counts.entry(key.clone()).or_insert(0);
            *count += 1;
            let count = *count;
            if count >= COMOD_MIN_COUNT {
                self.upsert_comod(key, count);
            }
        }
    }

    /// Sequential: this event closes every open event on another file
    /// that it strictly follows within the window, then opens itself.
    fn observe_sequential(&mut self, event: &ModificationEvent) {
        let horizon = event.timestamp - Duration::minutes(SEQUENTIAL_WINDOW_MINUTES);

        let mut matched: Vec<String> = Vec::new();
        self.open_events.retain(|open| {
            // Too old to ever match anything after this event either.
            if open.timestamp < horizon {
                return false;
            }
            let strictly_after = open.timestamp < event.timestamp;
            if strictly_after && open.path != event.path {
                matched.push(open.path.clone());
                return false;
            }
            true
        });

        for first in matched {
            let key = (first, event.path.clone());
            let count = self.sequential_counts.entry(key.clone()).or_insert(0);
            *count += 1;
            let count = *count;
            if count >= SEQUENTIAL_MIN_COUNT {
                self.upsert_sequential(key, count);
            }
        }

        self.open_events.push_back(OpenEvent {
            path: event.path.clone(),
            timestamp: event.timestamp,
        });
    }

    fn upsert_comod(&mut self, pair: (String, String), count: u32) {
        let (a, b) = pair;
        let id = format!("comod:{}::{}", a, b);
        let confidence = (count as f64 / COMOD_CONFIDENCE_SCALE).min(1.0);
        self.patterns.insert(
            id.clone(),
            ModificationPattern {
                id,
                kind: PatternKind::CoModification,
                name: format!("{} + {}", a, b),
                description: format!("{} and {} changed together in {} commits", a, b, count),
                frequency: count,
                confidence,
                related_files: vec![a, b],
            },
        );
    }

    fn upsert_sequential(&mut self, pair: (String, String), count: u32) {
        let (first, follow) = pair;
        let id = format!("seq:{}->{}", first, follow);
        let confidence = (count as f64 / SEQUENTIAL_CONFIDENCE_SCALE).min(1.0);
        self.patterns.insert(
            id.clone(),
            ModificationPattern {
                id,
                kind: PatternKind::Sequential,
                name: format!("{} then {}", first, follow),
                description: format!(
                    "{} changed within {} minutes after {} ({} times)",
                    follow, SEQUENTIAL_WINDOW_MINUTES, first, count
                ),
                frequency: count,
                confidence,
                related_files: vec![first, follow],
            },
        );
    }

    /// All materialized patterns.
    pub(crate) fn all(&self) -> impl Iterator<Item = &ModificationPattern> {
        self.patterns.values()
    }

    /// Patterns involving a file, highest confidence first.
    pub(crate) fn related_to(&self, path: &str) -> Vec<ModificationPattern> {
        let mut related: Vec<ModificationPattern> = self
            .patterns
            .values()
            .filter(|p| p.mentions(path))
            .cloned()
            .collect();
        related.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        related
    }

    pub(crate) fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::ModificationKind;
    use chrono::TimeZone;

    fn commit_event(path: &str, commit: &str, day: u32) -> ModificationEvent {
        let ts = Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap();
        ModificationEvent::at(ts, path, ModificationKind::Updated).with_commit(commit)
    }

    fn live_event(path: &str, hour: u32, minute: u32) -> ModificationEvent {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap();
        ModificationEvent::at(ts, path, ModificationKind::Updated)
    }

    fn record_commit(index: &mut PatternIndex, commit: &str, day: u32, files: &[&str]) {
        for file in files {
            index.observe(&commit_event(file, commit, day));
        }
    }

    #[test]
    fn test_two_shared_commits_are_below_threshold() {
        let mut index = PatternIndex::new();
        record_commit(&mut index, "c1", 1, &["a.ts", "b.ts"]);
        record_commit(&mut index, "c2", 2, &["a.ts", "b.ts"]);
        assert_eq!(index.pattern_count(), 0);
    }

    #[test]
    fn test_three_shared_commits_yield_confidence_point_three() {
        let mut index = PatternIndex::new();
        record_commit(&mut index, "c1", 1, &["a.ts", "b.ts"]);
        record_commit(&mut index, "c2", 2, &["a.ts", "b.ts"]);
        record_commit(&mut index, "c3", 3, &["b.ts", "a.ts"]);

        let patterns = index.related_to("a.ts");
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.kind, PatternKind::CoModification);
        assert_eq!(p.frequency, 3);
        assert!((p.confidence - 0.3).abs() < f64::EPSILON);
        assert!(p.mentions("b.ts"));
    }

    #[test]
    fn test_comod_confidence_caps_at_one() {
        let mut index = PatternIndex::new();
        for i in 0..12 {
            record_commit(&mut index, &format!("c{i}"), 1 + (i % 28) as u32, &["a.ts", "b.ts"]);
        }
        let p = &index.related_to("a.ts")[0];
        assert_eq!(p.frequency, 12);
        assert_eq!(p.confidence, 1.0);
    }

    #[test]
    fn test_same_file_twice_in_commit_not_paired_with_itself() {
        let mut index = PatternIndex::new();
        record_commit(&mut index, "c1", 1, &["a.ts", "a.ts"]);
        assert!(index.comod_counts.is_empty());
    }

    #[test]
    fn test_sequential_within_window_counts() {
        let mut index = PatternIndex::new();
        // Two rounds of "a then b, 29 minutes apart" crosses the
        // threshold of 2.
        index.observe(&live_event("a.ts", 9, 0));
        index.observe(&live_event("b.ts", 9, 29));
        index.observe(&live_event("a.ts", 14, 0));
        index.observe(&live_event("b.ts", 14, 29));

        let patterns = index.related_to("a.ts");
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.kind, PatternKind::Sequential);
        assert_eq!(p.frequency, 2);
        assert!((p.confidence - 0.4).abs() < f64::EPSILON);
        assert_eq!(p.related_files, vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn test_sequential_outside_window_not_counted() {
        let mut index = PatternIndex::new();
        index.observe(&live_event("a.ts", 9, 0));
        index.observe(&live_event("b.ts", 9, 31));
        index.observe(&live_event("a.ts", 14, 0));
        index.observe(&live_event("b.ts", 14, 31));
        assert_eq!(index.pattern_count(), 0);
        assert!(index.sequential_counts.is_empty());
    }

    #[test]
    fn test_only_first_successor_counts() {
        let mut index = PatternIndex::new();
        // b arrives first, then c: only (a, b) should increment.
        index.observe(&live_event("a.ts", 9, 0));
        index.observe(&live_event("b.ts", 9, 5));
        index.observe(&live_event("c.ts", 9, 10));

        assert_eq!(index.sequential_counts.get(&("a.ts".into(), "b.ts".into())), Some(&1));
        assert_eq!(index.sequential_counts.get(&("a.ts".into(), "c.ts".into())), None);
        // b's own first successor is c.
        assert_eq!(index.sequential_counts.get(&("b.ts".into(), "c.ts".into())), Some(&1));
    }

    #[test]
    fn test_same_file_event_does_not_close_the_window() {
        let mut index = PatternIndex::new();
        // A second touch of a.ts must not consume a.ts's open slot;
        // the later b.ts touch is still its first cross-file successor.
        index.observe(&live_event("a.ts", 9, 0));
        index.observe(&live_event("a.ts", 9, 10));
        index.observe(&live_event("b.ts", 9, 20));

        assert_eq!(index.sequential_counts.get(&("a.ts".into(), "b.ts".into())), Some(&2));
    }
}
