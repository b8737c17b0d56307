//! Access ledger.
//!
//! Counts how often nodes and files are touched by the user and when
//! they were last touched. The weighting engine reads these counters
//! for the access-frequency and recency signals. The whole ledger
//! serializes to one JSON value so it can round-trip through the
//! opaque persistence store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One counter with its last-touch timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub count: u32,
    pub last_access: DateTime<Utc>,
}

impl AccessRecord {
    fn touch(&mut self, now: DateTime<Utc>) {
        self.count = self.count.saturating_add(1);
        self.last_access = now;
    }

    fn first(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            last_access: now,
        }
    }
}

/// Per-node and per-file access counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessLedger {
    nodes: HashMap<String, AccessRecord>,
    files: HashMap<String, AccessRecord>,
}

impl AccessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a file access (open, focus).
    pub fn record_file(&mut self, path: &str) {
        self.record_file_at(path, Utc::now());
    }

    pub fn record_file_at(&mut self, path: &str, now: DateTime<Utc>) {
        self.files
            .entry(path.to_string())
            .and_modify(|r| r.touch(now))
            .or_insert_with(|| AccessRecord::first(now));
    }

    /// Records a node access (cursor overlap with its span).
    pub fn record_node(&mut self, id: &str) {
        self.record_node_at(id, Utc::now());
    }

    pub fn record_node_at(&mut self, id: &str, now: DateTime<Utc>) {
        self.nodes
            .entry(id.to_string())
            .and_modify(|r| r.touch(now))
            .or_insert_with(|| AccessRecord::first(now));
    }

    pub fn node_count(&self, id: &str) -> u32 {
        self.nodes.get(id).map(|r| r.count).unwrap_or(0)
    }

    pub fn file_count(&self, path: &str) -> u32 {
        self.files.get(path).map(|r| r.count).unwrap_or(0)
    }

    pub fn file_last_access(&self, path: &str) -> Option<DateTime<Utc>> {
        self.files.get(path).map(|r| r.last_access)
    }

    /// Linear recency factor in [0, 1]: 1 at the moment of access,
    /// fading to 0 over `horizon`.
    pub fn file_recency(&self, path: &str, now: DateTime<Utc>, horizon: Duration) -> f64 {
        let Some(last) = self.file_last_access(path) else {
            return 0.0;
        };
        let age = (now - last).num_seconds().max(0) as f64;
        let span = horizon.num_seconds().max(1) as f64;
        (1.0 - age / span).max(0.0)
    }

    /// Files with at least one recorded access.
    pub fn tracked_files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_counts_accumulate() {
        let mut ledger = AccessLedger::new();
        ledger.record_file("a.ts");
        ledger.record_file("a.ts");
        ledger.record_node("a.ts::foo");

        assert_eq!(ledger.file_count("a.ts"), 2);
        assert_eq!(ledger.node_count("a.ts::foo"), 1);
        assert_eq!(ledger.node_count("nope"), 0);
    }

    #[test]
    fn test_recency_decays_linearly() {
        let mut ledger = AccessLedger::new();
        let accessed = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        ledger.record_file_at("a.ts", accessed);

        let horizon = Duration::days(7);
        let half_later = accessed + Duration::hours(84);
        let way_later = accessed + Duration::days(10);

        assert!((ledger.file_recency("a.ts", accessed, horizon) - 1.0).abs() < 1e-9);
        assert!((ledger.file_recency("a.ts", half_later, horizon) - 0.5).abs() < 1e-9);
        assert_eq!(ledger.file_recency("a.ts", way_later, horizon), 0.0);
        assert_eq!(ledger.file_recency("never.ts", accessed, horizon), 0.0);
    }

    #[test]
    fn test_json_round_trip() {
        let mut ledger = AccessLedger::new();
        ledger.record_file("a.ts");
        ledger.record_node("a.ts::foo");

        let value = serde_json::to_value(&ledger).unwrap();
        let back: AccessLedger = serde_json::from_value(value).unwrap();
        assert_eq!(back.file_count("a.ts"), 1);
        assert_eq!(back.node_count("a.ts::foo"), 1);
    }
}
