//! Bounded modification-event log.
//!
//! Events are kept per file in arrival order plus in one global
//! recency list. Both sides are capped: when a deque is full the
//! oldest entry falls off. Pattern counters live elsewhere and are not
//! affected by eviction, so an old event aging out never un-counts a
//! pattern.

use canopy_core::ModificationEvent;
use std::collections::{HashMap, VecDeque};

/// Default cap on retained events per file.
const PER_FILE_CAP: usize = 256;

/// Default cap on the global recency list.
const RECENT_CAP: usize = 512;

/// Append-order log of file modification events.
#[derive(Debug)]
pub struct EventLog {
    per_file: HashMap<String, VecDeque<ModificationEvent>>,
    recent: VecDeque<ModificationEvent>,
    per_file_cap: usize,
    recent_cap: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Creates a log with the default retention caps.
    pub fn new() -> Self {
        Self::with_caps(PER_FILE_CAP, RECENT_CAP)
    }

    /// Creates a log with explicit retention caps.
    pub fn with_caps(per_file_cap: usize, recent_cap: usize) -> Self {
        Self {
            per_file: HashMap::new(),
            recent: VecDeque::new(),
            per_file_cap: per_file_cap.max(1),
            recent_cap: recent_cap.max(1),
        }
    }

    /// Appends an event.
    pub fn record(&mut self, event: ModificationEvent) {
        let file_log = self.per_file.entry(event.path.clone()).or_default();
        if file_log.len() == self.per_file_cap {
            file_log.pop_front();
        }
        file_log.push_back(event.clone());

        if self.recent.len() == self.recent_cap {
            self.recent.pop_front();
        }
        self.recent.push_back(event);
    }

    /// The most recent `limit` events for a file, newest first.
    pub fn recent_for(&self, path: &str, limit: usize) -> Vec<ModificationEvent> {
        self.per_file
            .get(path)
            .map(|events| events.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// The most recent `limit` events across all files, newest first.
    pub fn recent(&self, limit: usize) -> Vec<ModificationEvent> {
        self.recent.iter().rev().take(limit).cloned().collect()
    }

    /// Number of events currently retained for a file.
    pub fn len_for(&self, path: &str) -> usize {
        self.per_file.get(path).map(VecDeque::len).unwrap_or(0)
    }

    /// Number of files with at least one retained event.
    pub fn file_count(&self) -> usize {
        self.per_file.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::ModificationKind;
    use chrono::{TimeZone, Utc};

    fn event(path: &str, minute: u32) -> ModificationEvent {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap();
        ModificationEvent::at(ts, path, ModificationKind::Updated)
    }

    #[test]
    fn test_recent_for_is_newest_first() {
        let mut log = EventLog::new();
        log.record(event("a.ts", 1));
        log.record(event("a.ts", 2));
        log.record(event("b.ts", 3));
        log.record(event("a.ts", 4));

        let recent = log.recent_for("a.ts", 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp.format("%M").to_string(), "04");
        assert_eq!(recent[1].timestamp.format("%M").to_string(), "02");
    }

    #[test]
    fn test_per_file_cap_evicts_oldest() {
        let mut log = EventLog::with_caps(2, 100);
        log.record(event("a.ts", 1));
        log.record(event("a.ts", 2));
        log.record(event("a.ts", 3));

        assert_eq!(log.len_for("a.ts"), 2);
        let recent = log.recent_for("a.ts", 10);
        assert_eq!(recent.last().unwrap().timestamp.format("%M").to_string(), "02");
    }

    #[test]
    fn test_unknown_path_is_empty() {
        let log = EventLog::new();
        assert!(log.recent_for("nope.ts", 10).is_empty());
        assert_eq!(log.len_for("nope.ts"), 0);
    }
}
