//! Debounced batch collection.
//!
//! Changed paths accumulate in a pending set while one timer runs;
//! when it fires the whole batch is processed in a single pass. Paths
//! queued while a pass is running are kept for a follow-up pass, so
//! updates coalesce but are never dropped. The timer itself belongs to
//! the engine actor; this type only tracks the sets and guards.

use std::collections::BTreeSet;

/// Pending-set plus in-flight guard for debounced ingestion.
#[derive(Debug, Default)]
pub struct DebouncedBatch {
    /// Paths waiting for the next pass, deduplicated and ordered.
    pending: BTreeSet<String>,

    /// A flush timer is currently armed.
    timer_armed: bool,

    /// A pass is currently processing a drained batch.
    in_flight: bool,
}

impl DebouncedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a path. Returns true when the caller should arm the
    /// flush timer (first path of a new window, no pass running).
    pub fn queue(&mut self, path: impl Into<String>) -> bool {
        self.pending.insert(path.into());
        if self.timer_armed || self.in_flight {
            return false;
        }
        self.timer_armed = true;
        true
    }

    /// Drains the pending set for processing and raises the in-flight
    /// guard. Returns an empty batch when nothing is pending.
    pub fn begin_pass(&mut self) -> Vec<String> {
        self.timer_armed = false;
        self.in_flight = true;
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    /// Marks the pass finished. Returns true when paths arrived during
    /// the pass and the caller should arm a follow-up timer.
    pub fn finish_pass(&mut self) -> bool {
        self.in_flight = false;
        if self.pending.is_empty() {
            return false;
        }
        self.timer_armed = true;
        true
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && !self.in_flight
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_queue_arms_timer_once() {
        let mut batch = DebouncedBatch::new();
        assert!(batch.queue("a.ts"));
        assert!(!batch.queue("b.ts"));
        assert!(!batch.queue("a.ts"));
        assert_eq!(batch.pending_len(), 2);
    }

    #[test]
    fn test_begin_pass_drains_sorted_and_deduplicated() {
        let mut batch = DebouncedBatch::new();
        batch.queue("b.ts");
        batch.queue("a.ts");
        batch.queue("b.ts");

        let drained = batch.begin_pass();
        assert_eq!(drained, vec!["a.ts".to_string(), "b.ts".to_string()]);
        assert_eq!(batch.pending_len(), 0);
    }

    #[test]
    fn test_paths_queued_mid_pass_trigger_followup() {
        let mut batch = DebouncedBatch::new();
        batch.queue("a.ts");
        let _ = batch.begin_pass();

        // Arrives while the pass is running: no new timer yet.
        assert!(!batch.queue("late.ts"));

        // Pass ends with work left over: caller re-arms.
        assert!(batch.finish_pass());
        let drained = batch.begin_pass();
        assert_eq!(drained, vec!["late.ts".to_string()]);
        assert!(!batch.finish_pass());
        assert!(batch.is_idle());
    }
}
