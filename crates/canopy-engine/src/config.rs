//! Engine configuration.

use crate::weighting::RelevanceWeights;
use std::time::Duration;

/// Tunables for the engine runtime.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long changed paths collect before a batch analysis pass.
    pub ingest_debounce: Duration,

    /// Idle time after a ledger change before it is persisted.
    pub persist_debounce: Duration,

    /// Interval of the periodic ledger persist.
    pub persist_interval: Duration,

    /// Ceiling on ranked nodes in a context (the focal node rides on
    /// top of this).
    pub max_context_nodes: usize,

    /// How many recent modification events a context carries.
    pub recent_modifications: usize,

    /// How far back the startup history import reaches.
    pub history_days: i64,

    /// Hard cap on a history import pass.
    pub history_timeout: Duration,

    /// Relevance signal weights.
    pub weights: RelevanceWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ingest_debounce: Duration::from_secs(1),
            persist_debounce: Duration::from_secs(5),
            persist_interval: Duration::from_secs(60),
            max_context_nodes: 50,
            recent_modifications: 10,
            history_days: 30,
            history_timeout: Duration::from_secs(30),
            weights: RelevanceWeights::default(),
        }
    }
}
