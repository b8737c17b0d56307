//! Single-consumer engine task.
//!
//! All engine state is owned by one tokio task; external sources push
//! typed messages through a cloneable `EngineHandle`. Because there is
//! exactly one consumer, no query ever observes the graph mid-mutation
//! — the delete-then-insert of an ingestion pass cannot interleave
//! with anything.
//!
//! Ingestion is debounced: `FileChanged` queues the path and arms a
//! flush timer; the timer's `FlushIngest` message drains the batch.
//! Paths that arrive while a pass runs simply queue for the follow-up
//! pass. Ledger persistence uses the same timer trick with an idle
//! debounce, plus a periodic tick as a backstop.

use crate::engine::{ContextEngine, EngineStats};
use crate::scheduler::DebouncedBatch;
use canopy_core::{
    FileAnalysis, FileSuggestion, ModificationKind, ModificationPattern, SemanticContext,
};
use chrono::Utc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Message queue depth before senders get backpressure.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine task is no longer running")]
    Closed,
}

/// Messages the engine task consumes.
#[derive(Debug)]
pub enum EngineMessage {
    /// A file was created or changed; queue it for re-analysis.
    FileChanged {
        path: String,
        kind: ModificationKind,
    },

    /// A file was deleted.
    FileRemoved { path: String },

    /// Externally produced facts to ingest directly.
    IngestAnalysis {
        path: String,
        analysis: FileAnalysis,
    },

    /// The user opened or focused a file.
    FileAccessed { path: String },

    /// The cursor selection moved.
    SelectionChanged {
        path: String,
        start_line: u32,
        end_line: u32,
    },

    /// Import version-control history over the configured window.
    ImportHistory { reply: oneshot::Sender<usize> },

    WeightedContext {
        path: String,
        reply: oneshot::Sender<SemanticContext>,
    },

    FileSuggestions {
        path: String,
        reply: oneshot::Sender<Vec<FileSuggestion>>,
    },

    Patterns {
        path: String,
        reply: oneshot::Sender<Vec<ModificationPattern>>,
    },

    Stats { reply: oneshot::Sender<EngineStats> },

    /// Timer-driven: drain the pending ingest batch.
    FlushIngest,

    /// Timer-driven: write the ledger if dirty.
    PersistLedger,

    Shutdown { reply: oneshot::Sender<()> },
}

/// Cloneable front door to the engine task.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineMessage>,
}

impl EngineHandle {
    async fn send(&self, msg: EngineMessage) -> Result<(), EngineError> {
        self.tx.send(msg).await.map_err(|_| EngineError::Closed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> EngineMessage,
    ) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    pub async fn file_changed(
        &self,
        path: impl Into<String>,
        kind: ModificationKind,
    ) -> Result<(), EngineError> {
        self.send(EngineMessage::FileChanged {
            path: path.into(),
            kind,
        })
        .await
    }

    pub async fn file_removed(&self, path: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineMessage::FileRemoved { path: path.into() }).await
    }

    pub async fn ingest_analysis(
        &self,
        path: impl Into<String>,
        analysis: FileAnalysis,
    ) -> Result<(), EngineError> {
        self.send(EngineMessage::IngestAnalysis {
            path: path.into(),
            analysis,
        })
        .await
    }

    pub async fn file_accessed(&self, path: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineMessage::FileAccessed { path: path.into() }).await
    }

    pub async fn selection_changed(
        &self,
        path: impl Into<String>,
        start_line: u32,
        end_line: u32,
    ) -> Result<(), EngineError> {
        self.send(EngineMessage::SelectionChanged {
            path: path.into(),
            start_line,
            end_line,
        })
        .await
    }

    pub async fn import_history(&self) -> Result<usize, EngineError> {
        self.request(|reply| EngineMessage::ImportHistory { reply }).await
    }

    pub async fn weighted_context(
        &self,
        path: impl Into<String>,
    ) -> Result<SemanticContext, EngineError> {
        let path = path.into();
        self.request(|reply| EngineMessage::WeightedContext { path, reply })
            .await
    }

    pub async fn related_file_suggestions(
        &self,
        path: impl Into<String>,
    ) -> Result<Vec<FileSuggestion>, EngineError> {
        let path = path.into();
        self.request(|reply| EngineMessage::FileSuggestions { path, reply })
            .await
    }

    pub async fn modification_patterns(
        &self,
        path: impl Into<String>,
    ) -> Result<Vec<ModificationPattern>, EngineError> {
        let path = path.into();
        self.request(|reply| EngineMessage::Patterns { path, reply }).await
    }

    pub async fn stats(&self) -> Result<EngineStats, EngineError> {
        self.request(|reply| EngineMessage::Stats { reply }).await
    }

    /// Persists outstanding state and stops the engine task.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.request(|reply| EngineMessage::Shutdown { reply }).await
    }
}

struct EngineActor {
    engine: ContextEngine,
    ingest_batch: DebouncedBatch,
    persist_armed: bool,
    tx: mpsc::Sender<EngineMessage>,
}

impl ContextEngine {
    /// Moves the engine onto its own task and returns the handle.
    ///
    /// Restores persisted state before the first message is consumed.
    pub fn spawn(mut self) -> EngineHandle {
        self.load_persisted();

        let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
        let persist_interval = self.config().persist_interval;
        let mut actor = EngineActor {
            engine: self,
            ingest_batch: DebouncedBatch::new(),
            persist_armed: false,
            tx: tx.clone(),
        };

        tokio::spawn(async move {
            let mut persist_tick = tokio::time::interval(persist_interval);
            persist_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; swallow it.
            persist_tick.tick().await;

            loop {
                tokio::select! {
                    maybe = rx.recv() => match maybe {
                        Some(msg) => {
                            if actor.handle(msg).await {
                                break;
                            }
                        }
                        None => break,
                    },
                    _ = persist_tick.tick() => {
                        actor.engine.persist_all();
                    }
                }
            }
            actor.engine.persist_all();
            info!("engine task stopped");
        });

        EngineHandle { tx }
    }
}

impl EngineActor {
    /// Handles one message. Returns true on shutdown.
    async fn handle(&mut self, msg: EngineMessage) -> bool {
        match msg {
            EngineMessage::FileChanged { path, kind } => {
                self.engine.note_modification(&path, kind);
                if self.ingest_batch.queue(path) {
                    self.arm(self.engine.config().ingest_debounce, EngineMessage::FlushIngest);
                }
            }

            EngineMessage::FlushIngest => {
                let batch = self.ingest_batch.begin_pass();
                if !batch.is_empty() {
                    debug!(paths = batch.len(), "processing ingest batch");
                    self.engine.analyze_paths(&batch);
                }
                if self.ingest_batch.finish_pass() {
                    self.arm(self.engine.config().ingest_debounce, EngineMessage::FlushIngest);
                }
            }

            EngineMessage::FileRemoved { path } => {
                self.engine.remove_file(&path);
            }

            EngineMessage::IngestAnalysis { path, analysis } => {
                self.engine.ingest_file_analysis(&path, analysis);
            }

            EngineMessage::FileAccessed { path } => {
                self.engine.record_file_access(&path);
                self.schedule_persist();
            }

            EngineMessage::SelectionChanged {
                path,
                start_line,
                end_line,
            } => {
                if self.engine.record_selection(&path, start_line, end_line) {
                    self.schedule_persist();
                }
            }

            EngineMessage::ImportHistory { reply } => {
                let count = self.import_history_with_timeout().await;
                let _ = reply.send(count);
            }

            EngineMessage::WeightedContext { path, reply } => {
                let _ = reply.send(self.engine.weighted_context(&path));
            }

            EngineMessage::FileSuggestions { path, reply } => {
                let _ = reply.send(self.engine.related_file_suggestions(&path));
            }

            EngineMessage::Patterns { path, reply } => {
                let _ = reply.send(self.engine.modification_patterns(&path));
            }

            EngineMessage::Stats { reply } => {
                let _ = reply.send(self.engine.stats());
            }

            EngineMessage::PersistLedger => {
                self.persist_armed = false;
                self.engine.persist_ledger();
            }

            EngineMessage::Shutdown { reply } => {
                // Drain any pending ingest work before stopping.
                let batch = self.ingest_batch.begin_pass();
                if !batch.is_empty() {
                    self.engine.analyze_paths(&batch);
                }
                self.engine.persist_all();
                let _ = reply.send(());
                return true;
            }
        }
        false
    }

    /// History import off-thread with a hard timeout, so a wedged
    /// version-control call cannot stall the engine forever.
    async fn import_history_with_timeout(&mut self) -> usize {
        let Some(source) = self.engine.change_log() else {
            return 0;
        };
        let since = Utc::now() - chrono::Duration::days(self.engine.config().history_days);
        let timeout = self.engine.config().history_timeout;

        let fetch = tokio::task::spawn_blocking(move || source.commits_since(since));
        match tokio::time::timeout(timeout, fetch).await {
            Ok(Ok(Ok(commits))) => self.engine.import_commits(commits),
            Ok(Ok(Err(err))) => {
                warn!(%err, "history import failed, continuing without it");
                0
            }
            Ok(Err(join_err)) => {
                warn!(%join_err, "history import task failed");
                0
            }
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "history import timed out");
                0
            }
        }
    }

    /// Arms a one-shot timer that feeds a message back into the queue.
    fn arm(&self, delay: Duration, msg: EngineMessage) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(msg).await;
        });
    }

    fn schedule_persist(&mut self) {
        if self.persist_armed || !self.engine.ledger_dirty() {
            return;
        }
        self.persist_armed = true;
        self.arm(
            self.engine.config().persist_debounce,
            EngineMessage::PersistLedger,
        );
    }
}
