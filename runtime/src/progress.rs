// Copyright 2026 Filings Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress event types and the per-run observer.
//!
//! Every pipeline stage reports through a [`RunObserver`] owned by the run.
//! The observer writes structured `tracing` events tagged with the run id and
//! feed, and mirrors them as [`ProgressEvent`]s on an optional
//! `tokio::sync::broadcast` channel. When no subscriber exists, events are
//! silently dropped.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A progress event emitted during a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The run this event belongs to.
    pub run_id: String,
    /// Feed identifier of the run.
    pub feed: String,
    /// Monotonically increasing sequence number within the run.
    pub seq: u64,
    /// The kind of progress event.
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// The state machine entered a stage.
    StageEntered { stage: String },
    /// Bootstrap timed out or failed; the run continues without cookies.
    SessionDegraded { reason: String },
    /// One retry attempt failed.
    AttemptFailed {
        attempt: u32,
        max_attempts: u32,
        error: String,
    },
    /// An extracted entry or table row was skipped.
    RowSkipped { index: usize, reason: String },
    /// A record was dropped by validation.
    RecordDropped { reason: String, raw: String },
    /// An artifact was written.
    ArtifactWritten { kind: String, path: String },
    /// The run reached `Done`.
    RunCompleted { records: usize, dropped: usize },
    /// The run reached `Failed`.
    RunFailed { stage: String, error: String },
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Observability collaborator scoped to one pipeline run.
#[derive(Debug)]
pub struct RunObserver {
    run_id: String,
    feed: String,
    tx: Option<ProgressSender>,
    seq: AtomicU64,
}

impl RunObserver {
    pub fn new(run_id: impl Into<String>, feed: impl Into<String>, tx: Option<ProgressSender>) -> Self {
        Self {
            run_id: run_id.into(),
            feed: feed.into(),
            tx,
            seq: AtomicU64::new(0),
        }
    }

    /// An observer that only logs.
    pub fn detached(feed: impl Into<String>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), feed, None)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn feed(&self) -> &str {
        &self.feed
    }

    pub fn stage_entered(&self, stage: &str) {
        tracing::debug!(run_id = %self.run_id, feed = %self.feed, stage, "entering stage");
        self.emit(ProgressEventKind::StageEntered {
            stage: stage.to_string(),
        });
    }

    pub fn session_degraded(&self, reason: &str) {
        tracing::warn!(run_id = %self.run_id, feed = %self.feed, "session bootstrap degraded: {reason}");
        self.emit(ProgressEventKind::SessionDegraded {
            reason: reason.to_string(),
        });
    }

    pub fn attempt_succeeded(&self, label: &str, attempt: u32, max_attempts: u32) {
        tracing::info!(
            run_id = %self.run_id,
            feed = %self.feed,
            "attempt {attempt}/{max_attempts}: {label} succeeded"
        );
    }

    pub fn attempt_failed(&self, label: &str, attempt: u32, max_attempts: u32, error: &str) {
        tracing::error!(
            run_id = %self.run_id,
            feed = %self.feed,
            "attempt {attempt}/{max_attempts}: {label} failed: {error}"
        );
        self.emit(ProgressEventKind::AttemptFailed {
            attempt,
            max_attempts,
            error: error.to_string(),
        });
    }

    pub fn row_skipped(&self, index: usize, reason: &str) {
        tracing::debug!(run_id = %self.run_id, feed = %self.feed, index, "skipping entry: {reason}");
        self.emit(ProgressEventKind::RowSkipped {
            index,
            reason: reason.to_string(),
        });
    }

    pub fn record_dropped(&self, reason: &str, raw: &str) {
        tracing::warn!(run_id = %self.run_id, feed = %self.feed, "dropping record ({reason}): {raw}");
        self.emit(ProgressEventKind::RecordDropped {
            reason: reason.to_string(),
            raw: raw.to_string(),
        });
    }

    pub fn artifact_written(&self, kind: &str, path: &std::path::Path) {
        tracing::info!(run_id = %self.run_id, feed = %self.feed, "{kind} artifact saved as {}", path.display());
        self.emit(ProgressEventKind::ArtifactWritten {
            kind: kind.to_string(),
            path: path.display().to_string(),
        });
    }

    pub fn run_completed(&self, records: usize, dropped: usize) {
        tracing::info!(run_id = %self.run_id, feed = %self.feed, records, dropped, "run completed");
        self.emit(ProgressEventKind::RunCompleted { records, dropped });
    }

    pub fn run_failed(&self, stage: &str, error: &str) {
        tracing::error!(run_id = %self.run_id, feed = %self.feed, stage, "run failed: {error}");
        self.emit(ProgressEventKind::RunFailed {
            stage: stage.to_string(),
            error: error.to_string(),
        });
    }

    fn emit(&self, event: ProgressEventKind) {
        if let Some(ref sender) = self.tx {
            let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
            let _ = sender.send(ProgressEvent {
                run_id: self.run_id.clone(),
                feed: self.feed.clone(),
                seq,
                event,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_serialization() {
        let event = ProgressEvent {
            run_id: "run-1".to_string(),
            feed: "block-deals".to_string(),
            seq: 1,
            event: ProgressEventKind::StageEntered {
                stage: "fetch".to_string(),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("StageEntered"));

        let parsed: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.run_id, "run-1");
        assert_eq!(parsed.seq, 1);
    }

    #[test]
    fn test_observer_sequences_events() {
        let (tx, mut rx) = channel();
        let observer = RunObserver::new("run-7", "board-meetings", Some(tx));
        observer.stage_entered("init");
        observer.record_dropped("missing symbol", "{}");

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(second.feed, "board-meetings");
        assert!(matches!(second.event, ProgressEventKind::RecordDropped { .. }));
    }

    #[test]
    fn test_channel_no_receivers() {
        let (tx, rx) = channel();
        drop(rx);
        let observer = RunObserver::new("run", "feed", Some(tx));
        // Must not panic without listeners.
        observer.session_degraded("timeout");
    }

    #[test]
    fn test_detached_observer_is_silent() {
        let observer = RunObserver::detached("announcements");
        observer.run_completed(0, 0);
        assert_eq!(observer.feed(), "announcements");
        assert!(!observer.run_id().is_empty());
    }
}
