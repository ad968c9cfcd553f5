//! Snapshot persistence.
//!
//! The in-process repository is the source of truth. Saves are handed to a
//! background worker that waits for a quiet period, drops documents identical
//! to the last one written, and logs failures without retrying.

pub mod file;
pub mod memory;
pub mod remote;

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use crate::calendar::MonthKey;
use crate::error::PlanError;
use crate::metrics::Metrics;
use crate::schedule::ScheduleRepository;
use crate::subjects::Subject;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use remote::HttpSnapshotStore;

/// Stored per-user document. Keys this crate does not own (months, sessions,
/// settings, ...) are kept in `extra` and written back unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub active_schedule_months: BTreeSet<MonthKey>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SnapshotDocument {
    pub fn from_repository(
        repository: &ScheduleRepository,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        SnapshotDocument {
            subjects: repository.subjects().to_vec(),
            active_schedule_months: repository.active_months().collect(),
            last_updated: Some(Utc::now()),
            extra,
        }
    }

    /// Split into the repository and the foreign keys.
    pub fn into_parts(self) -> (ScheduleRepository, serde_json::Map<String, serde_json::Value>) {
        (
            ScheduleRepository::from_parts(self.subjects, self.active_schedule_months),
            self.extra,
        )
    }

    /// SHA-256 of the document content, ignoring `lastUpdated`.
    pub fn fingerprint(&self) -> Result<String, PlanError> {
        let bytes = serde_json::to_vec(&(&self.subjects, &self.active_schedule_months, &self.extra))
            .map_err(|e| PlanError::new(
                format!("Failed to serialize snapshot: {}", e),
                "json_serialize"
            ))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Opaque per-user document store.
pub trait SnapshotStore: Send + Sync + 'static {
    /// `Ok(None)` when the user has no document yet.
    fn load(&self, user_id: &str) -> impl Future<Output = Result<Option<SnapshotDocument>, PlanError>> + Send;

    fn save(&self, user_id: &str, document: &SnapshotDocument) -> impl Future<Output = Result<(), PlanError>> + Send;
}

enum SyncCommand {
    Save(Box<SnapshotDocument>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background save worker. Cloning shares the worker.
#[derive(Clone)]
pub struct SyncHandle {
    sender: mpsc::UnboundedSender<SyncCommand>,
}

impl SyncHandle {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn<S: SnapshotStore>(store: Arc<S>, user_id: String, debounce: Duration, metrics: Metrics) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(store, user_id, debounce, metrics, receiver));
        SyncHandle { sender }
    }

    /// Queue a document; it replaces anything still waiting for its quiet period.
    pub fn request_save(&self, document: SnapshotDocument) {
        if self.sender.send(SyncCommand::Save(Box::new(document))).is_err() {
            tracing::warn!("Sync worker stopped, snapshot not queued");
        }
    }

    /// Write any pending document now and wait for the attempt to finish.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(SyncCommand::Flush(ack)).is_err() {
            tracing::warn!("Sync worker stopped, nothing to flush");
            return;
        }
        let _ = done.await;
    }
}

async fn run_worker<S: SnapshotStore>(
    store: Arc<S>,
    user_id: String,
    debounce: Duration,
    metrics: Metrics,
    mut receiver: mpsc::UnboundedReceiver<SyncCommand>,
) {
    let mut pending: Option<SnapshotDocument> = None;
    let mut last_written: Option<String> = None;

    loop {
        let command = if pending.is_some() {
            match timeout(debounce, receiver.recv()).await {
                Ok(command) => command,
                Err(_) => {
                    // Quiet period elapsed
                    if let Some(document) = pending.take() {
                        write_snapshot(store.as_ref(), &user_id, &document, &mut last_written, &metrics).await;
                    }
                    continue;
                }
            }
        } else {
            receiver.recv().await
        };

        match command {
            Some(SyncCommand::Save(document)) => {
                pending = Some(*document);
            }
            Some(SyncCommand::Flush(ack)) => {
                if let Some(document) = pending.take() {
                    write_snapshot(store.as_ref(), &user_id, &document, &mut last_written, &metrics).await;
                }
                let _ = ack.send(());
            }
            None => {
                if let Some(document) = pending.take() {
                    write_snapshot(store.as_ref(), &user_id, &document, &mut last_written, &metrics).await;
                }
                tracing::debug!(user = %user_id, "Sync worker shutting down");
                break;
            }
        }
    }
}

async fn write_snapshot<S: SnapshotStore>(
    store: &S,
    user_id: &str,
    document: &SnapshotDocument,
    last_written: &mut Option<String>,
    metrics: &Metrics,
) {
    let fingerprint = match document.fingerprint() {
        Ok(fingerprint) => fingerprint,
        Err(e) => {
            tracing::warn!(user = %user_id, error = %e, "Failed to fingerprint snapshot");
            metrics.record_save_failure();
            return;
        }
    };
    if last_written.as_deref() == Some(fingerprint.as_str()) {
        tracing::debug!(user = %user_id, "Snapshot unchanged, save skipped");
        metrics.record_save_skipped();
        return;
    }

    match store.save(user_id, document).await {
        Ok(()) => {
            tracing::info!(user = %user_id, subjects = document.subjects.len(), "Snapshot saved");
            metrics.record_save();
            *last_written = Some(fingerprint);
        }
        Err(e) => {
            // Not retried; the next change queues a fresh save.
            tracing::warn!(user = %user_id, error = %e, "Failed to save snapshot");
            metrics.record_save_failure();
        }
    }
}
