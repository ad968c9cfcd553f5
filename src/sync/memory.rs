use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use crate::error::PlanError;
use crate::sync::{SnapshotDocument, SnapshotStore};

/// Process-local store, used for guest sessions.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    documents: Mutex<HashMap<String, SnapshotDocument>>,
    writes: AtomicU64,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document<S: Into<String>>(user_id: S, document: SnapshotDocument) -> Self {
        let store = Self::default();
        store.documents.lock().insert(user_id.into(), document);
        store
    }

    pub fn get(&self, user_id: &str) -> Option<SnapshotDocument> {
        self.documents.lock().get(user_id).cloned()
    }

    /// Number of successful saves so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, user_id: &str) -> Result<Option<SnapshotDocument>, PlanError> {
        Ok(self.get(user_id))
    }

    async fn save(&self, user_id: &str, document: &SnapshotDocument) -> Result<(), PlanError> {
        self.documents.lock().insert(user_id.to_string(), document.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
