use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Planner counters. All metrics are atomic counters for thread-safety.
#[derive(Clone, Default, Debug)]
pub struct Metrics {
    /// Drafts produced, regenerations included
    pub drafts_generated: Arc<AtomicU64>,
    /// Drafts that needed the overflow pass
    pub forced_overflows: Arc<AtomicU64>,
    pub commits: Arc<AtomicU64>,
    /// Operations rejected with a schedule error
    pub rejections: Arc<AtomicU64>,
    pub saves_written: Arc<AtomicU64>,
    pub saves_skipped: Arc<AtomicU64>,
    pub save_failures: Arc<AtomicU64>,
}

/// Point-in-time copy of [`Metrics`].
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub drafts_generated: u64,
    pub forced_overflows: u64,
    pub commits: u64,
    pub rejections: u64,
    pub saves_written: u64,
    pub saves_skipped: u64,
    pub save_failures: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_draft(&self, forced_overflow: bool) {
        self.drafts_generated.fetch_add(1, Ordering::Relaxed);
        if forced_overflow {
            self.forced_overflows.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save(&self) {
        self.saves_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save_skipped(&self) {
        self.saves_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save_failure(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            drafts_generated: self.drafts_generated.load(Ordering::Relaxed),
            forced_overflows: self.forced_overflows.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            saves_written: self.saves_written.load(Ordering::Relaxed),
            saves_skipped: self.saves_skipped.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
        }
    }
}
