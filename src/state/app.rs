use std::sync::Arc;
use chrono::NaiveDate;
use parking_lot::RwLock;
use tokio::time::Duration;
use crate::analytics::{self, DayEntry, MonthSummary};
use crate::calendar::MonthKey;
use crate::error::{PlanError, ScheduleError};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::planner::{self, DistributionConfig, Draft, RandomSource};
use crate::schedule::{ScheduleRepository, ScheduleUpdate, ToggleOutcome};
use crate::subjects::{ImportanceTier, Subject};
use crate::sync::{SnapshotDocument, SnapshotStore, SyncHandle};

type Extra = serde_json::Map<String, serde_json::Value>;

/// Planner state for one user.
/// All mutable state is centralized here and passed explicitly to callers.
/// Every successful mutation queues a snapshot save; drafts stay local until
/// committed.
#[derive(Clone)]
pub struct AppState {
    user_id: String,
    repository: Arc<RwLock<ScheduleRepository>>,
    /// Uncommitted distribution, if one is being edited
    draft: Arc<RwLock<Option<Draft>>>,
    /// Document keys owned by other layers, written back untouched
    extra: Arc<RwLock<Extra>>,
    metrics: Metrics,
    sync: Option<SyncHandle>,
}

impl AppState {
    /// State without persistence (guest mode).
    pub fn local<S: Into<String>>(user_id: S) -> Self {
        Self::from_parts(user_id.into(), ScheduleRepository::new(), Extra::new(), Metrics::new(), None)
    }

    /// Load the user's snapshot from `store` and save every change back to it.
    /// Must be called inside a tokio runtime.
    pub async fn load<S: SnapshotStore>(store: Arc<S>, user_id: &str, debounce: Duration) -> Result<Self, PlanError> {
        let (repository, extra) = match store.load(user_id).await {
            Ok(Some(document)) => {
                tracing::info!(user = %user_id, subjects = document.subjects.len(), "Snapshot loaded");
                document.into_parts()
            }
            Ok(None) => {
                tracing::info!(user = %user_id, "No snapshot yet, starting empty");
                (ScheduleRepository::new(), Extra::new())
            }
            Err(e) => {
                tracing::warn!(user = %user_id, error = %e, "Failed to load snapshot");
                return Err(e.with_context(format!("user: {}", user_id)));
            }
        };

        let metrics = Metrics::new();
        let sync = SyncHandle::spawn(store, user_id.to_string(), debounce, metrics.clone());
        Ok(Self::from_parts(user_id.to_string(), repository, extra, metrics, Some(sync)))
    }

    fn from_parts(
        user_id: String,
        repository: ScheduleRepository,
        extra: Extra,
        metrics: Metrics,
        sync: Option<SyncHandle>,
    ) -> Self {
        AppState {
            user_id,
            repository: Arc::new(RwLock::new(repository)),
            draft: Arc::new(RwLock::new(None)),
            extra: Arc::new(RwLock::new(extra)),
            metrics,
            sync,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Copy of the committed state.
    pub fn snapshot(&self) -> ScheduleRepository {
        self.repository.read().clone()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Apply `f` to the repository under the write lock and queue a save
    /// when it succeeds.
    fn mutate<T, F>(&self, f: F) -> Result<T, ScheduleError>
    where
        F: FnOnce(&mut ScheduleRepository) -> Result<T, ScheduleError>,
    {
        let result = {
            let mut repository = self.repository.write();
            f(&mut repository)
        };
        match result {
            Ok(value) => {
                self.persist();
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Operation rejected");
                self.metrics.record_rejection();
                Err(e)
            }
        }
    }

    fn persist(&self) {
        let Some(sync) = &self.sync else {
            return;
        };
        let document = {
            let repository = self.repository.read();
            SnapshotDocument::from_repository(&repository, self.extra.read().clone())
        };
        sync.request_save(document);
    }

    /// Write any queued snapshot now.
    pub async fn flush(&self) {
        if let Some(sync) = &self.sync {
            sync.flush().await;
        }
    }

    // --- subjects ---

    pub fn add_subject(&self, subject: Subject) -> Result<(), ScheduleError> {
        self.mutate(|r| r.add_subject(subject))
    }

    pub fn remove_subject(&self, subject_id: &str) -> Option<Subject> {
        self.mutate(|r| Ok(r.remove_subject(subject_id))).ok().flatten()
    }

    pub fn set_importance(&self, subject_id: &str, importance: ImportanceTier) -> Result<(), ScheduleError> {
        self.mutate(|r| r.set_importance(subject_id, importance))
    }

    pub fn toggle_month(&self, subject_id: &str, month_key: MonthKey) -> Result<bool, ScheduleError> {
        self.mutate(|r| r.toggle_month(subject_id, month_key))
    }

    // --- drafts ---

    /// Distribute the subjects enrolled in `month_key` and keep the result as
    /// the current draft, replacing any previous one.
    pub fn generate_draft<R: RandomSource + ?Sized>(&self, month_key: MonthKey, config: &DistributionConfig, rng: &mut R) -> Draft {
        let subjects: Vec<Subject> = {
            let repository = self.repository.read();
            repository.subjects_in_month(month_key).into_iter().cloned().collect()
        };
        let draft = planner::generate_draft(month_key, config, &subjects, rng);
        self.metrics.record_draft(draft.forced_overflow);
        *self.draft.write() = Some(draft.clone());
        draft
    }

    /// Fresh shuffle with the current draft's month and configuration.
    pub fn regenerate_draft<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<Draft, PlanError> {
        let (month_key, config) = {
            let draft = self.draft.read();
            let draft = draft.as_ref().ok_or_else(no_draft)?;
            (draft.month_key, draft.config.clone())
        };
        Ok(self.generate_draft(month_key, &config, rng))
    }

    pub fn current_draft(&self) -> Option<Draft> {
        self.draft.read().clone()
    }

    pub fn discard_draft(&self) -> Option<Draft> {
        self.draft.write().take()
    }

    pub fn toggle_draft_cell(&self, date: NaiveDate, subject_id: &str) -> Result<Draft, PlanError> {
        let mut guard = self.draft.write();
        let draft = guard.as_mut().ok_or_else(no_draft)?;
        draft.toggle_cell(date, subject_id)?;
        Ok(draft.clone())
    }

    pub fn set_draft_goal(&self, subject_id: &str, hours: u32) -> Result<Draft, PlanError> {
        let mut guard = self.draft.write();
        let draft = guard.as_mut().ok_or_else(no_draft)?;
        draft.set_goal_hours(subject_id, hours)?;
        Ok(draft.clone())
    }

    /// Commit the current draft into its month. The draft is kept when the
    /// commit is rejected.
    pub fn commit_draft(&self) -> Result<usize, PlanError> {
        // Held until the draft is cleared so edits land before the commit or fail after it
        let mut guard = self.draft.write();
        let draft = guard.as_ref().ok_or_else(no_draft)?;
        let written = self.mutate(|r| r.commit_draft(draft.month_key, draft))?;
        guard.take();
        self.metrics.record_commit();
        Ok(written)
    }

    // --- committed schedules ---

    pub fn toggle_day(&self, subject_id: &str, month_key: MonthKey, date: NaiveDate) -> Result<ToggleOutcome, ScheduleError> {
        self.mutate(|r| r.toggle_day(subject_id, month_key, date))
    }

    pub fn update_schedule(&self, subject_id: &str, month_key: MonthKey, update: ScheduleUpdate) -> Result<bool, ScheduleError> {
        self.mutate(|r| r.update_schedule(subject_id, month_key, update))
    }

    pub fn clear_schedule(&self, subject_id: &str, month_key: MonthKey) -> Result<bool, ScheduleError> {
        self.mutate(|r| r.clear_schedule(subject_id, month_key).map(|s| s.is_some()))
    }

    pub fn duplicate_month(&self, source: MonthKey, target: MonthKey) -> Result<usize, ScheduleError> {
        self.mutate(|r| r.duplicate_month(source, target))
    }

    pub fn add_active_month(&self, month_key: MonthKey) -> bool {
        self.mutate(|r| Ok(r.add_active_month(month_key))).unwrap_or(false)
    }

    pub fn remove_active_month(&self, month_key: MonthKey) -> bool {
        self.mutate(|r| Ok(r.remove_active_month(month_key))).unwrap_or(false)
    }

    // --- reports ---

    pub fn summarize(&self, month_key: MonthKey) -> MonthSummary {
        analytics::summarize(&self.repository.read(), month_key)
    }

    pub fn plan_for_day(&self, date: NaiveDate) -> Vec<DayEntry> {
        analytics::plan_for_day(&self.repository.read(), date)
    }
}

fn no_draft() -> PlanError {
    PlanError::new("No draft to work on; generate one first", "draft")
}
