pub mod analytics;
pub mod calendar;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod planner;
pub mod schedule;
pub mod state;
pub mod subjects;
pub mod sync;

pub use analytics::{plan_for_day, summarize, MonthSummary};
pub use calendar::MonthKey;
pub use error::{PlanError, ScheduleError};
pub use planner::{
    generate_draft, plan_capacity, regenerate_draft, toggle_draft_cell, CapacityPlan, DistributionConfig, Draft,
    RandomSource,
};
pub use schedule::{ScheduleRepository, ScheduleUpdate, ToggleOutcome};
pub use state::AppState;
pub use subjects::{ImportanceTier, Subject, SubjectSchedule};


use std::sync::Arc;
use tokio::time::Duration;
use crate::config::PlannerConfig;
use crate::sync::{FileSnapshotStore, HttpSnapshotStore};

/// Start the planner for the configured user: logging first, then the
/// snapshot from the remote store when one is configured, else from disk.
pub async fn start(config: &PlannerConfig) -> Result<AppState, PlanError> {
    logging::init_logging(config.log_json);
    tracing::info!(user = %config.user_id, "studyplan starting");

    let debounce = Duration::from_millis(config.sync.debounce_ms);
    let state = match &config.sync.remote_url {
        Some(url) => {
            tracing::info!(url = %url, "Using remote snapshot store");
            AppState::load(Arc::new(HttpSnapshotStore::new(url.clone())), &config.user_id, debounce).await?
        }
        None => {
            let dir = config.data_dir();
            tracing::info!(path = ?dir, "Using local snapshot store");
            AppState::load(Arc::new(FileSnapshotStore::new(dir)), &config.user_id, debounce).await?
        }
    };

    Ok(state)
}
