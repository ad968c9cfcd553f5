pub mod planner;

pub use planner::{app_data_dir, get_planner_config, PlannerConfig, SyncConfig};
