use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use lazy_static::lazy_static;
use crate::error::PlanError;
use crate::planner::DistributionConfig;

const CONFIG_FILE: &str = "planner.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Quiet period before a batched save is written.
    pub debounce_ms: u64,
    /// Base URL of the remote document store; local files are used when unset.
    pub remote_url: Option<String>,
    /// Directory for local snapshots; defaults to the app data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            debounce_ms: 2000,
            remote_url: None,
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub user_id: String,
    pub daily_hours_budget: u32,
    pub active_weekdays: BTreeSet<u32>,
    /// Emit JSON log lines instead of the human-readable format.
    pub log_json: bool,
    pub sync: SyncConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            user_id: "local".to_string(),
            daily_hours_budget: 4,
            active_weekdays: (1..=5).collect(),
            log_json: false,
            sync: SyncConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Parse a config file; missing keys fall back to defaults.
    pub fn from_path(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlanError::new(
                format!("Failed to read config: {}", e),
                "config"
            ).with_context(format!("path: {:?}", path)))?;
        Self::from_toml(&content)
            .map_err(|e| e.with_context(format!("path: {:?}", path)))
    }

    pub fn from_toml(content: &str) -> Result<Self, PlanError> {
        Ok(toml::from_str::<PlannerConfig>(content)?)
    }

    /// Distribution settings a new draft starts from.
    pub fn distribution(&self) -> DistributionConfig {
        DistributionConfig {
            daily_hours_budget: self.daily_hours_budget,
            active_weekdays: self.active_weekdays.clone(),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.sync.data_dir.clone().unwrap_or_else(app_data_dir)
    }
}

/// Platform-specific application data directory.
pub fn app_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push("Library/Application Support/studyplan");
            return dir;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            let mut dir = PathBuf::from(appdata);
            dir.push("studyplan");
            return dir;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push(".local/share/studyplan");
            return dir;
        }
    }

    // Fallback
    PathBuf::from("data")
}

fn load_planner_config_internal() -> PlannerConfig {
    let config_path = app_data_dir().join(CONFIG_FILE);

    match PlannerConfig::from_path(&config_path) {
        Ok(config) => {
            tracing::info!(path = ?config_path, "Loaded planner config");
            config
        }
        Err(e) => {
            tracing::info!(path = ?config_path, error = %e, "Using default planner configuration");
            PlannerConfig::default()
        }
    }
}

lazy_static! {
    static ref PLANNER_CONFIG: PlannerConfig = load_planner_config_internal();
}

/// Get the cached planner configuration (loaded once on first use)
pub fn get_planner_config() -> &'static PlannerConfig {
    &PLANNER_CONFIG
}
