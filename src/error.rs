use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

/// Rejections raised by the scheduling core.
/// A rejected operation never leaves the repository partially updated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid month key '{0}', expected YYYY-MM")]
    InvalidMonthKey(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("date {date} does not belong to month {month_key}")]
    DateOutsideMonth { date: String, month_key: String },
    #[error("draft was generated for {draft} but commit targets {target}")]
    MonthMismatch { draft: String, target: String },
    #[error("source and target month are both {0}")]
    SameMonth(String),
    #[error("unknown subject '{0}'")]
    UnknownSubject(String),
    #[error("subject '{0}' already exists")]
    DuplicateSubject(String),
}

impl ScheduleError {
    /// Stage label used when the rejection is lifted into a [`PlanError`].
    pub fn stage(&self) -> &'static str {
        match self {
            ScheduleError::InvalidMonthKey(_)
            | ScheduleError::InvalidDate(_)
            | ScheduleError::DateOutsideMonth { .. }
            | ScheduleError::MonthMismatch { .. }
            | ScheduleError::SameMonth(_) => "invalid_date",
            ScheduleError::UnknownSubject(_) | ScheduleError::DuplicateSubject(_) => "subject",
        }
    }
}

/// Unified application error for the planner.
/// Everything outside the pure scheduling core returns Result<T, PlanError>.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanError {
    pub message: String,
    pub stage: String,
    pub context: Option<String>,
    pub source: Option<String>,
}

impl PlanError {
    /// Create a new error with stage and message
    pub fn new<S: Into<String>>(message: S, stage: &'static str) -> Self {
        PlanError {
            message: message.into(),
            stage: stage.to_string(),
            context: None,
            source: None,
        }
    }

    /// Add additional context information
    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add source error information
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_persistence_failure(&self) -> bool {
        matches!(self.stage.as_str(), "io" | "remote" | "json_parse" | "json_serialize")
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)?;
        if let Some(ref context) = self.context {
            write!(f, " (context: {})", context)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (source: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for PlanError {}

impl From<ScheduleError> for PlanError {
    fn from(err: ScheduleError) -> Self {
        PlanError::new(err.to_string(), err.stage()).with_source("schedule")
    }
}

impl From<anyhow::Error> for PlanError {
    fn from(err: anyhow::Error) -> Self {
        PlanError::new(
            err.to_string(),
            "unknown"
        ).with_source("anyhow")
    }
}

impl From<std::io::Error> for PlanError {
    fn from(err: std::io::Error) -> Self {
        PlanError::new(
            format!("I/O error: {}", err),
            "io"
        ).with_source("std::io")
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(err: serde_json::Error) -> Self {
        PlanError::new(
            format!("JSON error: {}", err),
            "json_parse"
        ).with_source("serde_json")
    }
}

impl From<toml::de::Error> for PlanError {
    fn from(err: toml::de::Error) -> Self {
        PlanError::new(
            format!("TOML error: {}", err),
            "config"
        ).with_source("toml")
    }
}

impl From<reqwest::Error> for PlanError {
    fn from(err: reqwest::Error) -> Self {
        let mut error = PlanError::new(
            format!("Remote store error: {}", err),
            "remote"
        ).with_source("reqwest");
        if let Some(url) = err.url() {
            error = error.with_context(format!("url: {}", url));
        }
        error
    }
}
