#[cfg(test)]
mod tests {
    use crate::error::{PlanError, ScheduleError};

    #[test]
    fn test_error_creation() {
        let error = PlanError::new("Test error", "test_stage");
        assert_eq!(error.message, "Test error");
        assert_eq!(error.stage, "test_stage");
    }

    #[test]
    fn test_error_with_context() {
        let error = PlanError::new("Test error", "test_stage")
            .with_context("Additional context");
        assert!(error.context.is_some());
        assert_eq!(error.context.unwrap(), "Additional context");
    }

    #[test]
    fn test_error_display() {
        let error = PlanError::new("Test error", "test_stage")
            .with_context("context")
            .with_source("source");
        let display = format!("{}", error);
        assert!(display.contains("test_stage"));
        assert!(display.contains("Test error"));
        assert!(display.contains("context"));
    }

    #[test]
    fn test_schedule_error_lifts_with_stage() {
        let error: PlanError = ScheduleError::DateOutsideMonth {
            date: "2025-10-01".into(),
            month_key: "2025-09".into(),
        }
        .into();
        assert_eq!(error.stage, "invalid_date");
        assert!(error.message.contains("2025-10-01"));
        assert!(!error.is_persistence_failure());

        let error: PlanError = ScheduleError::UnknownSubject("bio".into()).into();
        assert_eq!(error.stage, "subject");
    }

    #[test]
    fn test_io_error_is_persistence_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: PlanError = io.into();
        assert_eq!(error.stage, "io");
        assert!(error.is_persistence_failure());
    }

    #[test]
    fn test_anyhow_error_conversion() {
        let error: PlanError = anyhow::anyhow!("boom").into();
        assert_eq!(error.stage, "unknown");
        assert_eq!(error.source.as_deref(), Some("anyhow"));
    }
}
