#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crate::calendar::{enumerate_days, ensure_in_month, format_date, parse_date, weekday_of, MonthKey};
    use crate::error::ScheduleError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_key_parse_and_display() {
        let key: MonthKey = "2025-09".parse().unwrap();
        assert_eq!(key.year(), 2025);
        assert_eq!(key.month(), 9);
        assert_eq!(key.to_string(), "2025-09");
    }

    #[test]
    fn test_month_key_rejects_malformed() {
        for bad in ["2025-9", "2025-13", "2025-00", "25-09", "2025/09", "", "2025-09-01"] {
            assert!(
                matches!(bad.parse::<MonthKey>(), Err(ScheduleError::InvalidMonthKey(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_month_key_serializes_as_string() {
        let key = MonthKey::new(2025, 9).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2025-09\"");
        let back: MonthKey = serde_json::from_str("\"2025-09\"").unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<MonthKey>("\"2025-9\"").is_err());
    }

    #[test]
    fn test_days_in_month_handles_leap_years() {
        assert_eq!(MonthKey::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(MonthKey::new(2025, 2).unwrap().days_in_month(), 28);
        assert_eq!(MonthKey::new(2025, 12).unwrap().days_in_month(), 31);
        assert_eq!(MonthKey::new(2025, 12).unwrap().next(), MonthKey::new(2026, 1).unwrap());
    }

    #[test]
    fn test_enumerate_days_covers_month_in_order() {
        let days = enumerate_days(MonthKey::new(2025, 9).unwrap());
        assert_eq!(days.len(), 30);
        assert_eq!(days[0], date(2025, 9, 1));
        assert_eq!(days[29], date(2025, 9, 30));
        assert!(days.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_weekday_of_uses_sunday_zero() {
        assert_eq!(weekday_of(date(2025, 9, 7)), 0); // Sunday
        assert_eq!(weekday_of(date(2025, 9, 1)), 1); // Monday
        assert_eq!(weekday_of(date(2025, 9, 6)), 6); // Saturday
    }

    #[test]
    fn test_day_clamped_to_short_month() {
        let feb = MonthKey::new(2025, 2).unwrap();
        assert_eq!(feb.day_clamped(31), date(2025, 2, 28));
        assert_eq!(feb.day_clamped(15), date(2025, 2, 15));
        assert_eq!(feb.last_day(), date(2025, 2, 28));
    }

    #[test]
    fn test_parse_and_format_date() {
        let d = parse_date("2025-09-07").unwrap();
        assert_eq!(d, date(2025, 9, 7));
        assert_eq!(format_date(d), "2025-09-07");
        assert!(matches!(parse_date("2025-02-30"), Err(ScheduleError::InvalidDate(_))));
        assert!(matches!(parse_date("yesterday"), Err(ScheduleError::InvalidDate(_))));
    }

    #[test]
    fn test_ensure_in_month() {
        let key = MonthKey::new(2025, 9).unwrap();
        assert!(ensure_in_month(key, date(2025, 9, 30)).is_ok());
        assert!(matches!(
            ensure_in_month(key, date(2025, 10, 1)),
            Err(ScheduleError::DateOutsideMonth { .. })
        ));
    }
}
