//! Calendar primitives: month keys, day enumeration, weekday numbering.
//!
//! Weekdays use the Sunday = 0 convention throughout the planner.

use std::fmt;
use std::str::FromStr;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use crate::error::ScheduleError;

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, ScheduleError> {
        // Four-digit years only, so every key round-trips through its string form
        if !(0..=9999).contains(&year) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ScheduleError::InvalidMonthKey(format!("{:04}-{:02}", year, month)));
        }
        Ok(MonthKey { year, month })
    }

    /// Month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        MonthKey { year: date.year(), month: date.month() }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Validated on construction.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn next(&self) -> MonthKey {
        if self.month == 12 {
            MonthKey { year: self.year + 1, month: 1 }
        } else {
            MonthKey { year: self.year, month: self.month + 1 }
        }
    }

    pub fn days_in_month(&self) -> u32 {
        let first = self.first_day();
        let next_first = self.next().first_day();
        (next_first - first).num_days() as u32
    }

    pub fn last_day(&self) -> NaiveDate {
        self.day_clamped(self.days_in_month())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// The given day-of-month in this month, clamped to the month's last day.
    pub fn day_clamped(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days_in_month());
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or_else(|| self.first_day())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidMonthKey(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthKey::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for MonthKey {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// Every calendar day of the month, in order.
pub fn enumerate_days(month_key: MonthKey) -> Vec<NaiveDate> {
    month_key
        .first_day()
        .iter_days()
        .take(month_key.days_in_month() as usize)
        .collect()
}

/// Weekday number with Sunday = 0 .. Saturday = 6.
pub fn weekday_of(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidDate(s.to_string()))
}

/// Reject `date` unless it falls inside `month_key`.
pub fn ensure_in_month(month_key: MonthKey, date: NaiveDate) -> Result<(), ScheduleError> {
    if month_key.contains(date) {
        Ok(())
    } else {
        Err(ScheduleError::DateOutsideMonth {
            date: format_date(date),
            month_key: month_key.to_string(),
        })
    }
}
