use serde::{Serialize, Deserialize};
use std::collections::{BTreeMap, BTreeSet};
use chrono::NaiveDate;
use crate::calendar::MonthKey;

pub type SubjectId = String;

/// Priority level of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportanceTier {
    Low,
    #[default]
    Medium,
    High,
}

/// Integer weight used for proportional allocation.
pub fn weight_of(tier: ImportanceTier) -> u32 {
    match tier {
        ImportanceTier::Low => 1,
        ImportanceTier::Medium => 2,
        ImportanceTier::High => 3,
    }
}

/// Plan for one subject in one month.
/// A missing entry behaves exactly like `SubjectSchedule::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSchedule {
    #[serde(default, alias = "monthlyGoal")]
    pub monthly_goal_hours: u32,
    #[serde(default)]
    pub planned_days: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub notes: String,
}

impl SubjectSchedule {
    pub fn with_goal(monthly_goal_hours: u32) -> Self {
        SubjectSchedule {
            monthly_goal_hours,
            ..Default::default()
        }
    }

    /// Hours expected per planned day, 0 when nothing is planned.
    pub fn hours_per_day(&self) -> f64 {
        if self.planned_days.is_empty() {
            0.0
        } else {
            self.monthly_goal_hours as f64 / self.planned_days.len() as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub title: String,
    #[serde(default)]
    pub importance: ImportanceTier,
    #[serde(default)]
    pub schedules: BTreeMap<MonthKey, SubjectSchedule>,
    /// Fields owned by the subject CRUD layer (subtopics, colour, ...),
    /// carried through load/save untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Subject {
    pub fn new<I: Into<String>, T: Into<String>>(id: I, title: T, importance: ImportanceTier) -> Self {
        Subject {
            id: id.into(),
            title: title.into(),
            importance,
            schedules: BTreeMap::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn weight(&self) -> u32 {
        weight_of(self.importance)
    }

    pub fn schedule(&self, month_key: MonthKey) -> Option<&SubjectSchedule> {
        self.schedules.get(&month_key)
    }

    /// Schedule for the month, or the zero value when none exists.
    pub fn schedule_or_default(&self, month_key: MonthKey) -> SubjectSchedule {
        self.schedules.get(&month_key).cloned().unwrap_or_default()
    }

    pub fn is_planned_on(&self, date: NaiveDate) -> bool {
        self.schedules
            .get(&MonthKey::of(date))
            .map(|s| s.planned_days.contains(&date))
            .unwrap_or(false)
    }
}
