use std::collections::BTreeMap;
use chrono::NaiveDate;
use serde::{Serialize, Deserialize};
use crate::calendar::{enumerate_days, MonthKey};
use crate::schedule::ScheduleRepository;
use crate::subjects::SubjectId;

/// One subject planned on one day.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub subject_id: SubjectId,
    pub title: String,
    pub estimated_hours: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub subjects: Vec<DayEntry>,
    pub total_hours: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub subject_id: SubjectId,
    pub title: String,
    pub monthly_goal_hours: u32,
    pub planned_day_count: usize,
    pub estimated_hours: f64,
    pub is_completed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub month_key: MonthKey,
    pub per_day: Vec<DaySummary>,
    pub per_subject: Vec<SubjectSummary>,
}

impl MonthSummary {
    pub fn day(&self, date: NaiveDate) -> Option<&DaySummary> {
        self.per_day.iter().find(|d| d.date == date)
    }

    pub fn subject(&self, subject_id: &str) -> Option<&SubjectSummary> {
        self.per_subject.iter().find(|s| s.subject_id == subject_id)
    }

    /// Sum of estimated hours across the whole month.
    pub fn total_hours(&self) -> f64 {
        self.per_day.iter().map(|d| d.total_hours).sum()
    }
}

/// Read-only per-day and per-subject view of one month.
/// Each planned day of a subject is estimated at goal / planned-day count.
pub fn summarize(repository: &ScheduleRepository, month_key: MonthKey) -> MonthSummary {
    let mut by_day: BTreeMap<NaiveDate, Vec<DayEntry>> = enumerate_days(month_key)
        .into_iter()
        .map(|d| (d, Vec::new()))
        .collect();
    let mut per_subject = Vec::new();

    for subject in repository.subjects_in_month(month_key) {
        let schedule = subject.schedule_or_default(month_key);
        let per_day_hours = schedule.hours_per_day();

        let mut estimated = 0.0;
        let mut counted = 0;
        for date in &schedule.planned_days {
            // Dates filed under the wrong month are not part of this view.
            let Some(entries) = by_day.get_mut(date) else {
                continue;
            };
            entries.push(DayEntry {
                subject_id: subject.id.clone(),
                title: subject.title.clone(),
                estimated_hours: per_day_hours,
            });
            estimated += per_day_hours;
            counted += 1;
        }

        per_subject.push(SubjectSummary {
            subject_id: subject.id.clone(),
            title: subject.title.clone(),
            monthly_goal_hours: schedule.monthly_goal_hours,
            planned_day_count: counted,
            estimated_hours: estimated,
            is_completed: schedule.is_completed,
        });
    }

    let per_day = by_day
        .into_iter()
        .map(|(date, subjects)| {
            let total_hours = subjects.iter().map(|e| e.estimated_hours).sum();
            DaySummary { date, subjects, total_hours }
        })
        .collect();

    MonthSummary {
        month_key,
        per_day,
        per_subject,
    }
}

/// Subjects planned on a single date, e.g. today's agenda.
pub fn plan_for_day(repository: &ScheduleRepository, date: NaiveDate) -> Vec<DayEntry> {
    let month_key = MonthKey::of(date);
    repository
        .subjects()
        .iter()
        .filter(|s| s.is_planned_on(date))
        .map(|s| DayEntry {
            subject_id: s.id.clone(),
            title: s.title.clone(),
            estimated_hours: s.schedule_or_default(month_key).hours_per_day(),
        })
        .collect()
}
