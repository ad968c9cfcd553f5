use std::collections::{BTreeMap, BTreeSet};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::calendar::{ensure_in_month, MonthKey};
use crate::error::ScheduleError;
use crate::planner::capacity::DistributionConfig;
use crate::subjects::SubjectId;

/// Uncommitted distribution for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub month_key: MonthKey,
    pub config: DistributionConfig,
    pub available_days: Vec<NaiveDate>,
    /// Subjects per date, sorted by id. A subject only repeats on a date
    /// when the overflow pass had to stack it.
    pub per_day: BTreeMap<NaiveDate, Vec<SubjectId>>,
    pub goal_hours: BTreeMap<SubjectId, u32>,
    pub planned_days: BTreeMap<SubjectId, BTreeSet<NaiveDate>>,
    pub forced_overflow: bool,
    pub overflow_tokens: u32,
    /// Copies a stacked subject had on a date when it was toggled off, so
    /// toggling it back on restores the stack.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stacked_removals: BTreeMap<NaiveDate, BTreeMap<SubjectId, usize>>,
}

impl Draft {
    /// Draft with every available day empty and every subject at zero hours.
    pub fn empty<I>(month_key: MonthKey, config: DistributionConfig, available_days: Vec<NaiveDate>, subjects: I) -> Self
    where
        I: IntoIterator<Item = SubjectId>,
    {
        let per_day = available_days.iter().map(|d| (*d, Vec::new())).collect();
        let mut goal_hours = BTreeMap::new();
        let mut planned_days = BTreeMap::new();
        for id in subjects {
            goal_hours.insert(id.clone(), 0);
            planned_days.insert(id, BTreeSet::new());
        }
        Draft {
            month_key,
            config,
            available_days,
            per_day,
            goal_hours,
            planned_days,
            forced_overflow: false,
            overflow_tokens: 0,
            stacked_removals: BTreeMap::new(),
        }
    }

    pub fn subjects_on(&self, date: NaiveDate) -> &[SubjectId] {
        self.per_day.get(&date).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Hours placed on a date (one per slot token).
    pub fn load_on(&self, date: NaiveDate) -> usize {
        self.subjects_on(date).len()
    }

    pub fn contains(&self, subject_id: &str) -> bool {
        self.goal_hours.contains_key(subject_id)
    }

    pub fn total_goal_hours(&self) -> u32 {
        self.goal_hours.values().sum()
    }

    /// Flip a (date, subject) cell. A present subject is removed from the date
    /// entirely; an absent one is inserted in id order, with as many copies as
    /// it had when it was last toggled off there. Goal hours are left alone.
    pub fn toggle_cell(&mut self, date: NaiveDate, subject_id: &str) -> Result<(), ScheduleError> {
        ensure_in_month(self.month_key, date)?;
        if !self.contains(subject_id) {
            return Err(ScheduleError::UnknownSubject(subject_id.to_string()));
        }

        let copies = self.subjects_on(date).iter().filter(|id| *id == subject_id).count();
        if copies > 0 {
            let is_available = self.available_days.contains(&date);
            if let Some(cell) = self.per_day.get_mut(&date) {
                cell.retain(|id| id != subject_id);
                if cell.is_empty() && !is_available {
                    self.per_day.remove(&date);
                }
            }
            if let Some(days) = self.planned_days.get_mut(subject_id) {
                days.remove(&date);
            }
            if copies > 1 {
                self.stacked_removals
                    .entry(date)
                    .or_default()
                    .insert(subject_id.to_string(), copies);
            }
        } else {
            let restored = self.take_stacked_removal(date, subject_id);
            let cell = self.per_day.entry(date).or_default();
            let at = cell.partition_point(|id| id.as_str() < subject_id);
            cell.splice(at..at, std::iter::repeat(subject_id.to_string()).take(restored));
            self.planned_days
                .entry(subject_id.to_string())
                .or_default()
                .insert(date);
        }
        Ok(())
    }

    /// Copies to restore for a subject toggled back on; one unless it was
    /// stacked on that date.
    fn take_stacked_removal(&mut self, date: NaiveDate, subject_id: &str) -> usize {
        let Some(removed) = self.stacked_removals.get_mut(&date) else {
            return 1;
        };
        let copies = removed.remove(subject_id).unwrap_or(1);
        if removed.is_empty() {
            self.stacked_removals.remove(&date);
        }
        copies
    }

    /// Manual override of a subject's goal; placements are not touched.
    pub fn set_goal_hours(&mut self, subject_id: &str, hours: u32) -> Result<(), ScheduleError> {
        match self.goal_hours.get_mut(subject_id) {
            Some(goal) => {
                *goal = hours;
                Ok(())
            }
            None => Err(ScheduleError::UnknownSubject(subject_id.to_string())),
        }
    }

    /// Sort every day's list and rebuild `planned_days` from `per_day`.
    pub(crate) fn reindex(&mut self) {
        for ids in self.per_day.values_mut() {
            ids.sort();
        }
        for days in self.planned_days.values_mut() {
            days.clear();
        }
        for (date, ids) in &self.per_day {
            for id in ids {
                self.planned_days.entry(id.clone()).or_default().insert(*date);
            }
        }
    }
}

/// Value-style wrapper around [`Draft::toggle_cell`].
pub fn toggle_draft_cell(mut draft: Draft, date: NaiveDate, subject_id: &str) -> Result<Draft, ScheduleError> {
    draft.toggle_cell(date, subject_id)?;
    Ok(draft)
}
