//! Per-subject, per-month schedule state.
//!
//! `ScheduleRepository` is the only mutable piece of the planner. Every
//! operation validates its inputs before touching anything, so a rejected
//! call leaves the snapshot exactly as it was.

use std::collections::BTreeSet;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use crate::calendar::{ensure_in_month, MonthKey};
use crate::error::ScheduleError;
use crate::planner::{Candidate, Draft};
use crate::subjects::{ImportanceTier, Subject, SubjectSchedule};

/// Result of flipping a single planned day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The subject has no schedule for that month; nothing was created.
    NoSchedule,
}

/// Partial overwrite of a schedule, independent of its planned days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdate {
    pub monthly_goal_hours: Option<u32>,
    pub notes: Option<String>,
    pub is_completed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRepository {
    #[serde(default)]
    subjects: Vec<Subject>,
    #[serde(default)]
    active_schedule_months: BTreeSet<MonthKey>,
}

impl ScheduleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(subjects: Vec<Subject>, active_schedule_months: BTreeSet<MonthKey>) -> Self {
        ScheduleRepository {
            subjects,
            active_schedule_months,
        }
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn subject(&self, subject_id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == subject_id)
    }

    fn subject_mut(&mut self, subject_id: &str) -> Result<&mut Subject, ScheduleError> {
        self.subjects
            .iter_mut()
            .find(|s| s.id == subject_id)
            .ok_or_else(|| ScheduleError::UnknownSubject(subject_id.to_string()))
    }

    // --- subject hooks used by the CRUD layer ---

    pub fn add_subject(&mut self, subject: Subject) -> Result<(), ScheduleError> {
        if self.subject(&subject.id).is_some() {
            return Err(ScheduleError::DuplicateSubject(subject.id));
        }
        self.subjects.push(subject);
        Ok(())
    }

    /// Remove a subject together with all of its schedules.
    pub fn remove_subject(&mut self, subject_id: &str) -> Option<Subject> {
        let index = self.subjects.iter().position(|s| s.id == subject_id)?;
        Some(self.subjects.remove(index))
    }

    pub fn set_importance(&mut self, subject_id: &str, importance: ImportanceTier) -> Result<(), ScheduleError> {
        self.subject_mut(subject_id)?.importance = importance;
        Ok(())
    }

    // --- reads ---

    /// Schedule for the pair, or the zero value when absent.
    pub fn schedule(&self, subject_id: &str, month_key: MonthKey) -> SubjectSchedule {
        self.subject(subject_id)
            .map(|s| s.schedule_or_default(month_key))
            .unwrap_or_default()
    }

    pub fn has_schedule(&self, subject_id: &str, month_key: MonthKey) -> bool {
        self.subject(subject_id)
            .map(|s| s.schedules.contains_key(&month_key))
            .unwrap_or(false)
    }

    /// Subjects enrolled in the month, in repository order.
    pub fn subjects_in_month(&self, month_key: MonthKey) -> Vec<&Subject> {
        self.subjects
            .iter()
            .filter(|s| s.schedules.contains_key(&month_key))
            .collect()
    }

    /// Distribution candidates for the month: the enrolled subjects.
    pub fn candidates(&self, month_key: MonthKey) -> Vec<Candidate> {
        self.subjects_in_month(month_key)
            .into_iter()
            .map(Candidate::from)
            .collect()
    }

    // --- writes ---

    /// Write a draft's goals and planned days into the month.
    /// `isCompleted` and `notes` of existing schedules are preserved; subjects
    /// the draft does not mention are left alone. Returns how many subjects
    /// were written.
    pub fn commit_draft(&mut self, month_key: MonthKey, draft: &Draft) -> Result<usize, ScheduleError> {
        if draft.month_key != month_key {
            return Err(ScheduleError::MonthMismatch {
                draft: draft.month_key.to_string(),
                target: month_key.to_string(),
            });
        }
        for date in draft.per_day.keys().chain(draft.planned_days.values().flatten()) {
            ensure_in_month(month_key, *date)?;
        }

        let mut written = 0;
        for (subject_id, goal) in &draft.goal_hours {
            let Some(subject) = self.subjects.iter_mut().find(|s| &s.id == subject_id) else {
                tracing::warn!(subject = %subject_id, month = %month_key, "Draft subject no longer exists, skipped");
                continue;
            };
            let schedule = subject.schedules.entry(month_key).or_default();
            schedule.monthly_goal_hours = *goal;
            schedule.planned_days = draft.planned_days.get(subject_id).cloned().unwrap_or_default();
            written += 1;
        }

        tracing::info!(month = %month_key, subjects = written, "Draft committed");
        Ok(written)
    }

    /// Flip one planned day. Does nothing when the subject has no schedule for
    /// the month: schedules are only created by commit or enrolment.
    pub fn toggle_day(&mut self, subject_id: &str, month_key: MonthKey, date: NaiveDate) -> Result<ToggleOutcome, ScheduleError> {
        ensure_in_month(month_key, date)?;
        let subject = self.subject_mut(subject_id)?;
        let Some(schedule) = subject.schedules.get_mut(&month_key) else {
            tracing::debug!(subject = %subject_id, month = %month_key, "Toggle ignored, no schedule");
            return Ok(ToggleOutcome::NoSchedule);
        };
        if schedule.planned_days.remove(&date) {
            Ok(ToggleOutcome::Removed)
        } else {
            schedule.planned_days.insert(date);
            Ok(ToggleOutcome::Added)
        }
    }

    /// Overwrite goal, notes or completion of an existing schedule.
    /// Returns false when there is no schedule to update.
    pub fn update_schedule(&mut self, subject_id: &str, month_key: MonthKey, update: ScheduleUpdate) -> Result<bool, ScheduleError> {
        let subject = self.subject_mut(subject_id)?;
        let Some(schedule) = subject.schedules.get_mut(&month_key) else {
            return Ok(false);
        };
        if let Some(hours) = update.monthly_goal_hours {
            schedule.monthly_goal_hours = hours;
        }
        if let Some(notes) = update.notes {
            schedule.notes = notes;
        }
        if let Some(done) = update.is_completed {
            schedule.is_completed = done;
        }
        Ok(true)
    }

    /// Enrol the subject in the month with an empty schedule, or drop its
    /// schedule if already enrolled. Returns whether it is enrolled afterwards.
    pub fn toggle_month(&mut self, subject_id: &str, month_key: MonthKey) -> Result<bool, ScheduleError> {
        let subject = self.subject_mut(subject_id)?;
        if subject.schedules.remove(&month_key).is_some() {
            Ok(false)
        } else {
            subject.schedules.insert(month_key, SubjectSchedule::default());
            Ok(true)
        }
    }

    pub fn clear_schedule(&mut self, subject_id: &str, month_key: MonthKey) -> Result<Option<SubjectSchedule>, ScheduleError> {
        Ok(self.subject_mut(subject_id)?.schedules.remove(&month_key))
    }

    /// Copy every schedule filed under `source` to `target`.
    ///
    /// Goal hours and notes are copied verbatim, completion is reset, and each
    /// planned day moves to the same day-of-month in the target, clamped to
    /// the target's last day. Clamping can merge days in shorter months.
    pub fn duplicate_month(&mut self, source: MonthKey, target: MonthKey) -> Result<usize, ScheduleError> {
        if source == target {
            return Err(ScheduleError::SameMonth(source.to_string()));
        }

        let mut copied = 0;
        for subject in self.subjects.iter_mut() {
            let Some(original) = subject.schedules.get(&source) else {
                continue;
            };
            let planned_days: BTreeSet<NaiveDate> = original
                .planned_days
                .iter()
                .map(|d| target.day_clamped(d.day()))
                .collect();
            let copy = SubjectSchedule {
                monthly_goal_hours: original.monthly_goal_hours,
                planned_days,
                is_completed: false,
                notes: original.notes.clone(),
            };
            if copy.planned_days.len() < original.planned_days.len() {
                tracing::debug!(
                    subject = %subject.id,
                    source = %source,
                    target = %target,
                    "Planned days merged by day-of-month clamping"
                );
            }
            subject.schedules.insert(target, copy);
            copied += 1;
        }

        tracing::info!(source = %source, target = %target, subjects = copied, "Month duplicated");
        Ok(copied)
    }

    // --- active months view ---

    pub fn active_months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.active_schedule_months.iter().copied()
    }

    pub fn add_active_month(&mut self, month_key: MonthKey) -> bool {
        self.active_schedule_months.insert(month_key)
    }

    /// Hide a month from the active view. Its schedules stay in place.
    pub fn remove_active_month(&mut self, month_key: MonthKey) -> bool {
        self.active_schedule_months.remove(&month_key)
    }
}
