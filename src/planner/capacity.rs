use std::collections::BTreeSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::calendar::{enumerate_days, weekday_of, MonthKey};

/// Study-day pattern and per-day hour budget used for one distribution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionConfig {
    pub daily_hours_budget: u32,
    /// Weekday numbers, Sunday = 0. Values above 6 never match a day.
    pub active_weekdays: BTreeSet<u32>,
}

impl DistributionConfig {
    pub fn new<I: IntoIterator<Item = u32>>(daily_hours_budget: u32, active_weekdays: I) -> Self {
        DistributionConfig {
            daily_hours_budget,
            active_weekdays: active_weekdays.into_iter().collect(),
        }
    }

    /// Budget actually used by the allocator; never below one hour.
    pub fn effective_budget(&self) -> u32 {
        self.daily_hours_budget.max(1)
    }
}

impl Default for DistributionConfig {
    fn default() -> Self {
        // Monday to Friday, four hours a day
        DistributionConfig::new(4, 1..=5)
    }
}

/// Days available for study in a month and the hour capacity they add up to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityPlan {
    pub month_key: MonthKey,
    pub available_days: Vec<NaiveDate>,
    pub daily_hours_budget: u32,
    pub total_capacity: u32,
}

impl CapacityPlan {
    pub fn is_empty(&self) -> bool {
        self.available_days.is_empty()
    }
}

pub fn plan_capacity(month_key: MonthKey, config: &DistributionConfig) -> CapacityPlan {
    let daily_hours_budget = config.effective_budget();
    if config.daily_hours_budget == 0 {
        tracing::debug!(month = %month_key, "Daily hour budget of 0 clamped to 1");
    }

    let available_days: Vec<NaiveDate> = enumerate_days(month_key)
        .into_iter()
        .filter(|d| config.active_weekdays.contains(&weekday_of(*d)))
        .collect();
    let total_capacity = available_days.len() as u32 * daily_hours_budget;

    tracing::debug!(
        month = %month_key,
        available_days = available_days.len(),
        daily_hours_budget = daily_hours_budget,
        total_capacity = total_capacity,
        "Capacity planned"
    );

    CapacityPlan {
        month_key,
        available_days,
        daily_hours_budget,
        total_capacity,
    }
}
