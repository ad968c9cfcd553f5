//! Weighted slot allocation.
//!
//! Capacity is split into one-hour slot tokens, each subject receiving a
//! number of tokens proportional to its importance weight. Tokens are shuffled
//! and dealt onto the available days by a cursor that sweeps the month, so a
//! subject's hours spread out instead of piling onto the first days. Tokens
//! that cannot be dealt without breaking the day budget or repeating a subject
//! on a day go through a single overflow pass with the budget raised by one,
//! which may shift earlier tokens between days to avoid repeats.

use std::collections::{BTreeMap, VecDeque};
use serde::{Deserialize, Serialize};
use crate::planner::capacity::{CapacityPlan, DistributionConfig};
use crate::planner::draft::Draft;
use crate::subjects::{Subject, SubjectId};

/// Source of uniform samples in `[0, 1)`.
///
/// Every `rand::Rng` is a `RandomSource`; tests pass a seeded `StdRng`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl<R: rand::Rng> RandomSource for R {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// A subject taking part in a distribution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: SubjectId,
    pub weight: u32,
}

impl Candidate {
    pub fn new<S: Into<String>>(id: S, weight: u32) -> Self {
        Candidate { id: id.into(), weight }
    }
}

impl From<&Subject> for Candidate {
    fn from(subject: &Subject) -> Self {
        Candidate {
            id: subject.id.clone(),
            weight: subject.weight(),
        }
    }
}

/// Hours owed to each candidate: `capacity * weight / total_weight`,
/// rounded half up. Computed in integers so equal inputs always agree.
pub fn goal_hours(total_capacity: u32, candidates: &[Candidate]) -> BTreeMap<SubjectId, u32> {
    let total_weight: u64 = candidates.iter().map(|c| c.weight as u64).sum();
    candidates
        .iter()
        .map(|c| {
            let hours = if total_weight == 0 {
                0
            } else {
                let numerator = 2 * total_capacity as u64 * c.weight as u64 + total_weight;
                (numerator / (2 * total_weight)) as u32
            };
            (c.id.clone(), hours)
        })
        .collect()
}

/// In-place Fisher-Yates shuffle driven by `rng`.
pub fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = ((rng.next_f64() * (i + 1) as f64) as usize).min(i);
        items.swap(i, j);
    }
}

/// Per-day placement state, indexed like `CapacityPlan::available_days`.
struct Board {
    cells: Vec<Vec<usize>>,
}

impl Board {
    fn new(days: usize) -> Self {
        Board { cells: vec![Vec::new(); days] }
    }

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn load(&self, day: usize) -> u32 {
        self.cells[day].len() as u32
    }

    fn holds(&self, day: usize, subject: usize) -> bool {
        self.cells[day].contains(&subject)
    }

    fn count(&self, day: usize, subject: usize) -> usize {
        self.cells[day].iter().filter(|&&s| s == subject).count()
    }

    fn place(&mut self, day: usize, subject: usize) {
        self.cells[day].push(subject);
    }

    fn take(&mut self, day: usize, subject: usize) {
        if let Some(at) = self.cells[day].iter().position(|&s| s == subject) {
            self.cells[day].swap_remove(at);
        }
    }

    /// Day indices starting at `cursor` and wrapping around.
    fn from_cursor(&self, cursor: usize) -> impl Iterator<Item = usize> {
        let n = self.len();
        (0..n).map(move |k| (cursor + k) % n)
    }

    /// First day, sweeping from `cursor`, that satisfies `fits`.
    fn sweep<F: Fn(usize) -> bool>(&self, cursor: usize, fits: F) -> Option<usize> {
        self.from_cursor(cursor).find(|&d| fits(d))
    }

    /// Place `subject` on some day with load below `ceiling` without
    /// exceeding `caps` copies of any subject per day, moving already placed
    /// tokens along a chain of days if that frees a seat. Returns the day
    /// that gained a token.
    fn augment(&mut self, subject: usize, caps: &[usize], ceiling: u32, cursor: usize) -> Option<usize> {
        // parent[day] = (day the moved token came from, subject moved in)
        let mut parent: Vec<Option<(Option<usize>, usize)>> = vec![None; self.len()];
        let mut queue = VecDeque::new();
        for d in self.from_cursor(cursor) {
            if self.count(d, subject) < caps[subject] {
                parent[d] = Some((None, subject));
                queue.push_back(d);
            }
        }

        while let Some(day) = queue.pop_front() {
            if self.load(day) < ceiling {
                return Some(self.apply_chain(day, &parent));
            }
            let mut residents = self.cells[day].clone();
            residents.sort_unstable();
            residents.dedup();
            for other in residents {
                for next in self.from_cursor(cursor) {
                    if parent[next].is_none() && self.count(next, other) < caps[other] {
                        parent[next] = Some((Some(day), other));
                        queue.push_back(next);
                    }
                }
            }
        }
        None
    }

    /// Walk the chain back from `end`: each day receives the subject it was
    /// reached with and gives it up on the previous day. Only `end` grows.
    fn apply_chain(&mut self, end: usize, parent: &[Option<(Option<usize>, usize)>]) -> usize {
        let mut day = end;
        while let Some((from, subject)) = parent[day] {
            self.place(day, subject);
            match from {
                Some(previous) => {
                    self.take(previous, subject);
                    day = previous;
                }
                None => break,
            }
        }
        end
    }

    fn least_loaded(&self) -> usize {
        (0..self.len()).min_by_key(|&d| self.load(d)).unwrap_or(0)
    }
}

pub struct SlotAllocator<'a> {
    plan: &'a CapacityPlan,
    config: &'a DistributionConfig,
}

impl<'a> SlotAllocator<'a> {
    pub fn new(plan: &'a CapacityPlan, config: &'a DistributionConfig) -> Self {
        SlotAllocator { plan, config }
    }

    /// Run one full distribution. Never fails: degenerate inputs produce an
    /// empty draft, impossible packings end up in the overflow pass.
    pub fn allocate<R: RandomSource + ?Sized>(&self, candidates: &[Candidate], rng: &mut R) -> Draft {
        let candidates = dedupe(candidates);
        let mut draft = Draft::empty(
            self.plan.month_key,
            self.config.clone(),
            self.plan.available_days.clone(),
            candidates.iter().map(|c| c.id.clone()),
        );

        let total_weight: u64 = candidates.iter().map(|c| c.weight as u64).sum();
        if total_weight == 0 || self.plan.is_empty() {
            tracing::info!(
                month = %self.plan.month_key,
                candidates = candidates.len(),
                available_days = self.plan.available_days.len(),
                "Nothing to distribute"
            );
            return draft;
        }

        let goals = goal_hours(self.plan.total_capacity, &candidates);
        let slots: Vec<u32> = candidates
            .iter()
            .map(|c| goals.get(&c.id).copied().unwrap_or(0))
            .collect();
        let mut pool: Vec<usize> = Vec::with_capacity(slots.iter().sum::<u32>() as usize);
        for (index, count) in slots.iter().enumerate() {
            pool.extend(std::iter::repeat(index).take(*count as usize));
        }
        shuffle(&mut pool, rng);

        let budget = self.plan.daily_hours_budget;
        let mut board = Board::new(self.plan.available_days.len());

        // Loads only grow, so a token that finds no day in one sweep stays
        // blocked for the rest of the pass.
        let mut blocked = Vec::new();
        let mut cursor = 0;
        for subject in pool {
            let found = board.sweep(cursor, |d| board.load(d) < budget && !board.holds(d, subject));
            match found {
                Some(day) => {
                    board.place(day, subject);
                    cursor = (day + 1) % board.len();
                }
                None => blocked.push(subject),
            }
        }

        if !blocked.is_empty() {
            let overflow = self.overflow_pass(&mut board, &slots, &blocked);
            draft.forced_overflow = true;
            draft.overflow_tokens = overflow;
            tracing::warn!(
                month = %self.plan.month_key,
                overflow_tokens = overflow,
                daily_hours_budget = budget,
                "Forced overflow: some slots could not be placed within the day budget"
            );
        }

        for (day, cells) in board.cells.iter().enumerate() {
            let date = self.plan.available_days[day];
            draft.per_day.insert(
                date,
                cells.iter().map(|&s| candidates[s].id.clone()).collect(),
            );
        }
        draft.goal_hours = goals;
        draft.reindex();

        tracing::info!(
            month = %self.plan.month_key,
            candidates = candidates.len(),
            total_capacity = self.plan.total_capacity,
            total_goal_hours = draft.total_goal_hours(),
            forced_overflow = draft.forced_overflow,
            "Draft generated"
        );
        draft
    }

    /// Place every blocked token under a ceiling of budget + 1.
    ///
    /// Blocked tokens are first matched to days without repeating a subject
    /// that has no more slots than there are days; earlier placements may
    /// shift to other days to make room. Rounds repeat until one places
    /// nothing. Whatever is left is stacked under the ceiling, and on the
    /// least loaded day once every day is at the ceiling.
    fn overflow_pass(&self, board: &mut Board, slots: &[u32], blocked: &[usize]) -> u32 {
        let ceiling = self.plan.daily_hours_budget + 1;
        let days = board.len() as u32;
        // Copies of a subject allowed on one day
        let caps: Vec<usize> = slots
            .iter()
            .map(|&g| if g <= days { 1 } else { g.div_ceil(days) as usize })
            .collect();

        let mut remaining = blocked.to_vec();
        let mut cursor = 0;
        loop {
            let before = remaining.len();
            remaining.retain(|&subject| match board.augment(subject, &caps, ceiling, cursor) {
                Some(day) => {
                    cursor = (day + 1) % board.len();
                    false
                }
                None => true,
            });
            if remaining.is_empty() || remaining.len() == before {
                break;
            }
        }

        if !remaining.is_empty() {
            tracing::warn!(
                month = %self.plan.month_key,
                unmatched_tokens = remaining.len(),
                "Slots could not be matched to free days; placing by load alone"
            );
        }
        for subject in remaining {
            let day = board
                .sweep(cursor, |d| board.load(d) < ceiling)
                .unwrap_or_else(|| board.least_loaded());
            board.place(day, subject);
            cursor = (day + 1) % board.len();
        }
        blocked.len() as u32
    }
}

/// Keep the first candidate for each id.
fn dedupe(candidates: &[Candidate]) -> Vec<Candidate> {
    let mut seen = std::collections::HashSet::new();
    candidates
        .iter()
        .filter(|c| {
            let fresh = seen.insert(c.id.as_str());
            if !fresh {
                tracing::warn!(subject = %c.id, "Duplicate candidate ignored");
            }
            fresh
        })
        .cloned()
        .collect()
}
