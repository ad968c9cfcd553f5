pub mod allocator;
pub mod capacity;
pub mod draft;

pub use allocator::{Candidate, RandomSource, SlotAllocator};
pub use capacity::{plan_capacity, CapacityPlan, DistributionConfig};
pub use draft::{toggle_draft_cell, Draft};

use crate::calendar::MonthKey;
use crate::subjects::Subject;

/// Plan capacity for the month and distribute `subjects` over it.
pub fn generate_draft<R: RandomSource + ?Sized>(
    month_key: MonthKey,
    config: &DistributionConfig,
    subjects: &[Subject],
    rng: &mut R,
) -> Draft {
    let plan = plan_capacity(month_key, config);
    let candidates: Vec<Candidate> = subjects.iter().map(Candidate::from).collect();
    SlotAllocator::new(&plan, config).allocate(&candidates, rng)
}

/// Fresh distribution from the inputs recorded on `draft`.
/// Earlier placements and manual edits are discarded.
pub fn regenerate_draft<R: RandomSource + ?Sized>(draft: &Draft, subjects: &[Subject], rng: &mut R) -> Draft {
    generate_draft(draft.month_key, &draft.config, subjects, rng)
}
