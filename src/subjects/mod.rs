pub mod model;

pub use model::{ImportanceTier, Subject, SubjectId, SubjectSchedule, weight_of};
