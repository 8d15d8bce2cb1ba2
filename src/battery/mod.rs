//! Battery parameters, candidate sizes and the candidate ladder.

/// Candidate sizes and hard sizing constraints.
pub mod candidate;
pub mod generator;
/// SOC-bounded energy store.
pub mod storage;

pub use candidate::{AppliedConstraint, BatteryCandidate, HardConstraints, candidate_id};
pub use generator::{CandidateGenerator, CandidateList, CandidateRejection, SizingBand};
pub use storage::{BatteryParams, BatteryTechnology, InvalidBattery, StorageState};
