//! Dispatch simulation of candidate batteries over a representative cycle.

/// Representative cycle selection.
pub mod cycle;
pub mod simulator;
/// Dispatch steps and per-cycle results.
pub mod types;

pub use cycle::{RepresentativeCycle, representative_cycle, synthetic_hourly_load};
pub use simulator::{DispatchSimulator, NON_TOU_PERIOD};
pub use types::{DispatchAction, DispatchCycleResult, DispatchStep};
