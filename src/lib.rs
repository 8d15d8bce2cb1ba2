//! Behind-the-meter battery sizing engine.
//!
//! Candidate sizes are generated from a site's load, dispatched greedily against
//! TOU prices over a representative billing cycle, costed with an audited
//! economics pipeline, then gated, scored and ranked into a [`DecisionPack`].
//!
//! [`DecisionPack`]: decision::DecisionPack

pub mod battery;
pub mod cli;
pub mod config;
pub mod decision;
pub mod dispatch;
pub mod economics;
pub mod io;
pub mod reason;
/// Typed site signals: intervals, TOU prices, billing.
pub mod site;
pub mod synth;
pub mod telemetry;
pub mod units;
