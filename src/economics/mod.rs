//! Audited economics for one candidate battery.
//!
//! [`evaluate`] composes the cost model, savings model, optional SGIP award,
//! optional ITC and MACRS, optional degradation and the finance model. It is
//! pure and never fails: each quantity is an [`Outcome`](crate::reason::Outcome)
//! whose error side becomes reason codes on the output.

pub mod assumptions;
pub mod audit;
pub mod confidence;
pub mod cost;
pub mod degradation;
pub mod evaluator;
pub mod finance;
/// SGIP incentive award.
pub mod incentive;
pub mod savings;
/// ITC and MACRS.
pub mod tax;

pub use assumptions::EconomicsAssumptions;
pub use audit::{AuditLineItem, Reconciliation};
pub use confidence::ConfidenceTier;
pub use evaluator::{EconomicsInput, EconomicsOutput, evaluate};
pub use finance::{Cashflow, CashflowBasis};
pub use savings::SavingsBreakdown;
