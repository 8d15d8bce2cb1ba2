//! Typed site signals supplied by intake collaborators.

/// Billing cycles, determinants and DR readiness.
pub mod billing;
/// Interval points and load summaries.
pub mod interval;
/// TOU windows and tariff price signals.
pub mod tou;

pub use billing::{BillingCycle, BillingDeterminants, CycleDeterminants, DrReadiness};
pub use interval::{IntervalPoint, IntervalSummary};
pub use tou::{DayFilter, PriceSource, SupplyType, TariffSignals, TouPriceTable, TouPriceWindow};
