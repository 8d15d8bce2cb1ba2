//! Billing cycles, billing determinants and demand-response readiness.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A billing period `[start, end)` evaluated in a local timezone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingCycle {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: Tz,
}

impl BillingCycle {
    /// A synthetic window of `days` starting at `start`.
    pub fn synthetic(start: DateTime<Utc>, days: i64, timezone: Tz) -> Self {
        Self {
            label: format!("synthetic-{}d-{}", days, start.format("%Y-%m-%d")),
            start,
            end: start + Duration::days(days),
            timezone,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }

    /// Cycle length in fractional days.
    pub fn days(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 86_400.0
    }
}

/// Determinants billed for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleDeterminants {
    pub cycle: BillingCycle,
    /// Whether the cycle has closed and been fully billed.
    pub complete: bool,
    pub billed_demand_kw: Option<f64>,
}

/// Site-level billing determinants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingDeterminants {
    pub cycles: Vec<CycleDeterminants>,
    /// Most recent billed demand (kW).
    pub billed_demand_kw: Option<f64>,
    /// Tariff indicates a demand ratchet applies.
    pub ratchet_method_indicated: bool,
    /// Current ratchet demand (kW).
    pub ratchet_demand_kw: Option<f64>,
    /// Trailing monthly peaks used by the ratchet (kW).
    pub ratchet_history_kw: Vec<f64>,
    /// Share of the historical peak held as a floor (e.g. 0.8).
    pub ratchet_percent: Option<f64>,
    /// Caller explicitly opted in to ratchet-avoidance savings.
    pub ratchet_savings_eligible: bool,
}

impl BillingDeterminants {
    /// The most recent cycle flagged complete.
    pub fn latest_complete_cycle(&self) -> Option<&CycleDeterminants> {
        self.cycles
            .iter()
            .filter(|c| c.complete)
            .max_by(|a, b| {
                a.cycle
                    .end
                    .cmp(&b.cycle.end)
                    .then_with(|| b.cycle.label.cmp(&a.cycle.label))
            })
    }

    pub fn has_ratchet_history(&self) -> bool {
        !self.ratchet_history_kw.is_empty()
    }
}

/// Demand-response program readiness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrReadiness {
    /// Explicit eligibility; DR savings are never inferred.
    pub eligible: bool,
    /// Capacity payment ($/kW-yr).
    pub payment_per_kw_year: Option<f64>,
    /// Share of battery kW committed to the program.
    pub committed_fraction: f64,
}
