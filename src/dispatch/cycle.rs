//! Representative billing cycle selection and synthetic load fallback.

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::reason::{Diagnostics, missing, warn};
use crate::site::{BillingCycle, BillingDeterminants, IntervalPoint, IntervalSummary};

/// Length of a synthetic cycle when no billed cycle is available.
pub const SYNTHETIC_CYCLE_DAYS: i64 = 30;

/// The cycle a site is dispatched against, with the load to use for it.
#[derive(Debug, Clone)]
pub struct RepresentativeCycle {
    pub cycle: BillingCycle,
    /// In-cycle load, observed or synthesized from the 4-hour shape.
    pub points: Vec<IntervalPoint>,
    /// Billed demand for the cycle, when known.
    pub billed_demand_kw: Option<f64>,
    pub synthetic_load: bool,
    pub diagnostics: Diagnostics,
}

/// Picks the cycle to simulate.
///
/// Preference order: the latest complete billed cycle, a window starting at the
/// first usable interval, then a window ending at `as_of` when only a load
/// shape is available.
///
/// # Returns
///
/// `None` when there is neither interval data nor a load shape.
pub fn representative_cycle(
    determinants: Option<&BillingDeterminants>,
    points: &[IntervalPoint],
    summary: Option<&IntervalSummary>,
    timezone: Tz,
    as_of: DateTime<Utc>,
) -> Option<RepresentativeCycle> {
    let mut diagnostics = Diagnostics::default();
    let shape = summary.and_then(|s| s.load_shape_4h);
    let first_usable = points
        .iter()
        .filter(|p| p.is_usable())
        .map(|p| p.timestamp)
        .min();

    let billed = determinants.and_then(BillingDeterminants::latest_complete_cycle);
    let (cycle, cycle_billed_kw) = match (billed, first_usable, shape) {
        (Some(cd), _, _) => (cd.cycle.clone(), cd.billed_demand_kw),
        (None, Some(first), _) => {
            diagnostics.warn(warn::SYNTHETIC_CYCLE);
            let cycle = BillingCycle::synthetic(first, SYNTHETIC_CYCLE_DAYS, timezone);
            (cycle, None)
        }
        (None, None, Some(_)) => {
            diagnostics.warn(warn::SYNTHETIC_CYCLE);
            let start = as_of - Duration::days(SYNTHETIC_CYCLE_DAYS);
            (BillingCycle::synthetic(start, SYNTHETIC_CYCLE_DAYS, timezone), None)
        }
        (None, None, None) => return None,
    };
    if determinants.is_none() {
        diagnostics.missing(missing::BILLING_DETERMINANTS);
    }

    let mut in_cycle: Vec<IntervalPoint> = points
        .iter()
        .filter(|p| p.is_usable() && cycle.contains(p.timestamp))
        .cloned()
        .collect();
    in_cycle.sort_by_key(|p| p.timestamp);

    let synthetic_load = in_cycle.is_empty() && shape.is_some();
    if let (true, Some(shape)) = (synthetic_load, shape) {
        diagnostics.warn(warn::SYNTHETIC_LOAD_SHAPE);
        in_cycle = synthetic_hourly_load(&cycle, &shape);
    }

    debug!(
        cycle = %cycle.label,
        points = in_cycle.len(),
        synthetic_load,
        "representative cycle selected"
    );

    Some(RepresentativeCycle {
        billed_demand_kw: cycle_billed_kw
            .or_else(|| determinants.and_then(|d| d.billed_demand_kw)),
        cycle,
        points: in_cycle,
        synthetic_load,
        diagnostics,
    })
}

/// Hourly kW points over a cycle from a six-bucket local-time shape.
///
/// Bucket `i` covers local hours `[4i, 4i + 4)`.
pub fn synthetic_hourly_load(cycle: &BillingCycle, shape: &[f64; 6]) -> Vec<IntervalPoint> {
    let hours = (cycle.end - cycle.start).num_hours().max(0);
    (0..hours)
        .map(|h| {
            let at = cycle.start + Duration::hours(h);
            let local_hour = at.with_timezone(&cycle.timezone).hour() as usize;
            IntervalPoint::from_kw(at, 60, shape[local_hour / 4])
        })
        .collect()
}
