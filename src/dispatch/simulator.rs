//! Greedy SOC-bounded dispatch against TOU windows or observed demand.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};

use super::types::{DispatchAction, DispatchCycleResult, DispatchStep};
use crate::battery::{BatteryParams, StorageState};
use crate::reason::{Code, warn as code};
use crate::site::tou::TouMatchError;
use crate::site::{BillingCycle, IntervalPoint, TouPriceTable};
use crate::units::round6;

/// Period key used when no price table is available.
pub const NON_TOU_PERIOD: &str = "NON_TOU";

/// How intervals qualify for charge and discharge.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Trigger {
    /// Discharge at the cycle's max price, charge at its min price.
    Price { min: f64, max: f64 },
    /// Discharge at the cycle's max observed kW, charge at its min.
    Demand { min: f64, max: f64 },
    /// Nothing to arbitrage.
    Off,
}

impl Trigger {
    fn classify(self, price: Option<f64>, load_kw: f64) -> (bool, bool) {
        let (value, min, max) = match self {
            Self::Price { min, max } => (price.unwrap_or(f64::NAN), min, max),
            Self::Demand { min, max } => (load_kw, min, max),
            Self::Off => return (false, false),
        };
        let is_min = value == min;
        let is_max = value == max && !is_min;
        (is_max, is_min)
    }
}

/// Incremental before/after peak tracker over one pass.
#[derive(Debug, Default)]
struct PeakTracker {
    before: Option<(f64, DateTime<Utc>)>,
    after: Option<f64>,
}

impl PeakTracker {
    fn observe(&mut self, at: DateTime<Utc>, load_kw: f64, adjusted_kw: f64) {
        // Strictly greater keeps the earliest timestamp on ties.
        if self.before.is_none_or(|(kw, _)| load_kw > kw) {
            self.before = Some((load_kw, at));
        }
        self.after = Some(self.after.map_or(adjusted_kw, |kw| kw.max(adjusted_kw)));
    }
}

/// Runs one candidate through one billing cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchSimulator {
    /// Keep a per-interval [`DispatchStep`] trace in the result.
    pub record_trace: bool,
}

impl DispatchSimulator {
    pub fn with_trace() -> Self {
        Self { record_trace: true }
    }

    /// Simulates a cycle. Never fails; problems yield `ok = false` and warnings.
    ///
    /// # Arguments
    ///
    /// * `candidate_id` - Id copied into the result
    /// * `cycle` - Billing window and local timezone
    /// * `points` - Interval load (any order; out-of-cycle points are ignored)
    /// * `table` - TOU prices, or `None` for demand-only mode
    /// * `params` - Battery physical parameters
    pub fn simulate(
        &self,
        candidate_id: &str,
        cycle: &BillingCycle,
        points: &[IntervalPoint],
        table: Option<&TouPriceTable>,
        params: &BatteryParams,
    ) -> DispatchCycleResult {
        let days = cycle.days();
        if let Err(e) = params.validate() {
            warn!(candidate_id, cycle = %cycle.label, error = %e, "invalid battery parameters");
            return DispatchCycleResult::degraded(
                candidate_id,
                &cycle.label,
                days,
                code::INVALID_BATTERY_PARAMS,
            );
        }

        let mut usable: Vec<(&IntervalPoint, f64)> = points
            .iter()
            .filter(|p| cycle.contains(p.timestamp))
            .filter_map(|p| p.resolved_kw().map(|kw| (p, kw)))
            .collect();
        usable.sort_by_key(|(p, _)| p.timestamp);
        if usable.is_empty() {
            return DispatchCycleResult::degraded(
                candidate_id,
                &cycle.label,
                days,
                code::INSUFFICIENT_DATA,
            );
        }

        let mut warnings = BTreeSet::new();
        let labels = match table {
            Some(t) => match label_intervals(t, cycle, &usable) {
                Ok(labels) => labels,
                Err(e) => {
                    let c = match e {
                        TouMatchError::Unmatched => code::TOU_UNMATCHED,
                        TouMatchError::Ambiguous => code::TOU_AMBIGUOUS,
                    };
                    warn!(candidate_id, cycle = %cycle.label, "TOU classification failed: {e}");
                    warnings.insert(c);
                    return self.peaks_only(candidate_id, cycle, &usable, warnings);
                }
            },
            None => {
                warnings.insert(code::DEMAND_ONLY_MODE);
                vec![(NON_TOU_PERIOD.to_string(), None); usable.len()]
            }
        };

        let trigger = match table {
            Some(_) => {
                let (min, max) = bounds(labels.iter().filter_map(|(_, p)| *p));
                if min == max {
                    warnings.insert(code::TOU_FLAT_PRICING);
                    Trigger::Off
                } else {
                    Trigger::Price { min, max }
                }
            }
            None => {
                let (min, max) = bounds(usable.iter().map(|(_, kw)| *kw));
                if min == max {
                    Trigger::Off
                } else {
                    Trigger::Demand { min, max }
                }
            }
        };

        let mut store = match trigger {
            Trigger::Demand { .. } => StorageState::at_max(*params),
            _ => StorageState::at_min(*params),
        };
        let mut charged: BTreeMap<String, f64> = BTreeMap::new();
        let mut discharged: BTreeMap<String, f64> = BTreeMap::new();
        let mut peaks = PeakTracker::default();
        let mut trace = Vec::with_capacity(if self.record_trace { usable.len() } else { 0 });

        for ((point, load_kw), (period, price)) in usable.iter().zip(&labels) {
            let hours = point.hours();
            let (is_max, is_min) = trigger.classify(*price, *load_kw);

            let (action, energy_kwh) = if is_max {
                let kwh = store.discharge(hours, load_kw * hours);
                (DispatchAction::Discharge, kwh)
            } else if is_min {
                (DispatchAction::Charge, store.charge(hours))
            } else {
                (DispatchAction::Idle, 0.0)
            };

            let shift_kw = if hours > 0.0 { energy_kwh / hours } else { 0.0 };
            let adjusted_kw = match action {
                DispatchAction::Discharge => load_kw - shift_kw,
                DispatchAction::Charge => load_kw + shift_kw,
                DispatchAction::Idle => *load_kw,
            };
            if energy_kwh > 0.0 {
                let map = match action {
                    DispatchAction::Charge => &mut charged,
                    _ => &mut discharged,
                };
                *map.entry(period.clone()).or_insert(0.0) += energy_kwh;
            }
            peaks.observe(point.timestamp, *load_kw, adjusted_kw);

            if self.record_trace {
                trace.push(DispatchStep {
                    timestamp: point.timestamp,
                    period_id: period.clone(),
                    price_per_kwh: *price,
                    load_kw: *load_kw,
                    adjusted_kw,
                    action,
                    energy_kwh,
                    stored_kwh: store.stored_kwh(),
                });
            }
        }

        let result = DispatchCycleResult {
            candidate_id: candidate_id.to_string(),
            cycle_label: cycle.label.clone(),
            cycle_days: days,
            kwh_charged_by_tou: round_map(charged),
            kwh_discharged_by_tou: round_map(discharged),
            demand_peak_before_kw: peaks.before.map(|(kw, _)| kw),
            demand_peak_after_kw: peaks.after,
            peak_timestamp_iso: peaks.before.map(|(_, at)| iso(at)),
            ok: true,
            warnings,
            trace,
        };
        debug!(
            candidate_id,
            cycle = %cycle.label,
            peak_before_kw = ?result.demand_peak_before_kw,
            peak_after_kw = ?result.demand_peak_after_kw,
            "cycle dispatched"
        );
        result
    }

    /// Degraded output: raw-load peaks, no dispatch.
    fn peaks_only(
        &self,
        candidate_id: &str,
        cycle: &BillingCycle,
        usable: &[(&IntervalPoint, f64)],
        warnings: BTreeSet<Code>,
    ) -> DispatchCycleResult {
        let mut peaks = PeakTracker::default();
        for (p, kw) in usable {
            peaks.observe(p.timestamp, *kw, *kw);
        }
        DispatchCycleResult {
            candidate_id: candidate_id.to_string(),
            cycle_label: cycle.label.clone(),
            cycle_days: cycle.days(),
            kwh_charged_by_tou: BTreeMap::new(),
            kwh_discharged_by_tou: BTreeMap::new(),
            demand_peak_before_kw: peaks.before.map(|(kw, _)| kw),
            demand_peak_after_kw: peaks.after,
            peak_timestamp_iso: peaks.before.map(|(_, at)| iso(at)),
            ok: false,
            warnings,
            trace: Vec::new(),
        }
    }
}

/// Period label and price per usable interval; any failure fails the cycle.
fn label_intervals(
    table: &TouPriceTable,
    cycle: &BillingCycle,
    usable: &[(&IntervalPoint, f64)],
) -> Result<Vec<(String, Option<f64>)>, TouMatchError> {
    usable
        .iter()
        .map(|(p, _)| {
            table
                .classify(&p.timestamp, cycle.timezone)
                .map(|w| (w.period_id.clone(), Some(w.price_per_kwh)))
        })
        .collect()
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn round_map(map: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    map.into_iter().map(|(k, v)| (k, round6(v))).collect()
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
