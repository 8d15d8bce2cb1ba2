//! Dispatch result types.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::reason::Code;

/// Battery action for one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchAction {
    Charge,
    Discharge,
    Idle,
}

impl fmt::Display for DispatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Charge => "charge",
            Self::Discharge => "discharge",
            Self::Idle => "idle",
        };
        f.write_str(s)
    }
}

/// Record of one dispatched interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchStep {
    pub timestamp: DateTime<Utc>,
    pub period_id: String,
    pub price_per_kwh: Option<f64>,
    /// Site load before the battery (kW).
    pub load_kw: f64,
    /// Site load after charging/discharging (kW).
    pub adjusted_kw: f64,
    pub action: DispatchAction,
    /// Grid kWh drawn (charge) or kWh delivered (discharge) this interval.
    pub energy_kwh: f64,
    pub stored_kwh: f64,
}

/// Dispatch outcome for one (candidate, billing cycle) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchCycleResult {
    pub candidate_id: String,
    pub cycle_label: String,
    pub cycle_days: f64,
    /// Grid kWh charged per TOU period (6 dp).
    pub kwh_charged_by_tou: BTreeMap<String, f64>,
    /// kWh discharged per TOU period (6 dp).
    pub kwh_discharged_by_tou: BTreeMap<String, f64>,
    pub demand_peak_before_kw: Option<f64>,
    pub demand_peak_after_kw: Option<f64>,
    pub peak_timestamp_iso: Option<String>,
    pub ok: bool,
    pub warnings: BTreeSet<Code>,
    #[serde(skip)]
    pub trace: Vec<DispatchStep>,
}

impl DispatchCycleResult {
    /// An empty, not-ok result.
    pub fn degraded(candidate_id: &str, cycle_label: &str, cycle_days: f64, code: Code) -> Self {
        Self {
            candidate_id: candidate_id.to_string(),
            cycle_label: cycle_label.to_string(),
            cycle_days,
            kwh_charged_by_tou: BTreeMap::new(),
            kwh_discharged_by_tou: BTreeMap::new(),
            demand_peak_before_kw: None,
            demand_peak_after_kw: None,
            peak_timestamp_iso: None,
            ok: false,
            warnings: BTreeSet::from([code]),
            trace: Vec::new(),
        }
    }

    /// `discharged - charged` over the key union of both maps.
    pub fn net_kwh_by_tou(&self) -> BTreeMap<String, f64> {
        let mut net: BTreeMap<String, f64> = self
            .kwh_discharged_by_tou
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        for (k, v) in &self.kwh_charged_by_tou {
            *net.entry(k.clone()).or_insert(0.0) -= v;
        }
        net
    }

    /// Whether any energy moved in this cycle.
    pub fn has_dispatch(&self) -> bool {
        self.kwh_charged_by_tou.values().any(|v| *v > 0.0)
            || self.kwh_discharged_by_tou.values().any(|v| *v > 0.0)
    }

    /// Peak reduction in kW, never negative.
    pub fn peak_reduction_kw(&self) -> Option<f64> {
        match (self.demand_peak_before_kw, self.demand_peak_after_kw) {
            (Some(before), Some(after)) => Some((before - after).max(0.0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_uses_key_union() {
        let mut r = DispatchCycleResult::degraded("c", "cycle", 30.0, "x");
        r.kwh_discharged_by_tou.insert("ON".into(), 100.0);
        r.kwh_charged_by_tou.insert("OFF".into(), 111.0);
        r.kwh_charged_by_tou.insert("ON".into(), 5.0);
        let net = r.net_kwh_by_tou();
        assert_eq!(net.get("ON"), Some(&95.0));
        assert_eq!(net.get("OFF"), Some(&-111.0));
        assert!(r.has_dispatch());
    }

    #[test]
    fn peak_reduction_clamps_at_zero() {
        let mut r = DispatchCycleResult::degraded("c", "cycle", 30.0, "x");
        assert_eq!(r.peak_reduction_kw(), None);
        r.demand_peak_before_kw = Some(400.0);
        r.demand_peak_after_kw = Some(410.0);
        assert_eq!(r.peak_reduction_kw(), Some(0.0));
    }
}
