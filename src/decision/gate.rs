//! Soft acceptance gate over a candidate's economics.

use serde::{Deserialize, Serialize};

use crate::battery::{BatteryCandidate, SizingBand};
use crate::economics::EconomicsOutput;
use crate::reason::{Code, reject};

/// Acceptance thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatePolicy {
    pub max_payback_years: f64,
    pub npv_floor_usd: f64,
    pub net_annual_floor_usd: f64,
    pub min_duration_h: f64,
    pub band: SizingBand,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            max_payback_years: 12.0,
            npv_floor_usd: 0.0,
            net_annual_floor_usd: 0.0,
            min_duration_h: 1.0,
            band: SizingBand::default(),
        }
    }
}

/// Gate outcome. Every applicable rejection is listed, in a fixed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateResult {
    pub accepted: bool,
    pub rejections: Vec<Code>,
}

impl GatePolicy {
    pub fn check(
        &self,
        candidate: &BatteryCandidate,
        site_peak_kw: Option<f64>,
        economics: &EconomicsOutput,
    ) -> GateResult {
        let mut rejections = Vec::new();
        if candidate.duration_h < self.min_duration_h {
            rejections.push(reject::DURATION_BELOW_MIN);
        }
        let coverage = site_peak_kw.and_then(|p| candidate.coverage_of(p));
        if coverage.is_some_and(|r| !self.band.contains(r)) {
            rejections.push(reject::COVERAGE_OUT_OF_BAND);
        }
        match &economics.cashflow {
            None => rejections.push(reject::ECONOMICS_UNAVAILABLE),
            Some(cf) => {
                if cf
                    .simple_payback_years
                    .is_none_or(|p| p > self.max_payback_years)
                {
                    rejections.push(reject::PAYBACK_TOO_LONG);
                }
                if cf.npv < self.npv_floor_usd {
                    rejections.push(reject::NPV_BELOW_FLOOR);
                }
                if cf.net_annual < self.net_annual_floor_usd {
                    rejections.push(reject::NET_ANNUAL_BELOW_FLOOR);
                }
            }
        }
        GateResult {
            accepted: rejections.is_empty(),
            rejections,
        }
    }
}
