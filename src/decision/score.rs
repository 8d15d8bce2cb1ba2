//! Scalar ranking score.

use crate::economics::EconomicsOutput;

const NPV_SCALE: f64 = 50_000.0;
const NET_ANNUAL_SCALE: f64 = 10_000.0;
const PAYBACK_WEIGHT: f64 = 0.35;
const CAPEX_SCALE: f64 = 500_000.0;
const WARNING_WEIGHT: f64 = 0.05;
const WARNING_CAP: usize = 10;

// Substitutes for unknown figures.
const NULL_NPV: f64 = -200_000.0;
const NULL_NET_ANNUAL: f64 = -10_000.0;
const NULL_PAYBACK: f64 = 30.0;

/// Higher is better.
///
/// `npv/50k + net_annual/10k - 0.35*payback - capex/500k - 0.05*min(10, warnings)`
pub fn score(economics: &EconomicsOutput) -> f64 {
    let npv = economics.npv().unwrap_or(NULL_NPV);
    let net = economics.net_annual().unwrap_or(NULL_NET_ANNUAL);
    let payback = economics.simple_payback_years().unwrap_or(NULL_PAYBACK);
    let capex = economics.capex_total().unwrap_or(0.0);
    let warnings = economics.warnings.len().min(WARNING_CAP) as f64;
    npv / NPV_SCALE + net / NET_ANNUAL_SCALE - PAYBACK_WEIGHT * payback - capex / CAPEX_SCALE
        - WARNING_WEIGHT * warnings
}
