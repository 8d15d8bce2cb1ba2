//! Fixed sensitivity scenarios over the selected candidate.
//!
//! Scenarios rescale already computed components and re-solve the cashflow;
//! dispatch is never re-run.

use serde::Serialize;

use crate::economics::CashflowBasis;
use crate::units::round2;

/// Scenario ids in output order.
pub const SCENARIO_IDS: [&str; 5] = [
    "base",
    "capex_plus_15pct",
    "capex_minus_15pct",
    "tou_spread_minus_20pct",
    "demand_value_minus_20pct",
];

/// Metrics under one scenario. Dollar figures are rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityScenario {
    pub id: &'static str,
    pub capex_usd: Option<f64>,
    pub savings_annual_usd: Option<f64>,
    pub net_annual_usd: Option<f64>,
    pub npv_usd: Option<f64>,
    pub simple_payback_years: Option<f64>,
}

impl SensitivityScenario {
    fn unknown(id: &'static str) -> Self {
        Self {
            id,
            capex_usd: None,
            savings_annual_usd: None,
            net_annual_usd: None,
            npv_usd: None,
            simple_payback_years: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Scaling {
    capex: f64,
    energy: f64,
    demand: f64,
}

const SCALINGS: [Scaling; 5] = [
    Scaling { capex: 1.0, energy: 1.0, demand: 1.0 },
    Scaling { capex: 1.15, energy: 1.0, demand: 1.0 },
    Scaling { capex: 0.85, energy: 1.0, demand: 1.0 },
    Scaling { capex: 1.0, energy: 0.8, demand: 1.0 },
    Scaling { capex: 1.0, energy: 1.0, demand: 0.8 },
];

fn apply(basis: &CashflowBasis, s: Scaling) -> CashflowBasis {
    let mut b = basis.clone();
    b.scale_capex(s.capex);
    b.savings.energy = b.savings.energy.map(|e| e * s.energy);
    b.savings.demand = b.savings.demand.map(|d| d * s.demand);
    b.savings = b.savings.with_total();
    b
}

/// All five scenarios; every figure is `None` without a cashflow basis.
pub fn scenarios(basis: Option<&CashflowBasis>) -> Vec<SensitivityScenario> {
    SCENARIO_IDS
        .iter()
        .zip(SCALINGS)
        .map(|(&id, scaling)| match basis {
            None => SensitivityScenario::unknown(id),
            Some(basis) => {
                let b = apply(basis, scaling);
                let cf = b.solve();
                SensitivityScenario {
                    id,
                    capex_usd: Some(round2(b.capex)),
                    savings_annual_usd: b.savings.total.map(round2),
                    net_annual_usd: Some(round2(cf.net_annual)),
                    npv_usd: Some(round2(cf.npv)),
                    simple_payback_years: cf.simple_payback_years,
                }
            }
        })
        .collect()
}

/// Payback of a named scenario.
pub fn payback_of(scenarios: &[SensitivityScenario], id: &str) -> Option<f64> {
    scenarios
        .iter()
        .find(|s| s.id == id)
        .and_then(|s| s.simple_payback_years)
}
