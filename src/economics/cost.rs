//! Installed cost and recurring cost of a candidate.

use serde::Serialize;

use super::assumptions::{CapexAssumptions, OpexAssumptions};
use crate::battery::BatteryCandidate;
use crate::reason::{Outcome, missing};

/// Capex build-up. `total = hardware + install + interconnect + soft_costs + contingency`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapexBreakdown {
    pub hardware: f64,
    pub install: f64,
    pub interconnect: f64,
    pub soft_costs: f64,
    pub contingency: f64,
    pub total: f64,
}

impl CapexBreakdown {
    /// Sum of components, for reconciliation against `total`.
    pub fn component_sum(&self) -> f64 {
        self.hardware + self.install + self.interconnect + self.soft_costs + self.contingency
    }
}

/// Annual opex split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpexBreakdown {
    pub fixed_om: f64,
    pub warranty_reserve: f64,
    pub total: f64,
}

/// Builds capex for a candidate.
///
/// # Errors
///
/// `missing_capex_assumptions` when neither $/kW nor $/kWh is supplied.
pub fn capex(candidate: &BatteryCandidate, a: &CapexAssumptions) -> Outcome<CapexBreakdown> {
    if a.per_kw.is_none() && a.per_kwh.is_none() {
        return Err(vec![missing::CAPEX_ASSUMPTIONS]);
    }
    let hardware =
        candidate.kw * a.per_kw.unwrap_or(0.0) + candidate.kwh * a.per_kwh.unwrap_or(0.0);
    let install = a.install_pct * hardware;
    let subtotal = hardware + install + a.interconnect_usd + a.soft_costs_usd;
    let contingency = a.contingency_pct * subtotal;
    Ok(CapexBreakdown {
        hardware,
        install,
        interconnect: a.interconnect_usd,
        soft_costs: a.soft_costs_usd,
        contingency,
        total: subtotal + contingency,
    })
}

/// Annual opex; the warranty reserve is capex-linked.
pub fn opex(candidate: &BatteryCandidate, capex_total: f64, a: &OpexAssumptions) -> OpexBreakdown {
    let fixed_om = a.per_kw_year * candidate.kw;
    let warranty_reserve = a.warranty_reserve_pct * capex_total;
    OpexBreakdown {
        fixed_om,
        warranty_reserve,
        total: fixed_om + warranty_reserve,
    }
}
