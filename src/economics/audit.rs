//! Per-dollar audit line items and reconciliation of named sums.

use serde::Serialize;

use crate::units::round2;

/// Reconciliation tolerance ($).
pub const RECONCILE_TOLERANCE_USD: f64 = 0.01;

/// Engine tag stamped on every economics line item.
pub const SOURCE_ENGINE: &str = "economics";

/// Stable line-item ids.
pub mod ids {
    pub const CAPEX_HARDWARE: &str = "capex.hardware";
    pub const CAPEX_INSTALL: &str = "capex.install";
    pub const CAPEX_INTERCONNECT: &str = "capex.interconnect";
    pub const CAPEX_SOFT_COSTS: &str = "capex.soft_costs";
    pub const CAPEX_CONTINGENCY: &str = "capex.contingency";
    pub const CAPEX_TOTAL: &str = "capex.total";

    pub const OPEX_FIXED_OM: &str = "opex.fixed_om";
    pub const OPEX_WARRANTY: &str = "opex.warranty_reserve";
    pub const OPEX_TOTAL: &str = "opex.total";

    pub const SAVINGS_DEMAND: &str = "savings.demand_annual";
    pub const SAVINGS_ENERGY: &str = "savings.energy_annual";
    pub const SAVINGS_RATCHET: &str = "savings.ratchet_annual";
    pub const SAVINGS_DR: &str = "savings.dr_annual";
    pub const SAVINGS_OTHER: &str = "savings.other_annual";
    pub const SAVINGS_TOTAL: &str = "savings.total";

    pub const SGIP: &str = "incentive.sgip";
    pub const ITC: &str = "incentive.itc";
    pub const MACRS: &str = "tax.macrs_benefit_total";
    pub const DEGRADATION: &str = "degradation.capex_events_total";

    pub const YEAR0: &str = "finance.year0";
    pub const NET_ANNUAL: &str = "finance.net_annual";
    pub const NPV: &str = "finance.npv";
}

/// A named input behind a line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditQuantity {
    pub name: &'static str,
    pub value: Option<f64>,
    pub unit: &'static str,
}

/// Provenance for one dollar figure. A `None` amount still gets a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLineItem {
    pub id: &'static str,
    pub label: &'static str,
    /// Rounded to cents.
    pub amount_usd: Option<f64>,
    pub amount_usd_raw: Option<f64>,
    pub basis: String,
    pub source_engine: &'static str,
    pub source_path: &'static str,
    pub quantities: Vec<AuditQuantity>,
}

impl AuditLineItem {
    pub fn new(
        id: &'static str,
        label: &'static str,
        amount: Option<f64>,
        basis: impl Into<String>,
        source_path: &'static str,
    ) -> Self {
        Self {
            id,
            label,
            amount_usd: amount.map(round2),
            amount_usd_raw: amount,
            basis: basis.into(),
            source_engine: SOURCE_ENGINE,
            source_path,
            quantities: Vec::new(),
        }
    }

    /// Adds a named quantity.
    pub fn qty(mut self, name: &'static str, value: Option<f64>, unit: &'static str) -> Self {
        self.quantities.push(AuditQuantity { name, value, unit });
        self
    }
}

/// Result of checking a named sum against its components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub id: &'static str,
    pub total: f64,
    pub components: f64,
    pub delta: f64,
    pub tolerance: f64,
    pub ok: bool,
}

/// The named sums and the ids they are built from.
pub const NAMED_SUMS: [(&str, &[&str]); 3] = [
    (
        ids::CAPEX_TOTAL,
        &[
            ids::CAPEX_HARDWARE,
            ids::CAPEX_INSTALL,
            ids::CAPEX_INTERCONNECT,
            ids::CAPEX_SOFT_COSTS,
            ids::CAPEX_CONTINGENCY,
        ],
    ),
    (ids::OPEX_TOTAL, &[ids::OPEX_FIXED_OM, ids::OPEX_WARRANTY]),
    (
        ids::SAVINGS_TOTAL,
        &[
            ids::SAVINGS_DEMAND,
            ids::SAVINGS_ENERGY,
            ids::SAVINGS_RATCHET,
            ids::SAVINGS_DR,
            ids::SAVINGS_OTHER,
        ],
    ),
];

fn raw(items: &[AuditLineItem], id: &str) -> Option<f64> {
    items.iter().find(|i| i.id == id).and_then(|i| i.amount_usd_raw)
}

/// Reconciles one named sum; `None` when the total itself is unknown.
///
/// Unknown components count as zero.
pub fn reconcile_sum(
    items: &[AuditLineItem],
    total_id: &'static str,
    component_ids: &[&str],
) -> Option<Reconciliation> {
    let total = raw(items, total_id)?;
    let components: f64 = component_ids.iter().filter_map(|id| raw(items, id)).sum();
    let delta = (total - components).abs();
    Some(Reconciliation {
        id: total_id,
        total,
        components,
        delta,
        tolerance: RECONCILE_TOLERANCE_USD,
        ok: delta <= RECONCILE_TOLERANCE_USD,
    })
}

/// Reconciles every computable named sum.
pub fn reconcile_all(items: &[AuditLineItem]) -> Vec<Reconciliation> {
    NAMED_SUMS
        .iter()
        .filter_map(|(total, parts)| reconcile_sum(items, *total, parts))
        .collect()
}

/// Stable sort by id.
pub fn sort_items(items: &mut [AuditLineItem]) {
    items.sort_by(|a, b| a.id.cmp(b.id));
}
