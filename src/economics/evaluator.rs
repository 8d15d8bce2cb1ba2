//! The economics pipeline: cost, savings, incentives, tax, degradation, finance.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::assumptions::EconomicsAssumptions;
use super::audit::{self, AuditLineItem, Reconciliation, ids};
use super::confidence::{ConfidenceSignals, ConfidenceTier};
use super::cost::{self, CapexBreakdown, OpexBreakdown};
use super::degradation::{self, DegradationEventKind, DegradationPlan};
use super::finance::{Cashflow, CashflowBasis};
use super::incentive::{self, SgipAward};
use super::savings::{self, SavingsBreakdown, SavingsInput, SavingsResult};
use super::tax::{self, MacrsBenefit};
use crate::battery::{BatteryCandidate, BatteryParams};
use crate::dispatch::DispatchCycleResult;
use crate::reason::{Code, Diagnostics, warn, why};
use crate::site::{BillingDeterminants, DrReadiness, TouPriceTable};

/// Everything the evaluator needs for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct EconomicsInput<'a> {
    pub candidate: &'a BatteryCandidate,
    pub params: &'a BatteryParams,
    pub site_peak_kw: Option<f64>,
    pub dispatch: Option<&'a DispatchCycleResult>,
    pub table: Option<&'a TouPriceTable>,
    pub demand_charge_per_kw_month: Option<f64>,
    pub billed_demand_kw: Option<f64>,
    pub determinants: Option<&'a BillingDeterminants>,
    pub dr: Option<&'a DrReadiness>,
    /// Start of the representative billing period, for SGIP snapshot lookup.
    pub bill_period_start: Option<DateTime<Utc>>,
    pub synthetic_load: bool,
    pub assumptions: &'a EconomicsAssumptions,
}

/// Incentives credited in year 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IncentiveSummary {
    pub sgip: Option<SgipAward>,
    pub itc_usd: Option<f64>,
}

/// Depreciation outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaxSummary {
    pub depreciable_basis: Option<f64>,
    pub macrs: Option<MacrsBenefit>,
}

/// Audited economics for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomicsOutput {
    pub candidate_id: String,
    pub confidence_tier: ConfidenceTier,
    pub capex: Option<CapexBreakdown>,
    pub opex_annual: Option<OpexBreakdown>,
    pub savings_annual: SavingsBreakdown,
    pub incentives: IncentiveSummary,
    pub tax: TaxSummary,
    pub degradation: Option<DegradationPlan>,
    pub cashflow: Option<Cashflow>,
    pub audit_line_items: Vec<AuditLineItem>,
    pub warnings: BTreeSet<Code>,
    pub missing_info: BTreeSet<Code>,
    pub reasons_by_component: BTreeMap<&'static str, BTreeSet<Code>>,
    /// Inputs behind `cashflow`, kept for sensitivity scaling.
    #[serde(skip)]
    pub basis: Option<CashflowBasis>,
}

impl EconomicsOutput {
    pub fn capex_total(&self) -> Option<f64> {
        self.capex.map(|c| c.total)
    }

    pub fn npv(&self) -> Option<f64> {
        self.cashflow.as_ref().map(|c| c.npv)
    }

    pub fn net_annual(&self) -> Option<f64> {
        self.cashflow.as_ref().map(|c| c.net_annual)
    }

    pub fn simple_payback_years(&self) -> Option<f64> {
        self.cashflow.as_ref().and_then(|c| c.simple_payback_years)
    }

    /// Checks every named sum in the audit against its components.
    pub fn reconcile(&self) -> Vec<Reconciliation> {
        audit::reconcile_all(&self.audit_line_items)
    }

    /// Diagnostics view of `warnings` and `missing_info`.
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            warnings: self.warnings.clone(),
            missing_info: self.missing_info.clone(),
        }
    }
}

#[derive(Default)]
struct Reasons(BTreeMap<&'static str, BTreeSet<Code>>);

impl Reasons {
    fn add(&mut self, component: &'static str, code: Code) {
        self.0.entry(component).or_default().insert(code);
    }

    /// Records codes against a component, promoting `missing_*` codes.
    fn record(&mut self, component: &'static str, codes: &[Code], diag: &mut Diagnostics) {
        for &c in codes {
            if c.starts_with("missing_") {
                diag.missing(c);
            }
            self.add(component, c);
        }
    }
}

fn event_cost(plan: Option<&DegradationPlan>, kind: DegradationEventKind, year: u32) -> f64 {
    plan.map_or(0.0, |p| p.cost_of_kind_in_year(kind, year))
}

/// Evaluates one candidate. Never panics; unknown figures are `None` with reasons.
pub fn evaluate(input: &EconomicsInput<'_>) -> EconomicsOutput {
    let a = input.assumptions;
    let c = input.candidate;
    let mut diag = Diagnostics::default();
    let mut reasons = Reasons::default();
    if let Some(d) = input.dispatch {
        diag.warnings.extend(d.warnings.iter().copied());
    }

    let capex = match cost::capex(c, &a.capex) {
        Ok(b) => Some(b),
        Err(codes) => {
            reasons.record(ids::CAPEX_TOTAL, &codes, &mut diag);
            None
        }
    };
    let capex_total = capex.map(|b| b.total);

    let opex = match capex_total {
        Some(total) => Some(cost::opex(c, total, &a.opex)),
        None if a.opex.warranty_reserve_pct == 0.0 => Some(cost::opex(c, 0.0, &a.opex)),
        None => {
            reasons.add(ids::OPEX_TOTAL, why::CAPEX_UNKNOWN);
            None
        }
    };

    let savings: SavingsResult = savings::annual_savings(&SavingsInput {
        candidate: c,
        params: input.params,
        dispatch: input.dispatch,
        table: input.table,
        demand_charge_per_kw_month: input.demand_charge_per_kw_month,
        billed_demand_kw: input.billed_demand_kw,
        determinants: input.determinants,
        dr: input.dr,
        assumptions: &a.savings,
    });
    diag.absorb(&savings.diagnostics);
    for (&component, codes) in &savings.reasons {
        for &code in codes {
            reasons.add(component, code);
        }
    }

    let sgip = match &a.sgip {
        None => {
            reasons.add(ids::SGIP, why::SGIP_DISABLED);
            None
        }
        Some(s) => {
            match incentive::sgip_award(c, s, input.bill_period_start, capex_total, &mut diag) {
                Ok(award) => Some(award),
                Err(codes) => {
                    reasons.record(ids::SGIP, &codes, &mut diag);
                    None
                }
            }
        }
    };
    let sgip_usd = sgip.as_ref().map_or(0.0, |s| s.amount_usd);

    let itc_usd = match (&a.itc, capex_total) {
        (None, _) => {
            reasons.add(ids::ITC, why::ITC_DISABLED);
            None
        }
        (Some(_), None) => {
            reasons.add(ids::ITC, why::CAPEX_UNKNOWN);
            None
        }
        (Some(itc), Some(total)) => Some(tax::itc_amount(total, itc)),
    };

    let depreciable_basis = capex_total
        .map(|t| tax::depreciable_basis(t, sgip_usd, itc_usd.unwrap_or(0.0), a.itc.as_ref()));
    let macrs = match (&a.macrs, depreciable_basis) {
        (None, _) => {
            reasons.add(ids::MACRS, why::MACRS_DISABLED);
            None
        }
        (Some(_), None) => {
            reasons.add(ids::MACRS, why::CAPEX_UNKNOWN);
            None
        }
        (Some(m), Some(basis)) => match tax::macrs_benefit(basis, m) {
            Ok(b) => Some(b),
            Err(codes) => {
                diag.warn(warn::MACRS_MISSING_TAX_RATE);
                reasons.record(ids::MACRS, &codes, &mut diag);
                None
            }
        },
    };

    let years = a.finance.analysis_years;
    let degradation = match (&a.degradation, capex_total) {
        (Some(d), Some(total)) => {
            let per_kwh = d
                .augmentation_per_kwh
                .or(a.capex.per_kwh)
                .unwrap_or(if c.kwh > 0.0 { total / c.kwh } else { 0.0 });
            let plan = degradation::plan(c.kwh, total, per_kwh, years, d);
            if plan.has_replacement() {
                diag.warn(warn::REPLACEMENT_SCHEDULED);
            }
            Some(plan)
        }
        (Some(_), None) => {
            reasons.add(ids::DEGRADATION, why::CAPEX_UNKNOWN);
            None
        }
        (None, _) => None,
    };

    let basis = match (capex_total, savings.breakdown.total, opex) {
        (Some(capex), Some(_), Some(opex)) => Some(CashflowBasis {
            capex,
            sgip: sgip_usd,
            itc: itc_usd.unwrap_or(0.0),
            opex: opex.fixed_om,
            warranty_reserve: opex.warranty_reserve,
            savings: savings.breakdown,
            capacity_by_year: degradation.as_ref().map(|p| p.capacity_by_year.clone()),
            extras_by_year: (1..=years)
                .map(|y| -event_cost(degradation.as_ref(), DegradationEventKind::Augmentation, y))
                .collect(),
            capex_linked_by_year: (1..=years)
                .map(|y| {
                    let benefit = macrs.as_ref().map_or(0.0, |m| m.in_year(y as usize));
                    let replacement =
                        event_cost(degradation.as_ref(), DegradationEventKind::Replacement, y);
                    benefit - replacement
                })
                .collect(),
            discount_rate: a.finance.discount_rate,
            years,
        }),
        (None, ..) => {
            reasons.add(ids::NPV, why::CAPEX_UNKNOWN);
            None
        }
        (_, None, _) => {
            reasons.add(ids::NPV, why::SAVINGS_UNKNOWN);
            None
        }
        (_, _, None) => {
            reasons.add(ids::NPV, why::CAPEX_UNKNOWN);
            None
        }
    };
    let cashflow = basis.as_ref().map(CashflowBasis::solve);

    let confidence_tier = ConfidenceSignals {
        sizing_known: input.site_peak_kw.is_some(),
        capex_known: capex.is_some(),
        savings_known: savings.breakdown.total.is_some(),
        energy_proxy_used: savings.energy_proxy_used,
        demand_rate_missing: input.demand_charge_per_kw_month.is_none(),
        synthetic_load: input.synthetic_load,
        dispatch_degraded: input.dispatch.is_none_or(|d| !d.ok),
    }
    .tier();

    let mut out = EconomicsOutput {
        candidate_id: c.id.clone(),
        confidence_tier,
        capex,
        opex_annual: opex,
        savings_annual: savings.breakdown,
        incentives: IncentiveSummary { sgip, itc_usd },
        tax: TaxSummary {
            depreciable_basis,
            macrs,
        },
        degradation,
        cashflow,
        audit_line_items: Vec::new(),
        warnings: diag.warnings,
        missing_info: diag.missing_info,
        reasons_by_component: reasons.0,
        basis,
    };
    out.audit_line_items = audit_trail(input, &out, &savings);

    debug!(
        candidate_id = %out.candidate_id,
        tier = %out.confidence_tier,
        capex = ?out.capex_total(),
        npv = ?out.npv(),
        payback = ?out.simple_payback_years(),
        "candidate evaluated"
    );
    out
}

/// One line item per dollar figure, sorted by id.
fn audit_trail(
    input: &EconomicsInput<'_>,
    out: &EconomicsOutput,
    savings: &SavingsResult,
) -> Vec<AuditLineItem> {
    let a = input.assumptions;
    let c = input.candidate;
    let capex = out.capex;
    let pick = |f: fn(&CapexBreakdown) -> f64| capex.as_ref().map(f);
    let s = &out.savings_annual;
    let opex = out.opex_annual;

    let mut items = vec![
        AuditLineItem::new(
            ids::CAPEX_HARDWARE,
            "Battery hardware",
            pick(|b| b.hardware),
            "kw * usd_per_kw + kwh * usd_per_kwh",
            "economics.cost.capex",
        )
        .qty("kw", Some(c.kw), "kW")
        .qty("kwh", Some(c.kwh), "kWh")
        .qty("usd_per_kw", a.capex.per_kw, "$/kW")
        .qty("usd_per_kwh", a.capex.per_kwh, "$/kWh"),
        AuditLineItem::new(
            ids::CAPEX_INSTALL,
            "Installation",
            pick(|b| b.install),
            "install_pct * hardware",
            "economics.cost.capex",
        )
        .qty("install_pct", Some(a.capex.install_pct), "fraction"),
        AuditLineItem::new(
            ids::CAPEX_INTERCONNECT,
            "Interconnection",
            pick(|b| b.interconnect),
            "flat",
            "economics.cost.capex",
        ),
        AuditLineItem::new(
            ids::CAPEX_SOFT_COSTS,
            "Soft costs",
            pick(|b| b.soft_costs),
            "flat",
            "economics.cost.capex",
        ),
        AuditLineItem::new(
            ids::CAPEX_CONTINGENCY,
            "Contingency",
            pick(|b| b.contingency),
            "contingency_pct * subtotal",
            "economics.cost.capex",
        )
        .qty("contingency_pct", Some(a.capex.contingency_pct), "fraction"),
        AuditLineItem::new(
            ids::CAPEX_TOTAL,
            "Total installed cost",
            pick(|b| b.total),
            "hardware + install + interconnect + soft_costs + contingency",
            "economics.cost.capex",
        ),
        AuditLineItem::new(
            ids::OPEX_FIXED_OM,
            "Fixed O&M",
            opex.map(|o| o.fixed_om),
            "usd_per_kw_year * kw",
            "economics.cost.opex",
        )
        .qty("usd_per_kw_year", Some(a.opex.per_kw_year), "$/kW-yr")
        .qty("kw", Some(c.kw), "kW"),
        AuditLineItem::new(
            ids::OPEX_WARRANTY,
            "Warranty reserve",
            opex.map(|o| o.warranty_reserve),
            "warranty_reserve_pct * capex",
            "economics.cost.opex",
        )
        .qty(
            "warranty_reserve_pct",
            Some(a.opex.warranty_reserve_pct),
            "fraction",
        ),
        AuditLineItem::new(
            ids::OPEX_TOTAL,
            "Annual opex",
            opex.map(|o| o.total),
            "fixed_om + warranty_reserve",
            "economics.cost.opex",
        ),
        AuditLineItem::new(
            ids::SAVINGS_DEMAND,
            "Demand charge savings",
            s.demand,
            "peak_reduction_kw * demand_charge * 12",
            "economics.savings.demand",
        )
        .qty("peak_reduction_kw", savings.demand_reduction_kw, "kW")
        .qty(
            "demand_charge_per_kw_month",
            input.demand_charge_per_kw_month,
            "$/kW-mo",
        ),
        energy_item(input, s.energy, savings),
        AuditLineItem::new(
            ids::SAVINGS_RATCHET,
            "Ratchet avoidance",
            s.ratchet,
            "peak_reduction_kw * ratchet_pct * demand_charge * months_binding",
            "economics.savings.ratchet",
        )
        .qty("months_binding", Some(savings.ratchet_binding_months), "months")
        .qty(
            "ratchet_pct",
            input.determinants.and_then(|d| d.ratchet_percent),
            "fraction",
        ),
        AuditLineItem::new(
            ids::SAVINGS_DR,
            "Demand response payments",
            s.dr,
            "kw * committed_fraction * usd_per_kw_year",
            "economics.savings.dr",
        )
        .qty("kw", Some(c.kw), "kW")
        .qty(
            "committed_fraction",
            input.dr.map(|d| d.committed_fraction),
            "fraction",
        )
        .qty(
            "usd_per_kw_year",
            input.dr.and_then(|d| d.payment_per_kw_year),
            "$/kW-yr",
        ),
        AuditLineItem::new(
            ids::SAVINGS_OTHER,
            "Other savings",
            s.other,
            "flat",
            "economics.savings.other",
        ),
        AuditLineItem::new(
            ids::SAVINGS_TOTAL,
            "Total annual savings",
            s.total,
            "demand + energy + ratchet + dr + other",
            "economics.savings",
        ),
        AuditLineItem::new(
            ids::SGIP,
            "SGIP incentive",
            out.incentives.sgip.as_ref().map(|g| g.amount_usd),
            "usable_kwh * 1000 * usd_per_wh, capped",
            "economics.incentive.sgip",
        )
        .qty(
            "usable_kwh",
            out.incentives.sgip.as_ref().map(|g| g.usable_kwh),
            "kWh",
        )
        .qty(
            "usd_per_wh",
            out.incentives.sgip.as_ref().map(|g| g.usd_per_wh),
            "$/Wh",
        ),
        AuditLineItem::new(
            ids::ITC,
            "Investment tax credit",
            out.incentives.itc_usd,
            "itc_pct * capex",
            "economics.tax.itc",
        )
        .qty("itc_pct", a.itc.as_ref().map(|i| i.itc_pct), "fraction"),
        AuditLineItem::new(
            ids::MACRS,
            "MACRS depreciation benefit",
            out.tax.macrs.as_ref().map(|m| m.total),
            "basis * schedule * tax_rate",
            "economics.tax.macrs",
        )
        .qty("depreciable_basis", out.tax.depreciable_basis, "$")
        .qty("tax_rate", out.tax.macrs.as_ref().map(|m| m.tax_rate), "fraction"),
        AuditLineItem::new(
            ids::DEGRADATION,
            "Degradation capex events",
            out.degradation.as_ref().map(DegradationPlan::total_cost),
            "augmentation or replacement over the horizon",
            "economics.degradation",
        )
        .qty(
            "events",
            out.degradation.as_ref().map(|p| p.events.len() as f64),
            "count",
        ),
        AuditLineItem::new(
            ids::YEAR0,
            "Year-0 cashflow",
            out.cashflow.as_ref().map(|f| f.year0),
            "-capex + sgip + itc",
            "economics.finance",
        ),
        AuditLineItem::new(
            ids::NET_ANNUAL,
            "Net annual benefit",
            out.net_annual(),
            "savings_total - opex_total",
            "economics.finance",
        ),
        AuditLineItem::new(
            ids::NPV,
            "Net present value",
            out.npv(),
            "year0 + discounted cashflows",
            "economics.finance",
        )
        .qty("discount_rate", Some(a.finance.discount_rate), "fraction")
        .qty(
            "analysis_years",
            Some(f64::from(a.finance.analysis_years)),
            "years",
        ),
    ];
    audit::sort_items(&mut items);
    items
}

fn energy_item(
    input: &EconomicsInput<'_>,
    energy: Option<f64>,
    savings: &SavingsResult,
) -> AuditLineItem {
    let (basis, path) = if savings.energy_proxy_used {
        (
            "usable_kwh * cycles_per_year * max(0, on_peak - off_peak / rte)",
            "economics.savings.energy_proxy",
        )
    } else {
        (
            "sum(net_kwh_by_tou * price) * 365 / cycle_days",
            "economics.savings.energy",
        )
    };
    let item = AuditLineItem::new(
        ids::SAVINGS_ENERGY,
        "TOU energy arbitrage",
        energy,
        basis,
        path,
    );
    if savings.energy_proxy_used {
        item.qty("usable_kwh", Some(input.params.usable_kwh()), "kWh")
            .qty(
                "cycles_per_year",
                Some(input.assumptions.savings.proxy_cycles_per_year),
                "cycles",
            )
            .qty("rte", Some(input.params.rte), "fraction")
    } else {
        item.qty("net_kwh_annual", savings.energy_net_kwh_annual, "kWh")
            .qty(
                "cycle_days",
                input.dispatch.map(|d| d.cycle_days),
                "days",
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economics::assumptions::{
        CapexAssumptions, DegradationAssumptions, ItcAssumptions, MacrsAssumptions,
    };
    use crate::reason::missing;
    use crate::site::{PriceSource, TouPriceWindow};

    fn table() -> TouPriceTable {
        TouPriceTable {
            source: PriceSource::Delivery,
            windows: vec![
                TouPriceWindow::new("OFF", 0, 16, 0.10),
                TouPriceWindow::new("ON", 16, 21, 0.30),
                TouPriceWindow::new("OFF2", 21, 24, 0.12),
            ],
        }
    }

    fn dispatch() -> DispatchCycleResult {
        let mut d = DispatchCycleResult::degraded("100kw-2h", "c", 30.0, "x");
        d.ok = true;
        d.warnings.clear();
        d.kwh_discharged_by_tou.insert("ON".into(), 6_000.0);
        d.kwh_charged_by_tou.insert("OFF".into(), 6_666.666_667);
        d.demand_peak_before_kw = Some(500.0);
        d.demand_peak_after_kw = Some(400.0);
        d
    }

    fn assumptions() -> EconomicsAssumptions {
        EconomicsAssumptions {
            capex: CapexAssumptions {
                per_kw: Some(300.0),
                per_kwh: Some(350.0),
                ..CapexAssumptions::default()
            },
            ..EconomicsAssumptions::default()
        }
    }

    fn run(a: &EconomicsAssumptions, d: Option<&DispatchCycleResult>) -> EconomicsOutput {
        let c = BatteryCandidate::new(100.0, 2.0, "LFP");
        let p = BatteryParams {
            power_kw: 100.0,
            energy_kwh: 200.0,
            rte: 0.9,
            min_soc: 0.0,
            max_soc: 1.0,
        };
        let t = table();
        evaluate(&EconomicsInput {
            candidate: &c,
            params: &p,
            site_peak_kw: Some(500.0),
            dispatch: d,
            table: Some(&t),
            demand_charge_per_kw_month: Some(20.0),
            billed_demand_kw: None,
            determinants: None,
            dr: None,
            bill_period_start: None,
            synthetic_load: false,
            assumptions: a,
        })
    }

    #[test]
    fn every_figure_has_one_line_item_and_sums_reconcile() {
        let d = dispatch();
        let out = run(&assumptions(), Some(&d));
        assert_eq!(out.confidence_tier, ConfidenceTier::High);
        let seen: BTreeSet<&str> = out.audit_line_items.iter().map(|i| i.id).collect();
        assert_eq!(seen.len(), out.audit_line_items.len());
        assert!(seen.contains(ids::SGIP) && seen.contains(ids::MACRS));
        let sorted = out.audit_line_items.windows(2).all(|w| w[0].id <= w[1].id);
        assert!(sorted);
        let rec = out.reconcile();
        assert_eq!(rec.len(), 3);
        assert!(rec.iter().all(|r| r.ok));

        let total = out.savings_annual.total.unwrap();
        let parts = out.savings_annual.demand.unwrap() + out.savings_annual.energy.unwrap();
        assert!((total - parts).abs() <= 0.01);
        assert!(out.reasons_by_component[ids::SGIP].contains(why::SGIP_DISABLED));
    }

    #[test]
    fn missing_capex_is_tier_none_with_null_lines() {
        let d = dispatch();
        let out = run(&EconomicsAssumptions::default(), Some(&d));
        assert_eq!(out.confidence_tier, ConfidenceTier::None);
        assert!(out.cashflow.is_none());
        assert!(out.missing_info.contains(missing::CAPEX_ASSUMPTIONS));
        let npv = out.audit_line_items.iter().find(|i| i.id == ids::NPV).unwrap();
        assert_eq!(npv.amount_usd, None);
    }

    #[test]
    fn no_dispatch_falls_back_to_proxy_at_medium() {
        let out = run(&assumptions(), None);
        assert_eq!(out.confidence_tier, ConfidenceTier::Medium);
        assert!(out.warnings.contains(warn::ENERGY_PROXY));
        assert!(out.savings_annual.demand.is_none());
    }

    #[test]
    fn itc_macrs_and_degradation_switch_to_per_year_cashflow() {
        let d = dispatch();
        let a = EconomicsAssumptions {
            itc: Some(ItcAssumptions::default()),
            macrs: Some(MacrsAssumptions {
                tax_rate: Some(0.28),
                ..MacrsAssumptions::default()
            }),
            degradation: Some(DegradationAssumptions::default()),
            ..assumptions()
        };
        let out = run(&a, Some(&d));
        let capex = out.capex_total().unwrap();
        let cf = out.cashflow.as_ref().unwrap();
        assert_eq!(cf.method, crate::economics::finance::FinanceMethod::PerYear);
        assert!((cf.year0 - (-capex + 0.30 * capex)).abs() < 1e-6);
        assert_eq!(cf.years.len(), 10);
        let basis = out.tax.depreciable_basis.unwrap();
        assert!((basis - (capex - 0.5 * 0.30 * capex)).abs() < 1e-6);
        assert!(out.reconcile().iter().all(|r| r.ok));
    }

    #[test]
    fn macrs_without_tax_rate_is_skipped_with_warning() {
        let d = dispatch();
        let a = EconomicsAssumptions {
            macrs: Some(MacrsAssumptions::default()),
            ..assumptions()
        };
        let out = run(&a, Some(&d));
        assert!(out.tax.macrs.is_none());
        assert!(out.warnings.contains(warn::MACRS_MISSING_TAX_RATE));
        assert!(out.missing_info.contains(missing::TAX_RATE));
        assert!(out.cashflow.is_some());
    }
}
