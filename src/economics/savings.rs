//! Annual bill savings from dispatch, demand reduction, ratchet and DR.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::assumptions::SavingsAssumptions;
use super::audit::ids;
use crate::battery::{BatteryCandidate, BatteryParams};
use crate::dispatch::DispatchCycleResult;
use crate::reason::{Code, Diagnostics, Outcome, missing, warn, why};
use crate::site::{BillingDeterminants, DrReadiness, TouPriceTable};

/// Billed-vs-ratchet distance under which the ratchet is treated as binding (kW).
const RATCHET_BINDING_TOLERANCE_KW: f64 = 0.25;
/// Months a binding ratchet is assumed to hold.
const RATCHET_BINDING_MONTHS: f64 = 12.0;

/// Annual savings by component ($/yr). `None` means unknown, not zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SavingsBreakdown {
    pub demand: Option<f64>,
    pub energy: Option<f64>,
    pub ratchet: Option<f64>,
    pub dr: Option<f64>,
    pub other: Option<f64>,
    pub total: Option<f64>,
}

impl SavingsBreakdown {
    /// Sum of known components, `None` when energy and demand are both unknown.
    pub fn with_total(mut self) -> Self {
        self.total = if self.energy.is_none() && self.demand.is_none() {
            None
        } else {
            Some(
                [self.demand, self.energy, self.ratchet, self.dr, self.other]
                    .into_iter()
                    .flatten()
                    .sum(),
            )
        };
        self
    }
}

/// Inputs to the savings model for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct SavingsInput<'a> {
    pub candidate: &'a BatteryCandidate,
    pub params: &'a BatteryParams,
    pub dispatch: Option<&'a DispatchCycleResult>,
    pub table: Option<&'a TouPriceTable>,
    pub demand_charge_per_kw_month: Option<f64>,
    /// Billed demand of the representative cycle (kW).
    pub billed_demand_kw: Option<f64>,
    pub determinants: Option<&'a BillingDeterminants>,
    pub dr: Option<&'a DrReadiness>,
    pub assumptions: &'a SavingsAssumptions,
}

/// Savings model output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavingsResult {
    pub breakdown: SavingsBreakdown,
    /// Peak reduction credited to demand savings (kW).
    pub demand_reduction_kw: Option<f64>,
    /// Annualised net discharged kWh priced by TOU, when dispatch was priced.
    pub energy_net_kwh_annual: Option<f64>,
    pub energy_proxy_used: bool,
    pub ratchet_binding_months: f64,
    pub diagnostics: Diagnostics,
    pub reasons: BTreeMap<&'static str, BTreeSet<Code>>,
}

impl SavingsResult {
    fn reason(&mut self, component: &'static str, code: Code) {
        self.reasons.entry(component).or_default().insert(code);
    }

    fn settle(&mut self, component: &'static str, outcome: Outcome<f64>) -> Option<f64> {
        match outcome {
            Ok(v) => Some(v),
            Err(codes) => {
                for c in codes {
                    if c.starts_with("missing_") {
                        self.diagnostics.missing(c);
                    }
                    self.reason(component, c);
                }
                None
            }
        }
    }
}

/// Runs every savings component for one candidate.
pub fn annual_savings(input: &SavingsInput<'_>) -> SavingsResult {
    let mut out = SavingsResult::default();

    let energy = energy_savings(input, &mut out);
    out.breakdown.energy = out.settle(ids::SAVINGS_ENERGY, energy);

    let demand = demand_savings(input, &mut out);
    out.breakdown.demand = out.settle(ids::SAVINGS_DEMAND, demand);

    out.breakdown.ratchet = Some(ratchet_savings(input, &mut out));
    out.breakdown.dr = Some(dr_savings(input, &mut out));
    out.breakdown.other = Some(input.assumptions.other_annual_usd);
    out.breakdown = out.breakdown.with_total();
    if out.breakdown.total.is_none() {
        out.reason(ids::SAVINGS_TOTAL, why::SAVINGS_UNKNOWN);
    }
    out
}

fn energy_savings(input: &SavingsInput<'_>, out: &mut SavingsResult) -> Outcome<f64> {
    let Some(table) = input.table else {
        return Err(vec![missing::TARIFF_PRICE_SIGNALS]);
    };

    match input.dispatch.filter(|d| d.ok && d.cycle_days > 0.0) {
        Some(d) => {
            let prices = table.period_prices();
            let mut dollars = 0.0;
            let mut kwh = 0.0;
            let mut priced = true;
            for (period, net) in d.net_kwh_by_tou() {
                match prices.get(&period) {
                    Some(p) => {
                        dollars += net * p;
                        kwh += net;
                    }
                    None if net != 0.0 => priced = false,
                    None => {}
                }
            }
            if priced {
                let annualise = 365.0 / d.cycle_days;
                out.energy_net_kwh_annual = Some(kwh * annualise);
                return Ok(dollars * annualise);
            }
            out.reason(ids::SAVINGS_ENERGY, why::PRICE_UNKNOWN_FOR_PERIOD);
        }
        None => out.reason(ids::SAVINGS_ENERGY, why::NO_DISPATCH),
    }

    let (off_peak, on_peak) = table
        .price_bounds()
        .ok_or_else(|| vec![missing::TARIFF_PRICE_SIGNALS])?;
    out.energy_proxy_used = true;
    out.diagnostics.warn(warn::ENERGY_PROXY);
    let spread = (on_peak - off_peak / input.params.rte).max(0.0);
    Ok(input.params.usable_kwh() * input.assumptions.proxy_cycles_per_year * spread)
}

fn demand_savings(input: &SavingsInput<'_>, out: &mut SavingsResult) -> Outcome<f64> {
    let rate = input
        .demand_charge_per_kw_month
        .ok_or_else(|| vec![missing::DEMAND_CHARGE])?;

    if let Some(det) = input.determinants {
        if det.ratchet_method_indicated && !det.has_ratchet_history() {
            out.diagnostics.warn(warn::DEMAND_ZEROED_RATCHET);
            out.diagnostics.missing(missing::RATCHET_HISTORY);
            out.demand_reduction_kw = Some(0.0);
            return Ok(0.0);
        }
    }

    let mut reduction = input
        .dispatch
        .and_then(DispatchCycleResult::peak_reduction_kw)
        .ok_or_else(|| vec![why::NO_PEAK_DATA])?;
    if let Some(billed) = input.billed_demand_kw.filter(|b| reduction > *b) {
        out.diagnostics.warn(warn::DEMAND_CAPPED_AT_BILLED);
        reduction = billed.max(0.0);
    }
    out.demand_reduction_kw = Some(reduction);
    Ok(reduction * rate * 12.0)
}

fn ratchet_savings(input: &SavingsInput<'_>, out: &mut SavingsResult) -> f64 {
    let Some(det) = input.determinants.filter(|d| d.ratchet_savings_eligible) else {
        out.reason(ids::SAVINGS_RATCHET, why::RATCHET_NOT_ELIGIBLE);
        return 0.0;
    };
    let billed = input.billed_demand_kw.or(det.billed_demand_kw);
    let inputs = (
        billed,
        det.ratchet_demand_kw,
        det.ratchet_percent,
        input.demand_charge_per_kw_month,
        out.demand_reduction_kw,
    );
    let (Some(billed), Some(ratchet), Some(pct), Some(rate), Some(reduction)) = inputs else {
        out.reason(ids::SAVINGS_RATCHET, why::RATCHET_NOT_BINDING);
        return 0.0;
    };
    if (billed - ratchet).abs() > RATCHET_BINDING_TOLERANCE_KW {
        out.reason(ids::SAVINGS_RATCHET, why::RATCHET_NOT_BINDING);
        return 0.0;
    }
    out.diagnostics.warn(warn::RATCHET_HEURISTIC);
    out.ratchet_binding_months = RATCHET_BINDING_MONTHS;
    reduction * pct * rate * RATCHET_BINDING_MONTHS
}

fn dr_savings(input: &SavingsInput<'_>, out: &mut SavingsResult) -> f64 {
    let Some(dr) = input.dr.filter(|d| d.eligible) else {
        out.reason(ids::SAVINGS_DR, why::DR_NOT_ELIGIBLE);
        return 0.0;
    };
    let Some(payment) = dr.payment_per_kw_year else {
        out.reason(ids::SAVINGS_DR, why::DR_NO_PAYMENT);
        return 0.0;
    };
    input.candidate.kw * dr.committed_fraction.clamp(0.0, 1.0) * payment
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn params() -> BatteryParams {
        BatteryParams {
            power_kw: 100.0,
            energy_kwh: 200.0,
            rte: 0.9,
            min_soc: 0.0,
            max_soc: 1.0,
        }
    }

    fn dispatch() -> DispatchCycleResult {
        let mut d = DispatchCycleResult::degraded("100kw-2h", "c", 30.0, "x");
        d.ok = true;
        d.warnings.clear();
        d.kwh_discharged_by_tou.insert("ON".into(), 6_000.0);
        d.kwh_charged_by_tou.insert("OFF".into(), 6_666.666_667);
        d.demand_peak_before_kw = Some(500.0);
        d.demand_peak_after_kw = Some(420.0);
        d
    }

    fn input<'a>(
        c: &'a BatteryCandidate,
        p: &'a BatteryParams,
        d: Option<&'a DispatchCycleResult>,
        t: Option<&'a TouPriceTable>,
        a: &'a SavingsAssumptions,
    ) -> SavingsInput<'a> {
        SavingsInput {
            candidate: c,
            params: p,
            dispatch: d,
            table: t,
            demand_charge_per_kw_month: Some(20.0),
            billed_demand_kw: None,
            determinants: None,
            dr: None,
            assumptions: a,
        }
    }

    #[test]
    fn energy_from_priced_dispatch_is_annualised() {
        let c = BatteryCandidate::new(100.0, 2.0, "LFP");
        let (p, d, t, a) = (params(), dispatch(), table(), SavingsAssumptions::default());
        let s = annual_savings(&input(&c, &p, Some(&d), Some(&t), &a));
        let expected = (6_000.0 * 0.30 - 6_666.666_667 * 0.10) * 365.0 / 30.0;
        assert!((s.breakdown.energy.unwrap() - expected).abs() < 1e-6);
        assert!(!s.energy_proxy_used);
        // 80 kW * $20 * 12
        assert!((s.breakdown.demand.unwrap() - 19_200.0).abs() < 1e-9);
        let total = s.breakdown.total.unwrap();
        assert!((total - (expected + 19_200.0)).abs() < 1e-6);
        assert!(s.reasons[ids::SAVINGS_DR].contains(why::DR_NOT_ELIGIBLE));
    }

    #[test]
    fn degraded_dispatch_uses_proxy() {
        let c = BatteryCandidate::new(100.0, 2.0, "LFP");
        let (p, t, a) = (params(), table(), SavingsAssumptions::default());
        let mut d = dispatch();
        d.ok = false;
        let s = annual_savings(&input(&c, &p, Some(&d), Some(&t), &a));
        let expected = 200.0 * 250.0 * (0.30 - 0.10 / 0.9);
        assert!((s.breakdown.energy.unwrap() - expected).abs() < 1e-6);
        assert!(s.energy_proxy_used);
        assert!(s.diagnostics.warnings.contains(warn::ENERGY_PROXY));
        assert!(s.reasons[ids::SAVINGS_ENERGY].contains(why::NO_DISPATCH));
    }

    #[test]
    fn conflicting_period_price_falls_back_to_proxy() {
        let c = BatteryCandidate::new(100.0, 2.0, "LFP");
        let (p, d, a) = (params(), dispatch(), SavingsAssumptions::default());
        let mut t = table();
        t.windows[2].period_id = "OFF".into();
        let s = annual_savings(&input(&c, &p, Some(&d), Some(&t), &a));
        assert!(s.energy_proxy_used);
        assert!(s.reasons[ids::SAVINGS_ENERGY].contains(why::PRICE_UNKNOWN_FOR_PERIOD));
        let expected = 200.0 * 250.0 * (0.30 - 0.10 / 0.9);
        assert!((s.breakdown.energy.unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn no_prices_no_demand_rate_means_unknown_total() {
        let c = BatteryCandidate::new(100.0, 2.0, "LFP");
        let (p, a) = (params(), SavingsAssumptions::default());
        let mut i = input(&c, &p, None, None, &a);
        i.demand_charge_per_kw_month = None;
        let s = annual_savings(&i);
        assert_eq!(s.breakdown.total, None);
        assert!(s.diagnostics.missing_info.contains(missing::TARIFF_PRICE_SIGNALS));
        assert!(s.diagnostics.missing_info.contains(missing::DEMAND_CHARGE));
    }

    #[test]
    fn demand_capped_at_billed_and_zeroed_without_ratchet_history() {
        let c = BatteryCandidate::new(100.0, 2.0, "LFP");
        let (p, d, t, a) = (params(), dispatch(), table(), SavingsAssumptions::default());
        let mut i = input(&c, &p, Some(&d), Some(&t), &a);
        i.billed_demand_kw = Some(50.0);
        let s = annual_savings(&i);
        assert!((s.breakdown.demand.unwrap() - 50.0 * 20.0 * 12.0).abs() < 1e-9);
        assert!(s.diagnostics.warnings.contains(warn::DEMAND_CAPPED_AT_BILLED));

        let det = BillingDeterminants {
            ratchet_method_indicated: true,
            ..BillingDeterminants::default()
        };
        i.determinants = Some(&det);
        let s = annual_savings(&i);
        assert_eq!(s.breakdown.demand, Some(0.0));
        assert!(s.diagnostics.warnings.contains(warn::DEMAND_ZEROED_RATCHET));
    }

    #[test]
    fn ratchet_binding_within_quarter_kw() {
        let c = BatteryCandidate::new(100.0, 2.0, "LFP");
        let (p, d, t, a) = (params(), dispatch(), table(), SavingsAssumptions::default());
        let det = BillingDeterminants {
            billed_demand_kw: Some(480.0),
            ratchet_demand_kw: Some(480.2),
            ratchet_percent: Some(0.8),
            ratchet_history_kw: vec![600.0],
            ratchet_savings_eligible: true,
            ..BillingDeterminants::default()
        };
        let mut i = input(&c, &p, Some(&d), Some(&t), &a);
        i.determinants = Some(&det);
        let s = annual_savings(&i);
        // 80 kW * 0.8 * $20 * 12
        assert!((s.breakdown.ratchet.unwrap() - 15_360.0).abs() < 1e-9);
        assert!(s.diagnostics.warnings.contains(warn::RATCHET_HEURISTIC));

        let far = BillingDeterminants {
            ratchet_demand_kw: Some(470.0),
            ..det.clone()
        };
        i.determinants = Some(&far);
        let s = annual_savings(&i);
        assert_eq!(s.breakdown.ratchet, Some(0.0));
        assert!(s.reasons[ids::SAVINGS_RATCHET].contains(why::RATCHET_NOT_BINDING));
    }

    #[test]
    fn dr_requires_eligibility_and_payment() {
        let c = BatteryCandidate::new(100.0, 2.0, "LFP");
        let (p, d, t, a) = (params(), dispatch(), table(), SavingsAssumptions::default());
        let dr = DrReadiness {
            eligible: true,
            payment_per_kw_year: Some(60.0),
            committed_fraction: 0.5,
        };
        let mut i = input(&c, &p, Some(&d), Some(&t), &a);
        i.dr = Some(&dr);
        assert_eq!(annual_savings(&i).breakdown.dr, Some(3_000.0));

        let dr = DrReadiness {
            payment_per_kw_year: None,
            ..dr
        };
        i.dr = Some(&dr);
        let s = annual_savings(&i);
        assert_eq!(s.breakdown.dr, Some(0.0));
        assert!(s.reasons[ids::SAVINGS_DR].contains(why::DR_NO_PAYMENT));
    }
}
