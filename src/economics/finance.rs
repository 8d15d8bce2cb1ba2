//! Cashflow, NPV-lite and payback.
//!
//! A flat year-1 net saving is discounted with the annuity factor. Once any
//! year differs from the next (capacity fade, MACRS, degradation capex) the
//! explicit per-year cashflow path is used instead.

use serde::Serialize;

use super::savings::SavingsBreakdown;

/// Which discounting path produced a [`Cashflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinanceMethod {
    Annuity,
    PerYear,
}

/// Year-0 outlay, per-year net cashflow and derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cashflow {
    pub method: FinanceMethod,
    pub year0: f64,
    /// Net cashflow for years 1..=N.
    pub years: Vec<f64>,
    /// Year-1 savings less opex.
    pub net_annual: f64,
    pub npv: f64,
    pub simple_payback_years: Option<f64>,
    pub discounted_payback_years: Option<f64>,
}

/// Present value of an annuity of 1 over `n` years at rate `r`.
pub fn pvaf(r: f64, n: u32) -> f64 {
    if n == 0 {
        return 0.0;
    }
    if r == 0.0 {
        return f64::from(n);
    }
    (1.0 - (1.0 + r).powi(-(n as i32))) / r
}

/// Everything needed to (re)compute a cashflow. Sensitivity scenarios scale
/// fields of a clone and call [`CashflowBasis::solve`] again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashflowBasis {
    pub capex: f64,
    pub sgip: f64,
    pub itc: f64,
    /// Annual opex that does not depend on capex (fixed O&M).
    pub opex: f64,
    /// Annual warranty reserve, proportional to capex.
    pub warranty_reserve: f64,
    /// Annual savings at full capacity; `total` must be known.
    pub savings: SavingsBreakdown,
    /// Capacity fraction per year, scaling energy and DR savings.
    pub capacity_by_year: Option<Vec<f64>>,
    /// Additional cashflow per year, index 0 is year 1 (augmentation spend).
    pub extras_by_year: Vec<f64>,
    /// Capex-proportional cashflow per year: MACRS benefit less replacement capex.
    pub capex_linked_by_year: Vec<f64>,
    pub discount_rate: f64,
    pub years: u32,
}

impl CashflowBasis {
    pub fn year0(&self) -> f64 {
        -self.capex + self.sgip + self.itc
    }

    /// Total annual opex.
    pub fn opex_total(&self) -> f64 {
        self.opex + self.warranty_reserve
    }

    /// Scales capex and everything derived from it. SGIP stays capped at capex.
    pub fn scale_capex(&mut self, factor: f64) {
        self.capex *= factor;
        self.itc *= factor;
        self.warranty_reserve *= factor;
        for v in &mut self.capex_linked_by_year {
            *v *= factor;
        }
        self.sgip = self.sgip.min(self.capex);
    }

    fn extra_in_year(&self, year: usize) -> f64 {
        let at = |v: &[f64]| v.get(year - 1).copied().unwrap_or(0.0);
        at(&self.extras_by_year) + at(&self.capex_linked_by_year)
    }

    fn savings_in_year(&self, year: usize) -> f64 {
        let s = &self.savings;
        let linked = s.energy.unwrap_or(0.0) + s.dr.unwrap_or(0.0);
        let fixed = s.demand.unwrap_or(0.0) + s.ratchet.unwrap_or(0.0) + s.other.unwrap_or(0.0);
        let capacity = self
            .capacity_by_year
            .as_ref()
            .and_then(|c| c.get(year - 1))
            .copied()
            .unwrap_or(1.0);
        linked * capacity + fixed
    }

    fn per_year(&self) -> bool {
        self.capacity_by_year.is_some()
            || self
                .extras_by_year
                .iter()
                .chain(&self.capex_linked_by_year)
                .any(|x| *x != 0.0)
    }

    /// Computes the cashflow and its metrics.
    pub fn solve(&self) -> Cashflow {
        let year0 = self.year0();
        let opex = self.opex_total();
        let net_annual = self.savings.total.unwrap_or(0.0) - opex;
        let n = self.years;
        let r = self.discount_rate;

        if !self.per_year() {
            return Cashflow {
                method: FinanceMethod::Annuity,
                year0,
                years: vec![net_annual; n as usize],
                net_annual,
                npv: year0 + net_annual * pvaf(r, n),
                simple_payback_years: annuity_payback(year0, net_annual),
                discounted_payback_years: annuity_discounted_payback(year0, net_annual, r),
            };
        }

        let years: Vec<f64> = (1..=n as usize)
            .map(|y| self.savings_in_year(y) - opex + self.extra_in_year(y))
            .collect();
        let discounted: Vec<f64> = years
            .iter()
            .enumerate()
            .map(|(i, cf)| cf / (1.0 + r).powi(i as i32 + 1))
            .collect();
        Cashflow {
            method: FinanceMethod::PerYear,
            year0,
            npv: year0 + discounted.iter().sum::<f64>(),
            simple_payback_years: interpolated_payback(year0, &years),
            discounted_payback_years: interpolated_payback(year0, &discounted),
            years,
            net_annual,
        }
    }
}

fn annuity_payback(year0: f64, net: f64) -> Option<f64> {
    if year0 >= 0.0 {
        return Some(0.0);
    }
    (net > 0.0).then(|| -year0 / net)
}

fn annuity_discounted_payback(year0: f64, net: f64, r: f64) -> Option<f64> {
    if year0 >= 0.0 {
        return Some(0.0);
    }
    if net <= 0.0 {
        return None;
    }
    if r == 0.0 {
        return Some(-year0 / net);
    }
    // net * (1 - (1+r)^-t) / r = -year0
    let x = 1.0 + year0 * r / net;
    (x > 0.0).then(|| -x.ln() / (1.0 + r).ln())
}

/// First point where the cumulative cashflow reaches zero, interpolated
/// linearly within the year.
fn interpolated_payback(year0: f64, flows: &[f64]) -> Option<f64> {
    if year0 >= 0.0 {
        return Some(0.0);
    }
    let mut cumulative = year0;
    for (i, cf) in flows.iter().enumerate() {
        let before = cumulative;
        cumulative += cf;
        if cumulative >= 0.0 && *cf > 0.0 {
            return Some(i as f64 + (-before) / cf);
        }
    }
    None
}
