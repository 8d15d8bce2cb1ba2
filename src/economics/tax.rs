//! Investment tax credit and MACRS depreciation benefit.

use serde::Serialize;

use super::assumptions::{ItcAssumptions, MacrsAssumptions, MacrsClass};
use crate::reason::{Outcome, missing};

/// Half-year convention, 5-year property.
pub const MACRS_5_YEAR: [f64; 6] = [0.20, 0.32, 0.192, 0.1152, 0.1152, 0.0576];
/// Half-year convention, 7-year property.
pub const MACRS_7_YEAR: [f64; 8] = [
    0.1429, 0.2449, 0.1749, 0.1249, 0.0893, 0.0892, 0.0893, 0.0446,
];

impl MacrsClass {
    pub fn schedule(self) -> &'static [f64] {
        match self {
            Self::FiveYear => &MACRS_5_YEAR,
            Self::SevenYear => &MACRS_7_YEAR,
        }
    }
}

/// Credit amount ($).
pub fn itc_amount(capex_total: f64, a: &ItcAssumptions) -> f64 {
    (a.itc_pct * capex_total).max(0.0)
}

/// Depreciable basis after incentives and the ITC basis reduction.
pub fn depreciable_basis(
    capex_total: f64,
    sgip_usd: f64,
    itc_usd: f64,
    itc: Option<&ItcAssumptions>,
) -> f64 {
    let reduction = itc.map_or(0.0, |a| a.basis_reduction_pct * itc_usd);
    (capex_total - sgip_usd - reduction).max(0.0)
}

/// Tax value of depreciation, by year starting at year 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacrsBenefit {
    pub class: MacrsClass,
    pub basis: f64,
    pub tax_rate: f64,
    pub schedule: Vec<f64>,
    pub total: f64,
}

impl MacrsBenefit {
    /// Benefit in `year` (1-based); zero outside the schedule.
    pub fn in_year(&self, year: usize) -> f64 {
        year.checked_sub(1)
            .and_then(|i| self.schedule.get(i))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Depreciation deductions times the combined tax rate.
///
/// # Errors
///
/// `missing_tax_rate` when no rate is configured.
pub fn macrs_benefit(basis: f64, a: &MacrsAssumptions) -> Outcome<MacrsBenefit> {
    let tax_rate = a.tax_rate.ok_or_else(|| vec![missing::TAX_RATE])?;
    let schedule: Vec<f64> = a
        .class
        .schedule()
        .iter()
        .map(|pct| basis * pct * tax_rate)
        .collect();
    Ok(MacrsBenefit {
        class: a.class,
        basis,
        tax_rate,
        total: schedule.iter().sum(),
        schedule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedules_sum_to_one() {
        let five: f64 = MACRS_5_YEAR.iter().sum();
        let seven: f64 = MACRS_7_YEAR.iter().sum();
        assert!((five - 1.0).abs() < 1e-9);
        assert!((seven - 1.0).abs() < 1e-3);
    }

    #[test]
    fn basis_nets_sgip_and_half_itc() {
        let a = ItcAssumptions::default();
        let itc = itc_amount(100_000.0, &a);
        assert!((itc - 30_000.0).abs() < 1e-9);
        let basis = depreciable_basis(100_000.0, 10_000.0, itc, Some(&a));
        assert!((basis - 75_000.0).abs() < 1e-9);
        assert_eq!(depreciable_basis(100_000.0, 10_000.0, 0.0, None), 90_000.0);
    }

    #[test]
    fn macrs_needs_tax_rate() {
        let a = MacrsAssumptions::default();
        assert_eq!(macrs_benefit(1.0, &a).unwrap_err(), vec![missing::TAX_RATE]);

        let a = MacrsAssumptions {
            class: MacrsClass::FiveYear,
            tax_rate: Some(0.25),
        };
        let b = macrs_benefit(100_000.0, &a).unwrap();
        assert_eq!(b.schedule.len(), 6);
        assert!((b.in_year(1) - 5_000.0).abs() < 1e-9);
        assert_eq!(b.in_year(0), 0.0);
        assert_eq!(b.in_year(7), 0.0);
        assert!((b.total - 25_000.0).abs() < 1e-6);
    }
}
