//! Capacity fade over the analysis horizon and the capital it triggers.

use serde::Serialize;

use super::assumptions::{DegradationAssumptions, DegradationMode};

/// What a degradation capex event pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationEventKind {
    Augmentation,
    Replacement,
}

/// A capital outlay in a given year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegradationEvent {
    pub year: u32,
    pub kind: DegradationEventKind,
    pub cost_usd: f64,
    /// Capacity fraction that triggered the event.
    pub capacity_fraction: f64,
}

/// Capacity by year and the events that maintain it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DegradationPlan {
    /// Index 0 is year 1.
    pub capacity_by_year: Vec<f64>,
    pub events: Vec<DegradationEvent>,
}

impl DegradationPlan {
    pub fn total_cost(&self) -> f64 {
        self.events.iter().map(|e| e.cost_usd).sum()
    }

    /// Event cost in `year` (1-based).
    pub fn cost_in_year(&self, year: u32) -> f64 {
        self.events
            .iter()
            .filter(|e| e.year == year)
            .map(|e| e.cost_usd)
            .sum()
    }

    /// Cost of one kind of event in `year` (1-based).
    pub fn cost_of_kind_in_year(&self, kind: DegradationEventKind, year: u32) -> f64 {
        self.events
            .iter()
            .filter(|e| e.year == year && e.kind == kind)
            .map(|e| e.cost_usd)
            .sum()
    }

    pub fn has_replacement(&self) -> bool {
        self.events
            .iter()
            .any(|e| e.kind == DegradationEventKind::Replacement)
    }
}

/// Builds the fade plan.
///
/// Capacity is nameplate through year 1 and fades from year 2. `Hold` buys back
/// each year's fade from year 2; `ReplaceAtEol` replaces once, the first year
/// capacity falls below end-of-life.
///
/// # Arguments
///
/// * `kwh` - Nameplate energy
/// * `capex_total` - Installed cost, for replacement pricing
/// * `per_kwh` - Augmentation price ($/kWh)
/// * `years` - Analysis horizon
pub fn plan(
    kwh: f64,
    capex_total: f64,
    per_kwh: f64,
    years: u32,
    a: &DegradationAssumptions,
) -> DegradationPlan {
    let fade = a.annual_fade_pct.clamp(0.0, 1.0);
    let mut plan = DegradationPlan::default();
    let mut capacity = 1.0;
    let mut replaced = false;

    for year in 1..=years {
        if year > 1 {
            capacity *= 1.0 - fade;
        }
        match a.mode {
            DegradationMode::Hold if year > 1 => {
                plan.events.push(DegradationEvent {
                    year,
                    kind: DegradationEventKind::Augmentation,
                    cost_usd: kwh * fade * per_kwh,
                    capacity_fraction: 1.0 - fade,
                });
                capacity = 1.0;
            }
            DegradationMode::ReplaceAtEol if !replaced && capacity < a.eol_pct => {
                replaced = true;
                plan.events.push(DegradationEvent {
                    year,
                    kind: DegradationEventKind::Replacement,
                    cost_usd: a.replacement_cost_pct * capex_total,
                    capacity_fraction: capacity,
                });
                capacity = 1.0;
            }
            _ => {}
        }
        plan.capacity_by_year.push(capacity);
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(mode: DegradationMode) -> DegradationAssumptions {
        DegradationAssumptions {
            mode,
            annual_fade_pct: 0.05,
            eol_pct: 0.80,
            replacement_cost_pct: 0.5,
            augmentation_per_kwh: None,
        }
    }

    #[test]
    fn hold_augments_every_year_after_the_first() {
        let p = plan(200.0, 100_000.0, 300.0, 10, &a(DegradationMode::Hold));
        assert_eq!(p.events.len(), 9);
        assert_eq!(p.events[0].year, 2);
        assert_eq!(p.cost_in_year(1), 0.0);
        assert!(p.capacity_by_year.iter().all(|c| *c == 1.0));
        assert!((p.cost_in_year(3) - 3_000.0).abs() < 1e-9);
        assert_eq!(
            p.cost_of_kind_in_year(DegradationEventKind::Replacement, 3),
            0.0
        );
    }

    #[test]
    fn replace_at_eol_resets_capacity_once_below_threshold() {
        let p = plan(200.0, 100_000.0, 300.0, 10, &a(DegradationMode::ReplaceAtEol));
        // 0.95^4 = 0.8145, 0.95^5 = 0.7738 -> year 6 replaces
        assert_eq!(p.events.len(), 1);
        assert_eq!(p.events[0].year, 6);
        assert_eq!(p.capacity_by_year[5], 1.0);
        assert!((p.capacity_by_year[4] - 0.95_f64.powi(4)).abs() < 1e-12);
        assert!(p.has_replacement());
        assert_eq!(p.total_cost(), 50_000.0);
    }

    #[test]
    fn replace_at_eol_happens_once_over_long_horizon() {
        let p = plan(200.0, 100_000.0, 300.0, 25, &a(DegradationMode::ReplaceAtEol));
        assert_eq!(p.events.len(), 1);
        assert_eq!(p.events[0].year, 6);
        // Fades again after the replacement, without a second one.
        assert!((p.capacity_by_year[24] - 0.95_f64.powi(19)).abs() < 1e-12);
        assert!(p.capacity_by_year[24] < 0.80);
        assert_eq!(p.total_cost(), 50_000.0);
    }

    #[test]
    fn fade_only_never_spends() {
        let p = plan(200.0, 100_000.0, 300.0, 10, &a(DegradationMode::FadeOnly));
        assert!(p.events.is_empty());
        assert!((p.capacity_by_year[9] - 0.95_f64.powi(9)).abs() < 1e-12);
    }
}
