//! Deterministic candidate ladder generation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::candidate::{BatteryCandidate, HardConstraints};
use crate::reason::{Code, Diagnostics, missing, warn};
use crate::site::IntervalSummary;

/// Power ladder (kW).
pub const POWER_LADDER_KW: [f64; 14] = [
    25.0, 50.0, 75.0, 100.0, 150.0, 200.0, 250.0, 300.0, 400.0, 500.0, 750.0, 1000.0, 1500.0,
    2000.0,
];

/// Duration ladder (hours).
pub const DURATION_LADDER_H: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 6.0];

/// Peak multiple applied to average load when peak is unknown.
const AVG_TO_PEAK: f64 = 1.5;
/// Relaxation target as a share of site peak.
const RELAX_TARGET_PCT: f64 = 0.30;
const MIN_SURVIVORS: usize = 3;

/// Peak-coverage band used to keep ladder entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizingBand {
    pub min_coverage_pct: f64,
    pub max_coverage_pct: f64,
}

impl Default for SizingBand {
    fn default() -> Self {
        Self {
            min_coverage_pct: 0.10,
            max_coverage_pct: 0.60,
        }
    }
}

impl SizingBand {
    pub fn contains(&self, ratio: f64) -> bool {
        ratio >= self.min_coverage_pct - 1e-12 && ratio <= self.max_coverage_pct + 1e-12
    }
}

/// A candidate removed by a hard constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRejection {
    pub candidate_id: String,
    pub constraint_id: Code,
}

/// Generator output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidateList {
    pub site_peak_kw: Option<f64>,
    /// Survivors of both passes, ordered by kW then duration.
    pub candidates: Vec<BatteryCandidate>,
    /// Count before hard constraints were applied.
    pub pre_constraint_count: usize,
    pub rejections: Vec<CandidateRejection>,
    pub relaxed: bool,
    pub diagnostics: Diagnostics,
}

/// Builds the candidate grid for a site.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    pub band: SizingBand,
    pub chemistry: String,
}

impl CandidateGenerator {
    pub fn new(band: SizingBand, chemistry: &str) -> Self {
        Self {
            band,
            chemistry: chemistry.to_string(),
        }
    }

    /// Resolves site peak from the summary, falling back to `avg * 1.5`.
    pub fn site_peak_kw(
        summary: Option<&IntervalSummary>,
        diag: &mut Diagnostics,
    ) -> Option<f64> {
        let summary = summary?;
        if let Some(peak) = summary.peak_kw.filter(|p| p.is_finite() && *p > 0.0) {
            return Some(peak);
        }
        let avg = summary.avg_kw.filter(|a| a.is_finite() && *a > 0.0)?;
        diag.warn(warn::PEAK_FROM_AVERAGE);
        Some(avg * AVG_TO_PEAK)
    }

    /// Runs the band filter, optional relaxation, then hard constraints.
    pub fn generate(
        &self,
        summary: Option<&IntervalSummary>,
        constraints: &HardConstraints,
    ) -> CandidateList {
        let mut diagnostics = Diagnostics::default();
        let Some(peak) = Self::site_peak_kw(summary, &mut diagnostics) else {
            diagnostics.missing(missing::INTERVALS);
            return CandidateList {
                diagnostics,
                ..CandidateList::default()
            };
        };

        let mut pool: Vec<BatteryCandidate> = POWER_LADDER_KW
            .iter()
            .filter(|&&kw| self.band.contains(kw / peak))
            .flat_map(|&kw| self.cross(kw))
            .collect();

        let relaxed = pool.len() < MIN_SURVIVORS;
        if relaxed {
            diagnostics.warn(warn::FILTER_RELAXED);
            pool = relaxed_powers(peak)
                .into_iter()
                .flat_map(|kw| self.cross(kw))
                .collect();
        }
        pool.sort_by(|a, b| {
            a.kw.total_cmp(&b.kw)
                .then_with(|| a.duration_h.total_cmp(&b.duration_h))
        });
        let pre_constraint_count = pool.len();

        let mut candidates = Vec::with_capacity(pool.len());
        let mut rejections = Vec::new();
        for c in pool {
            match constraints.first_violation(&c) {
                Some(constraint_id) => rejections.push(CandidateRejection {
                    candidate_id: c.id.clone(),
                    constraint_id,
                }),
                None => candidates.push(c),
            }
        }
        if candidates.is_empty() {
            diagnostics.warn(warn::ALL_REJECTED);
        }

        debug!(
            site_peak_kw = peak,
            pre_constraint_count,
            kept = candidates.len(),
            relaxed,
            "candidate grid generated"
        );

        CandidateList {
            site_peak_kw: Some(peak),
            candidates,
            pre_constraint_count,
            rejections,
            relaxed,
            diagnostics,
        }
    }

    fn cross(&self, kw: f64) -> impl Iterator<Item = BatteryCandidate> + '_ {
        DURATION_LADDER_H
            .iter()
            .map(move |&h| BatteryCandidate::new(kw, h, &self.chemistry))
    }
}

/// The three ladder powers closest to 30% of peak; ties go to the smaller kW.
fn relaxed_powers(peak_kw: f64) -> Vec<f64> {
    let target = RELAX_TARGET_PCT * peak_kw;
    let mut ladder = POWER_LADDER_KW.to_vec();
    ladder.sort_by(|a, b| {
        (a - target)
            .abs()
            .total_cmp(&(b - target).abs())
            .then_with(|| a.total_cmp(b))
    });
    ladder.truncate(MIN_SURVIVORS);
    ladder.sort_by(f64::total_cmp);
    ladder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(peak: Option<f64>, avg: Option<f64>) -> IntervalSummary {
        IntervalSummary {
            peak_kw: peak,
            avg_kw: avg,
            ..IntervalSummary::default()
        }
    }

    fn generator() -> CandidateGenerator {
        CandidateGenerator::new(SizingBand::default(), "LFP")
    }

    #[test]
    fn band_filter_for_500kw_site() {
        let list = generator().generate(
            Some(&summary(Some(500.0), None)),
            &HardConstraints::default(),
        );
        // 50..300 kW inside 10-60% of 500
        let kws: Vec<f64> = list.candidates.iter().map(|c| c.kw).collect();
        assert_eq!(kws.first(), Some(&50.0));
        assert_eq!(kws.last(), Some(&300.0));
        assert_eq!(list.candidates.len(), 7 * DURATION_LADDER_H.len());
        assert!(!list.relaxed);
        assert!(list.candidates.iter().any(|c| c.id == "100kw-2h"));
    }

    #[test]
    fn peak_falls_back_to_average() {
        let list = generator().generate(
            Some(&summary(None, Some(200.0))),
            &HardConstraints::default(),
        );
        assert_eq!(list.site_peak_kw, Some(300.0));
        assert!(list.diagnostics.warnings.contains(warn::PEAK_FROM_AVERAGE));
    }

    #[test]
    fn missing_summary_yields_empty_list() {
        let list = generator().generate(None, &HardConstraints::default());
        assert!(list.candidates.is_empty());
        assert!(list.diagnostics.missing_info.contains(missing::INTERVALS));
        assert!(!list.relaxed);
    }

    #[test]
    fn tiny_site_relaxes_to_three_powers() {
        // 10 kW site: nothing on the ladder falls in 1-6 kW
        let list = generator().generate(
            Some(&summary(Some(10.0), None)),
            &HardConstraints::default(),
        );
        assert!(list.relaxed);
        assert!(list.diagnostics.warnings.contains(warn::FILTER_RELAXED));
        let mut kws: Vec<f64> = list.candidates.iter().map(|c| c.kw).collect();
        kws.dedup();
        assert_eq!(kws, vec![25.0, 50.0, 75.0]);
    }

    #[test]
    fn relaxation_ties_prefer_smaller_kw() {
        // target = 0.3 * 250 = 75 -> 75, then 50 and 100 tie at 25 away
        assert_eq!(relaxed_powers(250.0), vec![50.0, 75.0, 100.0]);
        // target = 87.5 -> 75 and 100 tie at 12.5, then 50 vs 150 (37.5 vs 62.5)
        assert_eq!(relaxed_powers(87.5 / 0.3), vec![50.0, 75.0, 100.0]);
    }

    #[test]
    fn at_least_three_before_constraints_for_any_positive_peak() {
        for peak in [0.5, 3.0, 41.0, 120.0, 999.0, 5000.0, 1.0e6] {
            let hc = HardConstraints::default();
            let list = generator().generate(Some(&summary(Some(peak), None)), &hc);
            assert!(list.pre_constraint_count >= 3, "peak {peak}");
        }
    }

    #[test]
    fn hard_constraints_record_binding_id() {
        let hc = HardConstraints {
            max_kwh: Some(400.0),
            ..HardConstraints::default()
        };
        let list = generator().generate(Some(&summary(Some(500.0), None)), &hc);
        assert!(list.candidates.iter().all(|c| c.kwh <= 400.0));
        assert!(
            list.rejections
                .iter()
                .all(|r| r.constraint_id == crate::battery::candidate::MAX_KWH)
        );
        assert_eq!(
            list.candidates.len() + list.rejections.len(),
            list.pre_constraint_count
        );
    }

    #[test]
    fn zero_survivors_is_terminal_not_error() {
        let hc = HardConstraints {
            max_kw: Some(1.0),
            ..HardConstraints::default()
        };
        let list = generator().generate(Some(&summary(Some(500.0), None)), &hc);
        assert!(list.candidates.is_empty());
        assert!(list.diagnostics.warnings.contains(warn::ALL_REJECTED));
    }
}
