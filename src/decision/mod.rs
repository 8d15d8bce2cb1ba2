//! Gate, score, rank and package candidates into a decision pack.

/// Size-bounded audit.
pub mod audit;
pub mod gate;
pub mod orchestrator;
/// Decision pack DTOs.
pub mod pack;
pub mod rank;
pub mod recommendation;
pub mod score;
pub mod sensitivity;

pub use audit::{BoundedAudit, DEFAULT_AUDIT_CAP};
pub use gate::{GatePolicy, GateResult};
pub use orchestrator::{DecisionRequest, EvaluationError, run};
pub use pack::{CandidateSummary, DecisionPack, EngineVersions};
pub use rank::ScoredCandidate;
pub use recommendation::{Recommendation, RecommendationTier};
pub use sensitivity::SensitivityScenario;

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use crate::battery::BatteryCandidate;
    use crate::economics::cost::CapexBreakdown;
    use crate::economics::finance::FinanceMethod;
    use crate::economics::{Cashflow, ConfidenceTier, EconomicsOutput, SavingsBreakdown};
    use crate::reason::reject;

    pub(crate) fn cashflow(npv: f64, net_annual: f64, payback: Option<f64>) -> Cashflow {
        Cashflow {
            method: FinanceMethod::Annuity,
            year0: -100_000.0,
            years: vec![net_annual; 10],
            net_annual,
            npv,
            simple_payback_years: payback,
            discounted_payback_years: payback.map(|p| p * 1.3),
        }
    }

    pub(crate) fn economics(id: &str, cashflow: Option<Cashflow>) -> EconomicsOutput {
        EconomicsOutput {
            candidate_id: id.to_string(),
            confidence_tier: ConfidenceTier::High,
            capex: Some(CapexBreakdown {
                hardware: 100_000.0,
                install: 0.0,
                interconnect: 0.0,
                soft_costs: 0.0,
                contingency: 0.0,
                total: 100_000.0,
            }),
            opex_annual: None,
            savings_annual: SavingsBreakdown::default(),
            incentives: Default::default(),
            tax: Default::default(),
            degradation: None,
            cashflow,
            audit_line_items: Vec::new(),
            warnings: BTreeSet::new(),
            missing_info: BTreeSet::new(),
            reasons_by_component: BTreeMap::new(),
            basis: None,
        }
    }

    fn scored(kw: f64, score: f64, npv: f64) -> ScoredCandidate {
        let candidate = BatteryCandidate::new(kw, 2.0, "LFP");
        let economics = economics(&candidate.id, Some(cashflow(npv, 10_000.0, Some(8.0))));
        ScoredCandidate {
            candidate,
            score,
            gate: GateResult {
                accepted: true,
                rejections: Vec::new(),
            },
            economics,
            dispatch: None,
            why_not_better: Vec::new(),
            narrative: Vec::new(),
        }
    }

    #[test]
    fn payback_over_cap_is_rejected() {
        let c = BatteryCandidate::new(100.0, 2.0, "LFP");
        let e = economics(&c.id, Some(cashflow(5_000.0, 8_000.0, Some(15.0))));
        let g = GatePolicy::default().check(&c, Some(500.0), &e);
        assert!(!g.accepted);
        assert_eq!(g.rejections, vec![reject::PAYBACK_TOO_LONG]);
    }

    #[test]
    fn gate_collects_every_reason() {
        let c = BatteryCandidate::new(25.0, 0.5, "LFP");
        let e = economics(&c.id, Some(cashflow(-1.0, -1.0, None)));
        let g = GatePolicy::default().check(&c, Some(1_000.0), &e);
        assert_eq!(
            g.rejections,
            vec![
                reject::DURATION_BELOW_MIN,
                reject::COVERAGE_OUT_OF_BAND,
                reject::PAYBACK_TOO_LONG,
                reject::NPV_BELOW_FLOOR,
                reject::NET_ANNUAL_BELOW_FLOOR,
            ]
        );
    }

    #[test]
    fn missing_cashflow_is_economics_unavailable() {
        let c = BatteryCandidate::new(100.0, 2.0, "LFP");
        let g = GatePolicy::default().check(&c, None, &economics(&c.id, None));
        assert_eq!(g.rejections, vec![reject::ECONOMICS_UNAVAILABLE]);
    }

    #[test]
    fn score_follows_linear_formula() {
        let e = economics("a", Some(cashflow(50_000.0, 10_000.0, Some(4.0))));
        // 1 + 1 - 1.4 - 0.2
        assert!((score::score(&e) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn unknown_economics_scores_below_known() {
        let unknown = economics("a", None);
        let known = economics("b", Some(cashflow(0.0, 0.0, Some(20.0))));
        assert!(score::score(&unknown) < score::score(&known));
    }

    #[test]
    fn each_distinct_warning_lowers_score() {
        let base = economics("a", Some(cashflow(0.0, 0.0, Some(5.0))));
        let mut noisy = base.clone();
        noisy.warnings.insert(crate::reason::warn::ENERGY_PROXY);
        noisy.warnings.insert(crate::reason::warn::SGIP_CAPPED);
        assert!((score::score(&base) - score::score(&noisy) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn higher_score_ranks_first() {
        let mut v = vec![scored(100.0, 5.0, 0.0), scored(200.0, 10.0, 0.0)];
        rank::rank(&mut v);
        assert_eq!(v[0].id(), "200kw-2h");
    }

    #[test]
    fn score_ties_break_on_npv_then_id() {
        let mut v = vec![
            scored(300.0, 1.0, 10.0),
            scored(200.0, 1.0, 20.0),
            scored(100.0, 1.0, 10.0),
        ];
        rank::rank(&mut v);
        let ids: Vec<&str> = v.iter().map(ScoredCandidate::id).collect();
        assert_eq!(ids, vec!["200kw-2h", "100kw-2h", "300kw-2h"]);
    }

    #[test]
    fn select_prefers_first_accepted() {
        let mut top = scored(100.0, 9.0, 0.0);
        top.gate = GateResult {
            accepted: false,
            rejections: vec![reject::PAYBACK_TOO_LONG],
        };
        let v = vec![top, scored(200.0, 3.0, 0.0)];
        assert_eq!(rank::select(&v).map(ScoredCandidate::id), Some("200kw-2h"));

        let none_accepted = vec![v[0].clone()];
        assert_eq!(
            rank::select(&none_accepted).map(ScoredCandidate::id),
            Some("100kw-2h")
        );
    }

    #[test]
    fn selected_below_top_three_takes_last_slot() {
        let mut v: Vec<ScoredCandidate> = (1..=5)
            .map(|i| scored(f64::from(i) * 50.0, f64::from(10 - i), 0.0))
            .collect();
        for s in v.iter_mut().take(4) {
            s.gate = GateResult {
                accepted: false,
                rejections: vec![reject::COVERAGE_OUT_OF_BAND],
            };
        }
        rank::rank(&mut v);
        let picked = rank::select(&v).map(|s| s.id().to_string());
        assert_eq!(picked.as_deref(), Some("250kw-2h"));

        let ranked: Vec<CandidateSummary> = v
            .iter()
            .enumerate()
            .map(|(i, s)| CandidateSummary::from_scored(i + 1, s))
            .collect();
        let top = pack::top_candidates(&ranked, picked.as_deref());
        let ids: Vec<&str> = top.iter().map(|c| c.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["50kw-2h", "100kw-2h", "250kw-2h"]);
        let ranks: Vec<usize> = top.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![1, 2, 5]);

        let unchanged = pack::top_candidates(&ranked, Some("100kw-2h"));
        assert_eq!(unchanged, ranked[..3].to_vec());
    }
}
