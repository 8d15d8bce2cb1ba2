//! Wires generation, dispatch, economics, gate and score into a decision pack.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::audit::{BoundedAudit, DEFAULT_AUDIT_CAP, bound};
use super::gate::GatePolicy;
use super::pack::{CandidateSummary, DecisionPack, EngineVersions, METHOD, Selected, top_candidates};
use super::rank::{ScoredCandidate, rank, select};
use super::recommendation::recommend;
use super::score::score;
use super::sensitivity::{payback_of, scenarios};
use crate::battery::{
    BatteryCandidate, BatteryTechnology, CandidateGenerator, HardConstraints, SizingBand,
};
use crate::dispatch::{DispatchSimulator, RepresentativeCycle, representative_cycle};
use crate::economics::{
    ConfidenceTier, EconomicsAssumptions, EconomicsInput, EconomicsOutput, evaluate,
};
use crate::reason::{Code, Diagnostics, missing, warn as code};
use crate::site::{
    BillingDeterminants, DrReadiness, IntervalPoint, IntervalSummary, TariffSignals,
};

/// Every input of one sizing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Reference instant used when only a load shape is available.
    pub as_of: DateTime<Utc>,
    pub timezone: Tz,
    pub intervals: Option<Vec<IntervalPoint>>,
    /// Overrides the summary derived from `intervals`.
    pub summary: Option<IntervalSummary>,
    pub tariff: Option<TariffSignals>,
    pub determinants: Option<BillingDeterminants>,
    pub dr: Option<DrReadiness>,
    pub constraints: HardConstraints,
    pub battery: BatteryTechnology,
    pub band: SizingBand,
    pub gate: GatePolicy,
    pub economics: EconomicsAssumptions,
    pub audit_cap: usize,
    pub versions: EngineVersions,
    /// Keep the per-interval dispatch trace of the selected candidate.
    pub record_trace: bool,
}

impl DecisionRequest {
    /// A request with default assumptions and no site data.
    pub fn new(as_of: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            as_of,
            timezone,
            intervals: None,
            summary: None,
            tariff: None,
            determinants: None,
            dr: None,
            constraints: HardConstraints::default(),
            battery: BatteryTechnology::default(),
            band: SizingBand::default(),
            gate: GatePolicy::default(),
            economics: EconomicsAssumptions::default(),
            audit_cap: DEFAULT_AUDIT_CAP,
            versions: EngineVersions::default(),
            record_trace: false,
        }
    }
}

/// Failure evaluating a single candidate. The candidate is omitted from the pack.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("candidate {candidate}: {field} is not finite")]
    NonFinite { candidate: String, field: &'static str },
}

fn finite(candidate: &str, field: &'static str, v: Option<f64>) -> Result<(), EvaluationError> {
    match v {
        Some(x) if !x.is_finite() => Err(EvaluationError::NonFinite {
            candidate: candidate.to_string(),
            field,
        }),
        _ => Ok(()),
    }
}

fn check_finite(e: &EconomicsOutput, score: f64) -> Result<(), EvaluationError> {
    let id = e.candidate_id.as_str();
    finite(id, "capex", e.capex_total())?;
    finite(id, "savings", e.savings_annual.total)?;
    finite(id, "npv", e.npv())?;
    finite(id, "net_annual", e.net_annual())?;
    finite(id, "simple_payback", e.simple_payback_years())?;
    finite(id, "score", Some(score))
}

/// Gate rejections first, then component reasons, without repeats.
fn why_not_better(gate_rejections: &[Code], economics: &EconomicsOutput) -> Vec<Code> {
    let mut out: Vec<Code> = gate_rejections.to_vec();
    for code in economics.reasons_by_component.values().flatten() {
        if !out.contains(code) {
            out.push(*code);
        }
    }
    out
}

fn usd(v: Option<f64>) -> String {
    v.map_or_else(|| "unknown".to_string(), |x| format!("${x:.0}"))
}

fn narrative(s: &ScoredCandidate) -> Vec<String> {
    let e = &s.economics;
    let mut lines = vec![format!(
        "{} kW / {} kWh ({} h): capex {}, annual savings {}, NPV {}",
        s.candidate.kw,
        s.candidate.kwh,
        s.candidate.duration_h,
        usd(e.capex_total()),
        usd(e.savings_annual.total),
        usd(e.npv()),
    )];
    if let Some(d) = &s.dispatch {
        if let (Some(before), Some(after)) = (d.demand_peak_before_kw, d.demand_peak_after_kw) {
            lines.push(format!("Peak demand {before:.1} kW -> {after:.1} kW"));
        }
    }
    match e.simple_payback_years() {
        Some(p) => lines.push(format!("Simple payback {p:.1} years")),
        None => lines.push("Payback not reached within the analysis horizon".to_string()),
    }
    if s.gate.accepted {
        lines.push("Passes every acceptance gate".to_string());
    } else {
        lines.push(format!("Rejected: {}", s.gate.rejections.join(", ")));
    }
    lines
}

/// Per-run context shared by every candidate.
struct RunContext<'a> {
    req: &'a DecisionRequest,
    site_peak_kw: Option<f64>,
    cycle: Option<&'a RepresentativeCycle>,
    simulator: DispatchSimulator,
}

impl RunContext<'_> {
    fn evaluate_candidate(
        &self,
        c: &BatteryCandidate,
    ) -> Result<ScoredCandidate, EvaluationError> {
        let req = self.req;
        let tariff = req.tariff.as_ref();
        let table = tariff.and_then(TariffSignals::preferred_table);
        let params = req.battery.params_for(c.kw, c.kwh);

        let dispatch = self.cycle.map(|rc| {
            self.simulator
                .simulate(&c.id, &rc.cycle, &rc.points, table, &params)
        });
        let economics = evaluate(&EconomicsInput {
            candidate: c,
            params: &params,
            site_peak_kw: self.site_peak_kw,
            dispatch: dispatch.as_ref(),
            table,
            demand_charge_per_kw_month: tariff.and_then(|t| t.demand_charge_per_kw_month),
            billed_demand_kw: self
                .cycle
                .and_then(|rc| rc.billed_demand_kw)
                .or_else(|| req.determinants.as_ref().and_then(|d| d.billed_demand_kw)),
            determinants: req.determinants.as_ref(),
            dr: req.dr.as_ref(),
            bill_period_start: self.cycle.map(|rc| rc.cycle.start),
            synthetic_load: self.cycle.is_some_and(|rc| rc.synthetic_load),
            assumptions: &req.economics,
        });
        let score = score(&economics);
        check_finite(&economics, score)?;

        let gate = req.gate.check(c, self.site_peak_kw, &economics);
        debug!(
            candidate = %c.id,
            score,
            accepted = gate.accepted,
            tier = %economics.confidence_tier,
            "candidate evaluated"
        );
        let mut scored = ScoredCandidate {
            candidate: c.clone(),
            score,
            why_not_better: why_not_better(&gate.rejections, &economics),
            gate,
            economics,
            dispatch,
            narrative: Vec::new(),
        };
        scored.narrative = narrative(&scored);
        Ok(scored)
    }
}

/// Runs the full sizing pipeline. Never fails; worst case the pack has `ok = false`.
pub fn run(req: &DecisionRequest) -> DecisionPack {
    let mut diag = Diagnostics::default();
    let points: &[IntervalPoint] = req.intervals.as_deref().unwrap_or_default();
    if req.intervals.is_none() {
        diag.missing(missing::INTERVALS);
    }
    let summary = req.summary.clone().or_else(|| {
        req.intervals
            .as_ref()
            .map(|p| IntervalSummary::from_points(p, req.timezone))
    });

    match &req.tariff {
        None => diag.missing(missing::TARIFF_PRICE_SIGNALS),
        Some(t) => {
            if t.preferred_table().is_none() {
                diag.missing(missing::TARIFF_PRICE_SIGNALS);
            }
            if t.demand_charge_per_kw_month.is_none() {
                diag.missing(missing::DEMAND_CHARGE);
            }
            if t.lacks_generation_rates() {
                diag.warn(code::GENERATION_RATES_MISSING);
            }
        }
    }

    let list = CandidateGenerator::new(req.band, &req.battery.chemistry)
        .generate(summary.as_ref(), &req.constraints);
    diag.absorb(&list.diagnostics);

    let cycle = representative_cycle(
        req.determinants.as_ref(),
        points,
        summary.as_ref(),
        req.timezone,
        req.as_of,
    );
    if let Some(rc) = &cycle {
        diag.absorb(&rc.diagnostics);
    }

    let ctx = RunContext {
        req,
        site_peak_kw: list.site_peak_kw,
        cycle: cycle.as_ref(),
        simulator: DispatchSimulator {
            record_trace: req.record_trace,
        },
    };

    let mut scored = Vec::with_capacity(list.candidates.len());
    let mut omitted = 0;
    for c in &list.candidates {
        match ctx.evaluate_candidate(c) {
            Ok(s) => scored.push(s),
            Err(e) => {
                warn!(candidate = %c.id, error = %e, "candidate omitted");
                diag.warn(code::CANDIDATE_OMITTED);
                omitted += 1;
            }
        }
    }
    rank(&mut scored);

    let selected = select(&scored);
    let sensitivity = scenarios(selected.and_then(|s| s.economics.basis.as_ref()));
    let confidence_tier = selected.map_or(ConfidenceTier::None, |s| s.economics.confidence_tier);
    let recommendation = recommend(
        payback_of(&sensitivity, "base"),
        payback_of(&sensitivity, "capex_plus_15pct"),
        confidence_tier,
    );
    let audit = selected.map_or_else(
        || BoundedAudit {
            cap: req.audit_cap,
            ..BoundedAudit::default()
        },
        |s| bound(&s.economics.audit_line_items, req.audit_cap),
    );

    if let Some(s) = selected {
        diag.absorb(&s.economics.diagnostics());
    }
    let any_accepted = scored.iter().any(|s| s.gate.accepted);
    if !scored.is_empty() && !any_accepted {
        diag.warn(code::NO_ACCEPTED_CANDIDATE);
    }

    let ranked: Vec<CandidateSummary> = scored
        .iter()
        .enumerate()
        .map(|(i, s)| CandidateSummary::from_scored(i + 1, s))
        .collect();
    let selected_id = selected.map(|s| s.candidate.id.clone());
    let top_candidates = top_candidates(&ranked, selected_id.as_deref());
    let selected_trace = selected
        .and_then(|s| s.dispatch.as_ref())
        .map(|d| d.trace.clone())
        .unwrap_or_default();
    let reconcile_ok = audit.reconcile.as_ref().is_none_or(|r| r.ok);

    let pack = DecisionPack {
        method: METHOD,
        versions: req.versions.clone(),
        confidence_tier,
        warnings: diag.warnings,
        missing_info: diag.missing_info,
        site_peak_kw: list.site_peak_kw,
        candidates_evaluated: scored.len(),
        candidates_omitted: omitted,
        top_candidates,
        selected: Selected {
            candidate_id: selected_id,
        },
        applied_constraints: req.constraints.applied(),
        constraint_rejections: list.rejections,
        sensitivity,
        recommendation,
        audit,
        ok: any_accepted && reconcile_ok,
        ranked,
        selected_trace,
    };
    info!(
        selected = pack.selected.candidate_id.as_deref().unwrap_or("none"),
        evaluated = pack.candidates_evaluated,
        omitted = pack.candidates_omitted,
        tier = %pack.confidence_tier,
        ok = pack.ok,
        "decision pack built"
    );
    pack
}
