//! The decision pack returned to callers.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::audit::BoundedAudit;
use super::rank::ScoredCandidate;
use super::recommendation::Recommendation;
use super::sensitivity::SensitivityScenario;
use crate::battery::{AppliedConstraint, CandidateRejection};
use crate::dispatch::DispatchStep;
use crate::economics::{ConfidenceTier, SavingsBreakdown};
use crate::reason::Code;
use crate::units::round2;

/// Method tag stamped on every pack.
pub const METHOD: &str = "btm_storage_sizing.greedy_tou_v1";

/// Number of candidates surfaced in the pack.
pub const TOP_N: usize = 3;

/// Caller-supplied version tags, copied through for provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineVersions {
    pub decision: String,
    pub dispatch: String,
    pub economics: String,
    pub tariff_snapshot: Option<String>,
    pub sgip_snapshot: Option<String>,
}

impl Default for EngineVersions {
    fn default() -> Self {
        let v = env!("CARGO_PKG_VERSION").to_string();
        Self {
            decision: v.clone(),
            dispatch: v.clone(),
            economics: v,
            tariff_snapshot: None,
            sgip_snapshot: None,
        }
    }
}

/// Economics summary of one candidate, dollar figures in cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub rank: usize,
    pub candidate_id: String,
    pub kw: f64,
    pub kwh: f64,
    pub duration_h: f64,
    pub score: f64,
    pub accepted: bool,
    pub rejections: Vec<Code>,
    pub confidence_tier: ConfidenceTier,
    pub capex_usd: Option<f64>,
    pub opex_annual_usd: Option<f64>,
    pub savings_annual: SavingsBreakdown,
    pub net_annual_usd: Option<f64>,
    pub npv_usd: Option<f64>,
    pub simple_payback_years: Option<f64>,
    pub discounted_payback_years: Option<f64>,
    pub demand_peak_before_kw: Option<f64>,
    pub demand_peak_after_kw: Option<f64>,
    pub why_not_better: Vec<Code>,
    pub narrative: Vec<String>,
}

fn cents(s: SavingsBreakdown) -> SavingsBreakdown {
    let r = |v: Option<f64>| v.map(round2);
    SavingsBreakdown {
        demand: r(s.demand),
        energy: r(s.energy),
        ratchet: r(s.ratchet),
        dr: r(s.dr),
        other: r(s.other),
        total: r(s.total),
    }
}

impl CandidateSummary {
    pub fn from_scored(rank: usize, s: &ScoredCandidate) -> Self {
        let e = &s.economics;
        let cf = e.cashflow.as_ref();
        Self {
            rank,
            candidate_id: s.candidate.id.clone(),
            kw: s.candidate.kw,
            kwh: s.candidate.kwh,
            duration_h: s.candidate.duration_h,
            score: s.score,
            accepted: s.gate.accepted,
            rejections: s.gate.rejections.clone(),
            confidence_tier: e.confidence_tier,
            capex_usd: e.capex_total().map(round2),
            opex_annual_usd: e.opex_annual.map(|o| round2(o.total)),
            savings_annual: cents(e.savings_annual),
            net_annual_usd: e.net_annual().map(round2),
            npv_usd: e.npv().map(round2),
            simple_payback_years: cf.and_then(|c| c.simple_payback_years),
            discounted_payback_years: cf.and_then(|c| c.discounted_payback_years),
            demand_peak_before_kw: s.dispatch.as_ref().and_then(|d| d.demand_peak_before_kw),
            demand_peak_after_kw: s.dispatch.as_ref().and_then(|d| d.demand_peak_after_kw),
            why_not_better: s.why_not_better.clone(),
            narrative: s.narrative.clone(),
        }
    }
}

/// The first `TOP_N` ranked summaries. A selected candidate ranked below
/// them takes the last slot, so the list stays in rank order.
pub fn top_candidates(
    ranked: &[CandidateSummary],
    selected: Option<&str>,
) -> Vec<CandidateSummary> {
    let mut top: Vec<CandidateSummary> = ranked.iter().take(TOP_N).cloned().collect();
    let Some(id) = selected else {
        return top;
    };
    if top.iter().any(|c| c.candidate_id == id) {
        return top;
    }
    if let Some(pick) = ranked.iter().find(|c| c.candidate_id == id) {
        top.truncate(TOP_N - 1);
        top.push(pick.clone());
    }
    top
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selected {
    pub candidate_id: Option<String>,
}

/// Full result of a sizing run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionPack {
    pub method: &'static str,
    pub versions: EngineVersions,
    pub confidence_tier: ConfidenceTier,
    pub warnings: BTreeSet<Code>,
    pub missing_info: BTreeSet<Code>,
    pub site_peak_kw: Option<f64>,
    pub candidates_evaluated: usize,
    pub candidates_omitted: usize,
    pub top_candidates: Vec<CandidateSummary>,
    pub selected: Selected,
    pub applied_constraints: Vec<AppliedConstraint>,
    pub constraint_rejections: Vec<CandidateRejection>,
    pub sensitivity: Vec<SensitivityScenario>,
    pub recommendation: Recommendation,
    pub audit: BoundedAudit,
    pub ok: bool,
    /// Every scored candidate in rank order, for tabular export.
    #[serde(skip)]
    pub ranked: Vec<CandidateSummary>,
    /// Dispatch trace of the selected candidate.
    #[serde(skip)]
    pub selected_trace: Vec<DispatchStep>,
}

impl DecisionPack {
    /// Pretty JSON.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialisation failures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn selected_summary(&self) -> Option<&CandidateSummary> {
        let id = self.selected.candidate_id.as_deref()?;
        self.top_candidates
            .iter()
            .chain(&self.ranked)
            .find(|c| c.candidate_id == id)
    }
}

fn opt(v: Option<f64>, unit: &str) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.2}{unit}"))
}

impl fmt::Display for DecisionPack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Storage Sizing Decision ---")?;
        writeln!(f, "Method:             {}", self.method)?;
        writeln!(f, "Confidence:         {}", self.confidence_tier)?;
        writeln!(f, "Site peak:          {}", opt(self.site_peak_kw, " kW"))?;
        writeln!(
            f,
            "Candidates:         {} evaluated, {} omitted",
            self.candidates_evaluated, self.candidates_omitted
        )?;
        match self.selected_summary() {
            Some(c) => {
                writeln!(f, "Selected:           {}", c.candidate_id)?;
                writeln!(f, "Capex:              {}", opt(c.capex_usd, " $"))?;
                writeln!(f, "Annual savings:     {}", opt(c.savings_annual.total, " $"))?;
                writeln!(f, "NPV:                {}", opt(c.npv_usd, " $"))?;
                writeln!(
                    f,
                    "Simple payback:     {}",
                    opt(c.simple_payback_years, " years")
                )?;
            }
            None => writeln!(f, "Selected:           none")?,
        }
        writeln!(f, "Recommendation:     {}", self.recommendation.summary)?;
        if let Some(r) = &self.audit.reconcile {
            writeln!(f, "Audit reconcile:    {} delta {:.4} ({})", r.id, r.delta, r.ok)?;
        }
        write!(
            f,
            "Warnings:           {} | missing info: {}",
            self.warnings.len(),
            self.missing_info.len()
        )
    }
}
