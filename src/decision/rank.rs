//! Scored candidates and their strict total order.

use std::cmp::Ordering;

use serde::Serialize;

use super::gate::GateResult;
use crate::battery::BatteryCandidate;
use crate::dispatch::DispatchCycleResult;
use crate::economics::EconomicsOutput;
use crate::reason::Code;

/// A candidate carried through dispatch, economics, gate and score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: BatteryCandidate,
    pub score: f64,
    pub gate: GateResult,
    pub economics: EconomicsOutput,
    pub dispatch: Option<DispatchCycleResult>,
    /// Gate rejections followed by component reasons.
    pub why_not_better: Vec<Code>,
    pub narrative: Vec<String>,
}

impl ScoredCandidate {
    pub fn id(&self) -> &str {
        &self.candidate.id
    }
}

/// Score desc, NPV desc, payback asc, id asc.
pub fn compare(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    let npv = |c: &ScoredCandidate| c.economics.npv().unwrap_or(f64::NEG_INFINITY);
    let payback = |c: &ScoredCandidate| c.economics.simple_payback_years().unwrap_or(f64::INFINITY);
    b.score
        .total_cmp(&a.score)
        .then_with(|| npv(b).total_cmp(&npv(a)))
        .then_with(|| payback(a).total_cmp(&payback(b)))
        .then_with(|| a.id().cmp(b.id()))
}

/// Sorts in place by [`compare`].
pub fn rank(scored: &mut [ScoredCandidate]) {
    scored.sort_by(compare);
}

/// First accepted candidate, else the top-ranked one.
pub fn select(ranked: &[ScoredCandidate]) -> Option<&ScoredCandidate> {
    ranked
        .iter()
        .find(|c| c.gate.accepted)
        .or_else(|| ranked.first())
}
