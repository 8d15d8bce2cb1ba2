//! SGIP storage incentive award.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::assumptions::{SgipAssumptions, SgipSnapshot};
use crate::battery::BatteryCandidate;
use crate::reason::{Diagnostics, Outcome, missing, warn};

/// Usable share of nameplate assumed when none is supplied.
pub const DEFAULT_USABLE_FRACTION: f64 = 0.90;

/// Computed SGIP award for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SgipAward {
    pub snapshot_id: String,
    pub usable_kwh: f64,
    pub usd_per_wh: f64,
    /// Award before caps ($).
    pub uncapped_usd: f64,
    pub amount_usd: f64,
    pub capped: bool,
}

fn latest<'a>(it: impl Iterator<Item = &'a SgipSnapshot>) -> Option<&'a SgipSnapshot> {
    it.max_by(|a, b| {
        a.effective_from
            .cmp(&b.effective_from)
            .then_with(|| b.id.cmp(&a.id))
    })
}

/// Latest snapshot in effect at `period_start`, else the latest overall.
fn pick_snapshot<'a>(
    snapshots: &'a [SgipSnapshot],
    period_start: Option<DateTime<Utc>>,
    diag: &mut Diagnostics,
) -> Option<&'a SgipSnapshot> {
    let in_effect = period_start
        .and_then(|start| latest(snapshots.iter().filter(move |s| s.effective_from <= start)));
    if in_effect.is_some() {
        return in_effect;
    }
    let fallback = latest(snapshots.iter());
    if fallback.is_some() {
        diag.warn(warn::SGIP_LATEST_FALLBACK);
    }
    fallback
}

/// Computes the award, capped at the snapshot cap and at capex.
///
/// # Errors
///
/// `missing_sgip_snapshot` when no snapshot is available.
pub fn sgip_award(
    candidate: &BatteryCandidate,
    a: &SgipAssumptions,
    period_start: Option<DateTime<Utc>>,
    capex_total: Option<f64>,
    diag: &mut Diagnostics,
) -> Outcome<SgipAward> {
    let snapshot = pick_snapshot(&a.snapshots, period_start, diag)
        .ok_or_else(|| vec![missing::SGIP_SNAPSHOT])?;
    let fraction = match a.usable_fraction {
        Some(f) => f.clamp(0.0, 1.0),
        None => {
            diag.warn(warn::SGIP_USABLE_FALLBACK);
            DEFAULT_USABLE_FRACTION
        }
    };
    let usable_kwh = candidate.kwh * fraction;
    let uncapped_usd = usable_kwh * 1000.0 * snapshot.usd_per_wh;

    let cap = [snapshot.cap_usd, capex_total]
        .into_iter()
        .flatten()
        .fold(f64::INFINITY, f64::min);
    let capped = uncapped_usd > cap;
    if capped {
        diag.warn(warn::SGIP_CAPPED);
    }
    Ok(SgipAward {
        snapshot_id: snapshot.id.clone(),
        usable_kwh,
        usd_per_wh: snapshot.usd_per_wh,
        uncapped_usd,
        amount_usd: uncapped_usd.min(cap).max(0.0),
        capped,
    })
}
