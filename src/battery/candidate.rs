use serde::{Deserialize, Serialize};

use crate::reason::Code;

/// One battery size under evaluation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryCandidate {
    /// Derived from rounded kW and duration; see [`candidate_id`].
    pub id: String,
    pub kw: f64,
    /// Always `kw * duration_h`.
    pub kwh: f64,
    pub duration_h: f64,
    pub chemistry: String,
}

impl BatteryCandidate {
    pub fn new(kw: f64, duration_h: f64, chemistry: &str) -> Self {
        Self {
            id: candidate_id(kw, duration_h),
            kw,
            kwh: kw * duration_h,
            duration_h,
            chemistry: chemistry.to_string(),
        }
    }

    /// Ratio of candidate power to site peak.
    pub fn coverage_of(&self, site_peak_kw: f64) -> Option<f64> {
        (site_peak_kw > 0.0).then(|| self.kw / site_peak_kw)
    }
}

/// Builds the stable candidate id, e.g. `100kw-2h` or `250kw-1.5h`.
pub fn candidate_id(kw: f64, duration_h: f64) -> String {
    format!("{}kw-{}h", kw.round() as i64, trim_decimal(duration_h))
}

fn trim_decimal(v: f64) -> String {
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// User-supplied sizing limits. Never relaxed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HardConstraints {
    pub max_kw: Option<f64>,
    pub min_kw: Option<f64>,
    pub max_kwh: Option<f64>,
    pub min_duration_h: Option<f64>,
    pub max_duration_h: Option<f64>,
    pub excluded_durations_h: Vec<f64>,
    pub interconnection_cap_kw: Option<f64>,
}

pub const MAX_KW: Code = "constraint.max_kw";
pub const MIN_KW: Code = "constraint.min_kw";
pub const MAX_KWH: Code = "constraint.max_kwh";
pub const MIN_DURATION: Code = "constraint.min_duration_h";
pub const MAX_DURATION: Code = "constraint.max_duration_h";
pub const EXCLUDED_DURATION: Code = "constraint.excluded_duration";
pub const INTERCONNECTION_CAP: Code = "constraint.interconnection_cap_kw";

const EPS: f64 = 1e-9;

/// A constraint that was active for the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedConstraint {
    pub id: Code,
    pub value: String,
}

impl HardConstraints {
    /// The first constraint (in fixed order) the candidate violates.
    pub fn first_violation(&self, c: &BatteryCandidate) -> Option<Code> {
        if self.max_kw.is_some_and(|v| c.kw > v + EPS) {
            return Some(MAX_KW);
        }
        if self.min_kw.is_some_and(|v| c.kw < v - EPS) {
            return Some(MIN_KW);
        }
        if self.max_kwh.is_some_and(|v| c.kwh > v + EPS) {
            return Some(MAX_KWH);
        }
        if self.min_duration_h.is_some_and(|v| c.duration_h < v - EPS) {
            return Some(MIN_DURATION);
        }
        if self.max_duration_h.is_some_and(|v| c.duration_h > v + EPS) {
            return Some(MAX_DURATION);
        }
        if self
            .excluded_durations_h
            .iter()
            .any(|d| (d - c.duration_h).abs() < EPS)
        {
            return Some(EXCLUDED_DURATION);
        }
        if self.interconnection_cap_kw.is_some_and(|v| c.kw > v + EPS) {
            return Some(INTERCONNECTION_CAP);
        }
        None
    }

    /// Constraints that carry a value, in evaluation order.
    pub fn applied(&self) -> Vec<AppliedConstraint> {
        let scalar = [
            (MAX_KW, self.max_kw),
            (MIN_KW, self.min_kw),
            (MAX_KWH, self.max_kwh),
            (MIN_DURATION, self.min_duration_h),
            (MAX_DURATION, self.max_duration_h),
        ];
        let mut out: Vec<AppliedConstraint> = scalar
            .into_iter()
            .filter_map(|(id, v)| {
                v.map(|v| AppliedConstraint {
                    id,
                    value: trim_decimal(v),
                })
            })
            .collect();
        if !self.excluded_durations_h.is_empty() {
            let list: Vec<String> = self
                .excluded_durations_h
                .iter()
                .map(|d| trim_decimal(*d))
                .collect();
            out.push(AppliedConstraint {
                id: EXCLUDED_DURATION,
                value: list.join(","),
            });
        }
        if let Some(v) = self.interconnection_cap_kw {
            out.push(AppliedConstraint {
                id: INTERCONNECTION_CAP,
                value: trim_decimal(v),
            });
        }
        out
    }
}
