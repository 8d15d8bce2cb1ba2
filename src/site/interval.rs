//! Interval meter points and the derived load summary.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// One metered interval.
///
/// At least one of `kwh` or `kw` must resolve to a finite, non-negative number
/// for the point to be usable. `kw` wins when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalPoint {
    /// Interval start (UTC).
    pub timestamp: DateTime<Utc>,
    /// Interval length in minutes.
    pub interval_minutes: u32,
    /// Energy over the interval (kWh).
    pub kwh: Option<f64>,
    /// Average demand over the interval (kW).
    pub kw: Option<f64>,
}

fn usable(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x >= 0.0)
}

impl IntervalPoint {
    pub fn from_kw(timestamp: DateTime<Utc>, interval_minutes: u32, kw: f64) -> Self {
        Self {
            timestamp,
            interval_minutes,
            kwh: None,
            kw: Some(kw),
        }
    }

    /// Interval duration in hours.
    pub fn hours(&self) -> f64 {
        f64::from(self.interval_minutes) / 60.0
    }

    /// Average demand, derived from kWh / duration when kW is absent.
    pub fn resolved_kw(&self) -> Option<f64> {
        if let Some(kw) = usable(self.kw) {
            return Some(kw);
        }
        let hours = self.hours();
        if hours <= 0.0 {
            return None;
        }
        usable(self.kwh).map(|kwh| kwh / hours)
    }

    /// Whether the point carries a usable load figure.
    pub fn is_usable(&self) -> bool {
        self.resolved_kw().is_some()
    }
}

/// Interval-intelligence summary of a site's load.
///
/// Normally supplied by the intake collaborator; [`IntervalSummary::from_points`]
/// derives one when only raw points are available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalSummary {
    pub peak_kw: Option<f64>,
    pub avg_kw: Option<f64>,
    pub baseload_kw: Option<f64>,
    /// Average kW in six local 4-hour buckets (00-04, 04-08, ... 20-24).
    pub load_shape_4h: Option<[f64; 6]>,
    pub coverage_days: Option<f64>,
}

impl IntervalSummary {
    /// Derives a summary from raw points. Unusable points are skipped.
    ///
    /// Baseload is the 5th percentile of interval kW (nearest rank).
    pub fn from_points(points: &[IntervalPoint], tz: Tz) -> Self {
        let mut kws = Vec::with_capacity(points.len());
        let mut bucket_sum = [0.0_f64; 6];
        let mut bucket_n = [0_usize; 6];
        let mut total_hours = 0.0;

        for p in points {
            let Some(kw) = p.resolved_kw() else {
                continue;
            };
            kws.push(kw);
            total_hours += p.hours();
            let hour = p.timestamp.with_timezone(&tz).hour() as usize;
            bucket_sum[hour / 4] += kw;
            bucket_n[hour / 4] += 1;
        }

        if kws.is_empty() {
            return Self::default();
        }

        let peak = kws.iter().copied().fold(f64::MIN, f64::max);
        let avg = kws.iter().sum::<f64>() / kws.len() as f64;
        let mut sorted = kws.clone();
        sorted.sort_by(f64::total_cmp);
        let rank = ((sorted.len() as f64) * 0.05).ceil() as usize;
        let baseload = sorted[rank.saturating_sub(1).min(sorted.len() - 1)];

        let shape = if bucket_n.iter().all(|&n| n > 0) {
            let mut s = [0.0; 6];
            for i in 0..6 {
                s[i] = bucket_sum[i] / bucket_n[i] as f64;
            }
            Some(s)
        } else {
            None
        };

        Self {
            peak_kw: Some(peak),
            avg_kw: Some(avg),
            baseload_kw: Some(baseload),
            load_shape_4h: shape,
            coverage_days: Some(total_hours / 24.0),
        }
    }
}
