//! Seeded synthetic interval load for scenarios without metered data.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::site::IntervalPoint;

/// Shape of a commercial daily load curve.
///
/// Demand follows a cosine around `peak_hour` (local time) plus Gaussian noise,
/// scaled by `weekend_factor` on Saturdays and Sundays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadShape {
    /// Mean demand (kW).
    pub base_kw: f64,
    /// Daily swing above and below `base_kw` (kW).
    pub amp_kw: f64,
    /// Local hour of maximum demand.
    pub peak_hour: f64,
    /// Noise standard deviation (kW).
    pub noise_std: f64,
    pub weekend_factor: f64,
}

impl Default for LoadShape {
    fn default() -> Self {
        Self {
            base_kw: 320.0,
            amp_kw: 150.0,
            peak_hour: 17.0,
            noise_std: 8.0,
            weekend_factor: 0.8,
        }
    }
}

/// Generator for a reproducible interval series.
#[derive(Debug, Clone)]
pub struct SyntheticLoad {
    shape: LoadShape,
    interval_minutes: u32,
    timezone: Tz,
    rng: StdRng,
}

impl SyntheticLoad {
    /// # Arguments
    ///
    /// * `shape` - Daily curve parameters
    /// * `interval_minutes` - Interval length (clamped to at least 1)
    /// * `timezone` - Local timezone for the daily curve
    /// * `seed` - Random seed for the noise
    pub fn new(shape: LoadShape, interval_minutes: u32, timezone: Tz, seed: u64) -> Self {
        Self {
            shape,
            interval_minutes: interval_minutes.max(1),
            timezone,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn noise(&mut self) -> f64 {
        if self.shape.noise_std <= 0.0 {
            return 0.0;
        }
        // Box-Muller
        let u1: f64 = self.rng.random::<f64>().clamp(1e-9, 1.0);
        let u2: f64 = self.rng.random::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * self.shape.noise_std
    }

    /// Demand at one instant, never negative.
    pub fn demand_kw(&mut self, at: DateTime<Utc>) -> f64 {
        let local = at.with_timezone(&self.timezone);
        let hour = f64::from(local.hour()) + f64::from(local.minute()) / 60.0;
        let angle = 2.0 * PI * (hour - self.shape.peak_hour) / 24.0;
        let mut kw = self.shape.base_kw + self.shape.amp_kw * angle.cos();
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            kw *= self.shape.weekend_factor;
        }
        (kw + self.noise()).max(0.0)
    }

    /// Interval points covering `days` from `start`.
    pub fn generate(&mut self, start: DateTime<Utc>, days: u32) -> Vec<IntervalPoint> {
        let per_day = (24 * 60 / self.interval_minutes) as usize;
        let step = Duration::minutes(i64::from(self.interval_minutes));
        let mut points = Vec::with_capacity(per_day * days as usize);
        let mut at = start;
        for _ in 0..per_day * days as usize {
            let kw = self.demand_kw(at);
            points.push(IntervalPoint::from_kw(at, self.interval_minutes, kw));
            at += step;
        }
        points
    }
}
