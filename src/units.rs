//! Rounding helpers shared by reports and audit output.

/// Rounds to `dp` decimal places, half away from zero.
pub fn round_to(v: f64, dp: i32) -> f64 {
    let m = 10_f64.powi(dp);
    (v * m).round() / m
}

/// Rounds a dollar figure to cents.
pub fn round2(v: f64) -> f64 {
    round_to(v, 2)
}

/// Rounds an energy figure to 6 decimal places.
pub fn round6(v: f64) -> f64 {
    round_to(v, 6)
}
