//! Rounding rules for reported aggregates.
//!
//! - ratios, percentages, averages of scores or durations: one decimal
//! - money and counts: whole numbers

/// Rounds to one decimal place (half away from zero)
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Rounds to a whole number (half away from zero)
pub fn round0(value: f64) -> f64 {
    value.round()
}

/// Whole-number rounding as an integer, for money and counts in reports
pub fn round_int(value: f64) -> i64 {
    value.round() as i64
}
