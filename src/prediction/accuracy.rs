//! Forecast accuracy scoring.

/// Round to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage score in `[0, 100]` comparing `predicted` with `actual`.
///
/// A zero actual scores 100 only for a zero prediction. Otherwise the score
/// is `100 - |predicted - actual| / actual * 100`, rounded to two decimals
/// and clamped at 0.
pub fn accuracy(predicted: f64, actual: f64) -> f64 {
    if actual == 0.0 {
        return if predicted == 0.0 { 100.0 } else { 0.0 };
    }
    let percent_error = (predicted - actual).abs() / actual * 100.0;
    clamp_score(round2(100.0 - percent_error))
}

/// Clamp a rounded score at 0. Rounding a tiny negative value yields `-0.0`,
/// which must not reach storage as a signed zero.
pub(crate) fn clamp_score(score: f64) -> f64 {
    if score > 0.0 {
        score
    } else {
        0.0
    }
}
