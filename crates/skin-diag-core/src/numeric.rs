//! Small numeric helpers shared by every stage.
//!
//! All of them are total: non-finite input maps to a defined value instead of
//! propagating `NaN` into scores.

/// Clamps to `[0, 1]`; non-finite values become `0`.
#[must_use]
pub fn clamp01(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Clamps to `[min, max]`; non-finite values become `min`.
#[must_use]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.max(min).min(max)
}

/// Rounds to three decimals, halves toward positive infinity; non-finite
/// values become `0`.
#[must_use]
pub fn round3(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 1000.0 + 0.5).floor() / 1000.0
}

/// Formats a value rounded to three decimals with the shortest exact digits
/// (`1`, `0.5`, `0.125`); negative zero prints as `0`.
#[must_use]
pub fn fmt3(value: f64) -> String {
    format!("{}", round3(value) + 0.0)
}

/// Nearest-rank percentile over an ascending slice (`idx = round(p * (n - 1))`).
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let last = sorted.len() - 1;
    let idx = (clamp01(p) * last as f64).round() as usize;
    sorted.get(idx.min(last)).copied()
}

/// Median of an ascending slice, averaging the middle pair for even lengths.
#[must_use]
pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp01_handles_non_finite() {
        assert!(clamp01(f64::NAN).abs() < f64::EPSILON);
        assert!(clamp01(f64::INFINITY).abs() < f64::EPSILON);
        assert!((clamp01(1.7) - 1.0).abs() < f64::EPSILON);
        assert!(clamp01(-0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_round3() {
        assert!((round3(0.123_456) - 0.123).abs() < 1e-12);
        assert!((round3(0.1235) - 0.124).abs() < 1e-12);
        assert!(round3(f64::NAN).abs() < f64::EPSILON);
    }

    #[test]
    fn test_round3_halves_go_up() {
        assert!((round3(-0.0025) - -0.002).abs() < 1e-12);
        assert!((round3(0.0025) - 0.003).abs() < 1e-12);
        assert!((round3(-0.123_6) - -0.124).abs() < 1e-12);
    }

    #[test]
    fn test_fmt3() {
        assert_eq!(fmt3(1.0), "1");
        assert_eq!(fmt3(0.5), "0.5");
        assert_eq!(fmt3(0.123_49), "0.123");
        assert_eq!(fmt3(-0.000_1), "0");
        assert_eq!(fmt3(f64::NAN), "0");
    }

    #[test]
    fn test_percentile_and_median() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(median_sorted(&sorted), Some(2.5));
        assert_eq!(percentile_sorted(&sorted, 0.0), Some(1.0));
        assert_eq!(percentile_sorted(&sorted, 1.0), Some(4.0));
        // round(0.9 * 3) = 3
        assert_eq!(percentile_sorted(&sorted, 0.9), Some(4.0));
        // round(0.1 * 3) = 0
        assert_eq!(percentile_sorted(&sorted, 0.1), Some(1.0));
        assert_eq!(percentile_sorted(&[], 0.5), None);
        assert_eq!(median_sorted(&[5.0, 6.0, 9.0]), Some(6.0));
    }
}
