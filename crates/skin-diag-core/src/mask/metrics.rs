//! Overlap scores between predicted and reference masks.
//!
//! These are shared by the module builder and offline mask evaluation, so
//! they must stay bit-identical across both.

use super::Bitmap;

/// `num / den`, or `0` when the denominator is not positive.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn safe_ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Intersection over union.
#[must_use]
pub fn iou_score(pred: &Bitmap, gt: &Bitmap) -> f64 {
    safe_ratio(pred.intersection_count(gt), pred.union_count(gt))
}

/// Fraction of the ground truth covered by the prediction.
#[must_use]
pub fn coverage_score(pred: &Bitmap, gt: &Bitmap) -> f64 {
    safe_ratio(pred.intersection_count(gt), gt.count_ones())
}

/// Fraction of the prediction that falls outside the skin mask.
#[must_use]
pub fn leakage_score(pred: &Bitmap, skin: &Bitmap) -> f64 {
    safe_ratio(pred.intersection_count(&skin.not()), pred.count_ones())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::cast_precision_loss)]
    fn rect(x0: usize, y0: usize, x1: usize, y1: usize) -> Bitmap {
        let mut b = Bitmap::new(10, 10);
        b.fill_rect(x0 as f64, y0 as f64, (x1 + 1) as f64, (y1 + 1) as f64, true);
        b
    }

    #[test]
    fn test_scenario_ten_by_ten() {
        let gt = rect(2, 2, 5, 5);
        let pred = rect(3, 2, 6, 5);
        assert_eq!(gt.count_ones(), 16);
        assert_eq!(pred.count_ones(), 16);
        assert!((iou_score(&pred, &gt) - 0.6).abs() < 1e-12);
        assert!((coverage_score(&pred, &gt) - 0.75).abs() < 1e-12);
        assert!((leakage_score(&pred, &gt) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_identity_and_disjoint() {
        let a = rect(1, 1, 3, 3);
        let b = rect(6, 6, 8, 8);
        assert!((iou_score(&a, &a) - 1.0).abs() < f64::EPSILON);
        assert!(coverage_score(&a, &b).abs() < f64::EPSILON);
        assert!(iou_score(&a, &b).abs() < f64::EPSILON);
    }

    #[test]
    fn test_leakage_zero_when_inside_skin() {
        let skin = rect(0, 0, 9, 5);
        let pred = rect(2, 2, 4, 4);
        assert!(leakage_score(&pred, &skin).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_masks_score_zero() {
        let empty = Bitmap::new(10, 10);
        assert!(iou_score(&empty, &empty).abs() < f64::EPSILON);
        assert!(coverage_score(&empty, &empty).abs() < f64::EPSILON);
        assert!(leakage_score(&empty, &empty).abs() < f64::EPSILON);
    }
}
