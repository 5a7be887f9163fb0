//! Photo quality gate.
//!
//! Measures sharpness, exposure, white balance and skin coverage over the
//! ROI, folds them into a composite factor, and grades the photo.

mod blur;
mod exposure;
mod gate;

pub use blur::{blur_factor, laplacian_abs, laplacian_energy};
pub use exposure::SkinToneStats;
pub use gate::{grade, DegradedFloors, FailFloors, GradeFactors, QualityGateConfig};

use tracing::debug;

use crate::domain::{AnalysisError, QualityMetrics, QualityReason, QualityReport};
use crate::imaging::AnalysisImage;
use crate::numeric::{clamp01, round3};
use crate::segment::SkinRoi;

/// Coverage that maps to a zero coverage factor.
const COVERAGE_FLOOR: f64 = 0.06;

/// Measures and grades the photo.
///
/// # Errors
///
/// [`AnalysisError::Quality`] if the ROI mask does not match the image.
pub fn assess_quality(
    image: &AnalysisImage,
    roi: &SkinRoi,
    config: &QualityGateConfig,
) -> Result<QualityReport, AnalysisError> {
    if roi.mask.len() != image.pixel_count() {
        return Err(AnalysisError::Quality(format!(
            "skin mask has {} cells, image has {} pixels",
            roi.mask.len(),
            image.pixel_count()
        )));
    }

    let tone = SkinToneStats::measure(image, &roi.mask);
    let energy = laplacian_energy(image.gray(), &roi.mask, roi.bbox);
    let coverage = roi.coverage;

    let blur = blur_factor(energy);
    let exposure = tone.exposure_factor();
    let white_balance = tone.white_balance_factor();
    let coverage_factor = clamp01((coverage - COVERAGE_FLOOR) / 0.18);
    let quality = clamp01(blur * exposure * white_balance * coverage_factor);

    let mut reasons = Vec::new();
    if coverage < COVERAGE_FLOOR {
        reasons.push(QualityReason::LowSkinCoverage);
    }
    if blur < 0.35 {
        reasons.push(QualityReason::Blur);
    }
    if exposure < 0.4 {
        reasons.push(if tone.mean_luma < 80.0 {
            QualityReason::TooDark
        } else {
            QualityReason::TooBright
        });
    }
    if white_balance < 0.55 {
        reasons.push(QualityReason::WhiteBalanceUnstable);
    }
    if !roi.touches_center {
        reasons.push(QualityReason::FrameOffCenter);
    }

    let grade = grade(
        &GradeFactors {
            coverage,
            blur,
            exposure,
            white_balance,
            quality,
        },
        config,
    );
    debug!(
        %grade,
        quality_factor = quality,
        blur,
        exposure,
        white_balance,
        coverage,
        "quality graded"
    );

    Ok(QualityReport {
        grade,
        quality_factor: round3(quality),
        reasons,
        metrics: QualityMetrics {
            skin_coverage: round3(coverage),
            mean_luma: round3(tone.mean_luma),
            luma_std: round3(tone.luma_std),
            laplacian_energy: round3(energy),
            white_balance_cast: round3(tone.white_balance_cast()),
            blur_factor: round3(blur),
            exposure_factor: round3(exposure),
            wb_factor: round3(white_balance),
            coverage_factor: round3(coverage_factor),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QualityGrade, Size};
    use crate::segment::segment_skin;
    use image::{Rgb, RgbImage};

    fn checkerboard(w: u32, h: u32, base: [u8; 3], amp: u8) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            let up = (x + y) % 2 == 0;
            let shift = |c: u8| if up { c + amp } else { c - amp };
            Rgb([shift(base[0]), shift(base[1]), shift(base[2])])
        })
    }

    fn run(img: RgbImage) -> QualityReport {
        let size = Size::new(img.width(), img.height());
        let image = AnalysisImage::from_rgb(img, size);
        let roi = segment_skin(&image).unwrap();
        assess_quality(&image, &roi, &QualityGateConfig::default()).unwrap()
    }

    #[test]
    fn test_textured_skin_passes() {
        let report = run(checkerboard(64, 64, [160, 140, 120], 3));
        assert_eq!(report.grade, QualityGrade::Pass);
        assert!((report.metrics.blur_factor - 1.0).abs() < f64::EPSILON);
        assert!((report.metrics.skin_coverage - 1.0).abs() < f64::EPSILON);
        assert!(!report.has_reason(QualityReason::Blur));
        // wb factor ~0.683 is above the 0.55 reason threshold.
        assert!(!report.white_balance_unstable());
        assert!(report.quality_factor > 0.55);
    }

    #[test]
    fn test_flat_skin_fails_on_blur() {
        let report = run(RgbImage::from_pixel(64, 64, Rgb([160, 140, 120])));
        assert_eq!(report.grade, QualityGrade::Fail);
        assert!(report.has_reason(QualityReason::Blur));
        assert!(report.quality_factor.abs() < f64::EPSILON);
    }

    #[test]
    fn test_off_center_is_informational() {
        let mut img = RgbImage::from_pixel(100, 100, Rgb([30, 60, 120]));
        let skin = checkerboard(100, 100, [160, 140, 120], 3);
        for y in 0..30 {
            for x in 0..100 {
                img.put_pixel(x, y, *skin.get_pixel(x, y));
            }
        }
        let report = run(img);
        assert!(report.has_reason(QualityReason::FrameOffCenter));
        // Coverage 0.3, sharp texture: the off-centre tag alone does not fail.
        assert_ne!(report.grade, QualityGrade::Fail);
    }

    #[test]
    fn test_mismatched_mask_is_quality_error() {
        let img = RgbImage::from_pixel(8, 8, Rgb([160, 140, 120]));
        let image = AnalysisImage::from_rgb(img, Size::new(8, 8));
        let roi = SkinRoi {
            mask: crate::mask::Bitmap::filled(4, 4),
            skin_pixels: 16,
            coverage: 1.0,
            bbox: crate::domain::PixelBox::new(0, 0, 3, 3),
            touches_center: true,
        };
        let err = assess_quality(&image, &roi, &QualityGateConfig::default()).unwrap_err();
        assert_eq!(err.reason().as_str(), "quality_failed");
    }
}
