//! Grade thresholds and the pass/degraded/fail decision.

use serde::{Deserialize, Serialize};

use crate::domain::QualityGrade;
use crate::numeric::clamp01;

/// Hard floors. Falling below any of these fails the photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailFloors {
    /// Minimum skin coverage.
    pub min_coverage: f64,
    /// Minimum blur factor.
    pub min_blur_factor: f64,
    /// Minimum exposure factor.
    pub min_exposure_factor: f64,
    /// Accepted for compatibility; the composite factor never hard-fails a photo.
    pub min_quality_factor: f64,
}

impl Default for FailFloors {
    fn default() -> Self {
        Self {
            min_coverage: 0.06,
            min_blur_factor: 0.2,
            min_exposure_factor: 0.2,
            min_quality_factor: 0.25,
        }
    }
}

/// Soft floors. Falling below any of these degrades the photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradedFloors {
    /// Minimum blur factor.
    pub min_blur_factor: f64,
    /// Minimum exposure factor.
    pub min_exposure_factor: f64,
    /// Minimum white-balance factor.
    pub min_wb_factor: f64,
    /// Minimum composite quality factor.
    pub min_quality_factor: f64,
}

impl Default for DegradedFloors {
    fn default() -> Self {
        Self {
            min_blur_factor: 0.45,
            min_exposure_factor: 0.45,
            min_wb_factor: 0.65,
            min_quality_factor: 0.55,
        }
    }
}

/// Quality gate thresholds, overridable per deployment.
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityGateConfig {
    /// Hard floors.
    pub fail: FailFloors,
    /// Soft floors.
    pub degraded: DegradedFloors,
}

impl QualityGateConfig {
    /// Clamps every floor into `[0,1]`; non-finite values become `0`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            fail: FailFloors {
                min_coverage: clamp01(self.fail.min_coverage),
                min_blur_factor: clamp01(self.fail.min_blur_factor),
                min_exposure_factor: clamp01(self.fail.min_exposure_factor),
                min_quality_factor: clamp01(self.fail.min_quality_factor),
            },
            degraded: DegradedFloors {
                min_blur_factor: clamp01(self.degraded.min_blur_factor),
                min_exposure_factor: clamp01(self.degraded.min_exposure_factor),
                min_wb_factor: clamp01(self.degraded.min_wb_factor),
                min_quality_factor: clamp01(self.degraded.min_quality_factor),
            },
        }
    }
}

/// The four normalized factors a grade is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeFactors {
    /// Raw skin coverage (not the coverage factor).
    pub coverage: f64,
    /// Blur factor.
    pub blur: f64,
    /// Exposure factor.
    pub exposure: f64,
    /// White-balance factor.
    pub white_balance: f64,
    /// Composite quality factor.
    pub quality: f64,
}

/// Grades a photo.
///
/// Only coverage, blur and exposure can fail a photo. White balance and the
/// composite factor can at worst degrade it.
#[must_use]
pub fn grade(factors: &GradeFactors, config: &QualityGateConfig) -> QualityGrade {
    let cfg = config.normalized();
    if factors.coverage < cfg.fail.min_coverage
        || factors.blur < cfg.fail.min_blur_factor
        || factors.exposure < cfg.fail.min_exposure_factor
    {
        return QualityGrade::Fail;
    }
    if factors.blur < cfg.degraded.min_blur_factor
        || factors.exposure < cfg.degraded.min_exposure_factor
        || factors.white_balance < cfg.degraded.min_wb_factor
        || factors.quality < cfg.degraded.min_quality_factor
    {
        return QualityGrade::Degraded;
    }
    QualityGrade::Pass
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factors(coverage: f64, blur: f64, exposure: f64, wb: f64) -> GradeFactors {
        GradeFactors {
            coverage,
            blur,
            exposure,
            white_balance: wb,
            quality: blur * exposure * wb,
        }
    }

    #[test]
    fn test_white_balance_alone_cannot_fail() {
        let f = factors(0.5, 0.9, 0.9, 0.3);
        assert_eq!(grade(&f, &QualityGateConfig::default()), QualityGrade::Degraded);
        let f = factors(0.5, 0.9, 0.9, 0.0);
        assert_eq!(grade(&f, &QualityGateConfig::default()), QualityGrade::Degraded);
    }

    #[test]
    fn test_hard_floors_fail() {
        let cfg = QualityGateConfig::default();
        assert_eq!(grade(&factors(0.05, 1.0, 1.0, 1.0), &cfg), QualityGrade::Fail);
        assert_eq!(grade(&factors(0.5, 0.1, 1.0, 1.0), &cfg), QualityGrade::Fail);
        assert_eq!(grade(&factors(0.5, 1.0, 0.19, 1.0), &cfg), QualityGrade::Fail);
    }

    #[test]
    fn test_clean_photo_passes() {
        let f = factors(0.5, 1.0, 0.95, 0.9);
        assert_eq!(grade(&f, &QualityGateConfig::default()), QualityGrade::Pass);
    }

    #[test]
    fn test_override_is_clamped() {
        let cfg = QualityGateConfig {
            fail: FailFloors {
                min_blur_factor: 3.0,
                ..FailFloors::default()
            },
            ..QualityGateConfig::default()
        };
        assert!((cfg.normalized().fail.min_blur_factor - 1.0).abs() < f64::EPSILON);
        // A perfect blur factor of 1.0 still meets a floor clamped to 1.0.
        assert_eq!(grade(&factors(0.5, 1.0, 0.95, 0.9), &cfg), QualityGrade::Pass);
    }

    #[test]
    fn test_partial_toml_style_override() {
        let cfg: QualityGateConfig =
            serde_json::from_str(r#"{"degraded": {"min_wb_factor": 0.2}}"#).unwrap();
        assert!((cfg.degraded.min_wb_factor - 0.2).abs() < f64::EPSILON);
        assert!((cfg.degraded.min_blur_factor - 0.45).abs() < f64::EPSILON);
        assert!((cfg.fail.min_coverage - 0.06).abs() < f64::EPSILON);
    }
}
