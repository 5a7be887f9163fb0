//! Photo quality grading types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Usability grade of a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    /// Usable as-is.
    Pass,
    /// Usable with reduced confidence.
    Degraded,
    /// Not usable; the user should retake the photo.
    Fail,
}

impl QualityGrade {
    /// Wire name of the grade.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Degraded => "degraded",
            Self::Fail => "fail",
        }
    }

    /// Whether findings and module cards are produced for this grade.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        matches!(self, Self::Pass | Self::Degraded)
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason tag attached to a quality report for UX messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityReason {
    /// Too little of the frame is skin.
    LowSkinCoverage,
    /// Not enough fine detail over the skin region.
    Blur,
    /// Mean skin luma is low.
    TooDark,
    /// Mean skin luma is high.
    TooBright,
    /// Strong colour cast over the skin region.
    WhiteBalanceUnstable,
    /// The skin region does not reach the centre of the frame.
    FrameOffCenter,
}

impl QualityReason {
    /// Wire name of the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LowSkinCoverage => "low_skin_coverage",
            Self::Blur => "blur",
            Self::TooDark => "too_dark",
            Self::TooBright => "too_bright",
            Self::WhiteBalanceUnstable => "white_balance_unstable",
            Self::FrameOffCenter => "frame_off_center",
        }
    }
}

impl fmt::Display for QualityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw measurements behind a quality grade, rounded to three decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Fraction of analysis pixels in the skin ROI.
    pub skin_coverage: f64,
    /// Mean rounded luma over the ROI.
    pub mean_luma: f64,
    /// Population standard deviation of luma over the ROI.
    pub luma_std: f64,
    /// Mean absolute Laplacian over interior ROI pixels.
    pub laplacian_energy: f64,
    /// `max(|R/G - 1|, |B/G - 1|)` of the ROI mean colour.
    pub white_balance_cast: f64,
    /// Sharpness factor in `[0,1]`.
    pub blur_factor: f64,
    /// Exposure factor in `[0,1]`.
    pub exposure_factor: f64,
    /// White-balance factor in `[0,1]`.
    pub wb_factor: f64,
    /// Coverage factor in `[0,1]`.
    pub coverage_factor: f64,
}

/// Graded quality of one photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Overall grade.
    pub grade: QualityGrade,
    /// Product of the four factors, rounded to three decimals.
    pub quality_factor: f64,
    /// Reason tags in evaluation order.
    pub reasons: Vec<QualityReason>,
    /// Underlying measurements.
    pub metrics: QualityMetrics,
}

impl QualityReport {
    /// Whether `reason` was raised.
    #[must_use]
    pub fn has_reason(&self, reason: QualityReason) -> bool {
        self.reasons.contains(&reason)
    }

    /// Whether the colour cast was too strong to trust tone signals.
    #[must_use]
    pub fn white_balance_unstable(&self) -> bool {
        self.has_reason(QualityReason::WhiteBalanceUnstable)
    }
}
