//! Per-issue detector output and calibrated findings.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::QualityReason;

/// The skin issues the detectors score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// Inflamed red spots.
    Acne,
    /// Diffuse redness.
    Redness,
    /// Visible pores and texture.
    Pores,
    /// Pigmentation and uneven tone.
    DarkSpots,
}

impl IssueType {
    /// Every issue type, in reporting order.
    pub const ALL: [Self; 4] = [Self::Acne, Self::Redness, Self::Pores, Self::DarkSpots];

    /// Wire name of the issue type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acne => "acne",
            Self::Redness => "redness",
            Self::Pores => "pores",
            Self::DarkSpots => "dark_spots",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity band of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Below the first cut point.
    None,
    /// Between the first and second cut points.
    Mild,
    /// Between the second and third cut points.
    Moderate,
    /// At or above the third cut point.
    Severe,
}

impl Severity {
    /// Numeric level, `0..=3`.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Mild => 1,
            Self::Moderate => 2,
            Self::Severe => 3,
        }
    }
}

/// Human-facing bucket for a confidence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLabel {
    /// Confidence at or above 0.78.
    PrettySure,
    /// Confidence at or above 0.52.
    SomewhatSure,
    /// Anything lower.
    NotSure,
}

impl ConfidenceLabel {
    /// Buckets a confidence value.
    #[must_use]
    pub fn from_confidence(confidence: f64) -> Self {
        let c = crate::numeric::clamp01(confidence);
        if c >= 0.78 {
            Self::PrettySure
        } else if c >= 0.52 {
            Self::SomewhatSure
        } else {
            Self::NotSure
        }
    }
}

/// Metrics for acne detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcneMetrics {
    /// Number of candidate components of plausible size.
    pub acne_count: u32,
    /// Components per skin pixel.
    pub acne_density: f64,
}

/// Metrics for redness detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RednessMetrics {
    /// `mean(a*) - median(a*)` over the ROI.
    pub a_shift: f64,
    /// Combined redness fraction in `[0,1]`.
    pub red_fraction: f64,
}

/// Metrics for pore/texture detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoresMetrics {
    /// Mean of nose and cheek Laplacian energy.
    pub texture_energy: f64,
    /// Shine-corrected pore index in `[0,1]`.
    pub pore_index: f64,
    /// Fraction of bright, unsaturated nose pixels.
    pub specular_fraction: f64,
}

/// Metrics for dark-spot detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DarkSpotMetrics {
    /// `median(L*) - p10(L*)` over the ROI.
    pub luma_drop: f64,
    /// `|mean(b*)| / 35`, clamped to `[0,1]`.
    pub hue_shift: f64,
}

/// Issue-specific metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueMetrics {
    /// Acne metrics.
    Acne(AcneMetrics),
    /// Pore metrics.
    Pores(PoresMetrics),
    /// Redness metrics.
    Redness(RednessMetrics),
    /// Dark-spot metrics.
    DarkSpots(DarkSpotMetrics),
}

impl IssueMetrics {
    /// Rounds every floating-point metric to three decimals.
    #[must_use]
    pub fn rounded(self) -> Self {
        use crate::numeric::round3;
        match self {
            Self::Acne(m) => Self::Acne(AcneMetrics {
                acne_count: m.acne_count,
                acne_density: round3(m.acne_density),
            }),
            Self::Redness(m) => Self::Redness(RednessMetrics {
                a_shift: round3(m.a_shift),
                red_fraction: round3(m.red_fraction),
            }),
            Self::Pores(m) => Self::Pores(PoresMetrics {
                texture_energy: round3(m.texture_energy),
                pore_index: round3(m.pore_index),
                specular_fraction: round3(m.specular_fraction),
            }),
            Self::DarkSpots(m) => Self::DarkSpots(DarkSpotMetrics {
                luma_drop: round3(m.luma_drop),
                hue_shift: round3(m.hue_shift),
            }),
        }
    }
}

/// Uncalibrated detector output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSignal {
    /// Raw score in `[0,1]`, fed to severity banding.
    pub score: f64,
    /// Detector self-confidence in `[0,1]`, fed to calibration.
    pub model_conf: f64,
    /// Measurements behind the score.
    pub metrics: IssueMetrics,
}

/// Confidence factors applied to one issue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Detector self-confidence.
    pub model_conf: f64,
    /// Self-confidence after the calibration table.
    pub model_conf_calibrated: f64,
    /// Photo quality factor.
    pub quality_factor: f64,
    /// Agreement with the user's own logs and goals.
    pub agreement_factor: f64,
}

/// Presentation payload for one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Two short sentences describing the signal.
    pub evidence_short: Vec<String>,
    /// Measurements behind the score.
    pub metrics: IssueMetrics,
    /// Up to six quality reasons that apply to this photo.
    pub quality_notes: Vec<QualityReason>,
}

/// Calibrated result for one issue type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueFinding {
    /// Which issue this is.
    pub issue_type: IssueType,
    /// Threshold region used for banding.
    pub region: String,
    /// Severity band.
    pub severity: Severity,
    /// Severity band as `0..=3`.
    pub severity_level: u8,
    /// Raw score, rounded.
    pub severity_score: f64,
    /// Final confidence, rounded.
    pub confidence: f64,
    /// Bucketed confidence.
    pub confidence_label: ConfidenceLabel,
    /// Factors behind the confidence.
    pub calibration: Calibration,
    /// Presentation payload.
    pub evidence: Evidence,
}
