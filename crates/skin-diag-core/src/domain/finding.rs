//! Photo-level findings and the takeaways derived from them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{NormBox, NormCorners, NormPoint};

/// Visual issue vocabulary shared by photo findings and regions.
///
/// Detector names are accepted as aliases (`pores` → texture,
/// `dark_spots` → tone); anything else deserializes as `Unsupported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualIssue {
    /// Diffuse redness.
    Redness,
    /// Specular shine.
    Shine,
    /// Pores and texture.
    #[serde(alias = "pores")]
    Texture,
    /// Uneven tone and dark spots.
    #[serde(alias = "dark_spots")]
    Tone,
    /// Inflamed spots.
    Acne,
    /// Not rendered.
    #[serde(other)]
    Unsupported,
}

impl VisualIssue {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Redness => "redness",
            Self::Shine => "shine",
            Self::Texture => "texture",
            Self::Tone => "tone",
            Self::Acne => "acne",
            Self::Unsupported => "unsupported",
        }
    }

    /// Parses a name case-insensitively, applying the detector aliases.
    #[must_use]
    pub fn normalize(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "redness" => Some(Self::Redness),
            "shine" => Some(Self::Shine),
            "texture" | "pores" => Some(Self::Texture),
            "tone" | "dark_spots" => Some(Self::Tone),
            "acne" => Some(Self::Acne),
            _ => None,
        }
    }

    /// Whether regions are rendered for this issue.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl fmt::Display for VisualIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A computed feature value: most are numbers, a few are flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Numeric feature.
    Number(f64),
    /// Boolean feature.
    Flag(bool),
}

/// Polygon as supplied, before sanitizing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonInput {
    /// Vertices in face-crop-normalized space.
    #[serde(default)]
    pub points: Vec<NormPoint>,
}

/// Heatmap grid dimensions as supplied; may be fractional or out of range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridInput {
    /// Columns.
    pub w: f64,
    /// Rows.
    pub h: f64,
}

/// Heatmap as supplied, before sanitizing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapInput {
    /// Grid dimensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridInput>,
    /// Row-major cell values.
    #[serde(default)]
    pub values: Vec<f64>,
}

/// Geometry attached to a finding. Every kind is optional and independent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindingGeometry {
    /// Box as origin and size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<NormBox>,
    /// Box as corners; takes precedence over `bbox`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox_norm: Option<NormCorners>,
    /// Outline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<PolygonInput>,
    /// Soft intensity map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatmap: Option<HeatmapInput>,
}

impl FindingGeometry {
    /// Whether no geometry kind is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bbox.is_none() && self.bbox_norm.is_none() && self.polygon.is_none() && self.heatmap.is_none()
    }
}

/// One photo-level observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoFinding {
    /// Stable identifier, e.g. `pf_redness`. Blank ids get a positional default.
    #[serde(default)]
    pub finding_id: String,
    /// Visual issue.
    pub issue_type: VisualIssue,
    /// Which proxy produced it.
    #[serde(default)]
    pub subtype: String,
    /// Severity on a `0..=4` scale.
    #[serde(default)]
    pub severity: f64,
    /// Confidence in `[0,1]`.
    #[serde(default)]
    pub confidence: f64,
    /// The signal exists but lighting makes it unreliable.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub uncertain: bool,
    /// One-sentence evidence text.
    #[serde(default)]
    pub evidence: String,
    /// Rounded measurements behind the finding.
    #[serde(default)]
    pub computed_features: BTreeMap<String, FeatureValue>,
    /// Where on the face crop it applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<FindingGeometry>,
}

/// A short, actionable line derived from findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Takeaway {
    /// Identifier, e.g. `tw_photo_redness`.
    pub takeaway_id: String,
    /// Always `photo` for this pipeline.
    pub source: String,
    /// Issue name, or `quality` for retake guidance.
    pub issue_type: String,
    /// Display text.
    pub text: String,
    /// Confidence in `[0,1]`.
    pub confidence: f64,
    /// Findings this takeaway is derived from.
    pub linked_finding_ids: Vec<String>,
    /// Issue names this takeaway is about.
    pub linked_issue_types: Vec<String>,
}
