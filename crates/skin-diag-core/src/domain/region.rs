//! Sanitized, renderable regions in face-crop-normalized space.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{NormBox, NormPoint, VisualIssue};

/// Coordinate space tag carried by every region.
pub const FACE_COORD_SPACE: &str = "face_crop_norm_v1";

/// Kind of geometry, used for counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionType {
    /// Axis-aligned box.
    Bbox,
    /// Closed outline.
    Polygon,
    /// Intensity grid.
    Heatmap,
    /// No geometry at all.
    Unknown,
}

impl RegionType {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bbox => "bbox",
            Self::Polygon => "polygon",
            Self::Heatmap => "heatmap",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a supplied geometry was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryRejection {
    /// A box coordinate is NaN or infinite.
    BboxNonNumeric,
    /// The clamped box is at most 0.001 wide or tall.
    BboxTooSmall,
    /// Fewer than three distinct vertices remain.
    PolygonTooFewPoints,
    /// Two non-adjacent edges cross or touch.
    PolygonSelfIntersection,
    /// The polygon's bounding box is at most 0.001 wide or tall.
    PolygonTooSmall,
    /// No usable grid size or no values.
    HeatmapInvalidGrid,
    /// Fewer values than grid cells.
    HeatmapValuesLengthMismatch,
    /// The finding has no geometry of any kind.
    GeometryMissing,
}

impl GeometryRejection {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BboxNonNumeric => "bbox_non_numeric",
            Self::BboxTooSmall => "bbox_too_small",
            Self::PolygonTooFewPoints => "polygon_too_few_points",
            Self::PolygonSelfIntersection => "polygon_self_intersection",
            Self::PolygonTooSmall => "polygon_too_small",
            Self::HeatmapInvalidGrid => "heatmap_invalid_grid",
            Self::HeatmapValuesLengthMismatch => "heatmap_values_length_mismatch",
            Self::GeometryMissing => "geometry_missing",
        }
    }
}

impl fmt::Display for GeometryRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Photo-quality caveat attached to regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// Bright light or glare may inflate signals.
    GlareConfounded,
    /// Shadows or underexposure may hide signals.
    ShadowConfounded,
    /// A beauty filter may have altered the skin.
    FilterSuspected,
    /// The photo is soft.
    Blurred,
}

impl QualityFlag {
    /// Derives flags from free-form quality reason names.
    #[must_use]
    pub fn from_reasons<S: AsRef<str>>(reasons: &[S]) -> Vec<Self> {
        let lowered: Vec<String> = reasons.iter().map(|r| r.as_ref().to_lowercase()).collect();
        let any = |needles: &[&str]| lowered.iter().any(|r| needles.iter().any(|n| r.contains(n)));
        let mut flags = Vec::new();
        if any(&["bright", "glare", "specular"]) {
            flags.push(Self::GlareConfounded);
        }
        if any(&["shadow", "dark"]) {
            flags.push(Self::ShadowConfounded);
        }
        if any(&["filter", "beauty"]) {
            flags.push(Self::FilterSuspected);
        }
        if any(&["blur"]) {
            flags.push(Self::Blurred);
        }
        flags
    }
}

/// Grid size of a sanitized heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    /// Columns.
    pub w: usize,
    /// Rows.
    pub h: usize,
}

/// Closed value range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

/// A sanitized closed polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// At least three vertices, rounded to three decimals.
    pub points: Vec<NormPoint>,
    /// Always `true`.
    pub closed: bool,
}

/// A sanitized heatmap on the canonical grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    /// Always [`FACE_COORD_SPACE`].
    pub coord_space: String,
    /// Canonical grid.
    pub grid: GridSize,
    /// Row-major values in `[0,1]`.
    pub values: Vec<f64>,
    /// Always `0..=1`.
    pub value_range: ValueRange,
    /// Rendering hint.
    pub smoothing_hint: String,
}

/// Geometry of a region, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionShape {
    /// Axis-aligned box.
    Bbox {
        /// The box.
        bbox: NormBox,
    },
    /// Closed outline.
    Polygon {
        /// The outline.
        polygon: Polygon,
    },
    /// Intensity grid.
    Heatmap {
        /// The grid.
        heatmap: Heatmap,
    },
}

impl RegionShape {
    /// Kind of this shape.
    #[must_use]
    pub const fn region_type(&self) -> RegionType {
        match self {
            Self::Bbox { .. } => RegionType::Bbox,
            Self::Polygon { .. } => RegionType::Polygon,
            Self::Heatmap { .. } => RegionType::Heatmap,
        }
    }
}

/// How a region should be drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStyle {
    /// Opacity hint in `[0,1]`.
    pub intensity: f64,
    /// Z-order hint in `[0,1]`.
    pub priority: f64,
    /// Issue name shown as a label.
    pub label_hint: VisualIssue,
}

/// One renderable region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// `<finding>_bbox`, `<finding>_polygon` or `<finding>_heatmap`.
    pub region_id: String,
    /// Geometry.
    #[serde(flatten)]
    pub shape: RegionShape,
    /// Always [`FACE_COORD_SPACE`].
    pub coord_space: String,
    /// Drawing hints.
    pub style: RegionStyle,
    /// Clip notes, present only if sanitizing altered the geometry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// Up to four photo-quality caveats.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_flags: Vec<QualityFlag>,
}
