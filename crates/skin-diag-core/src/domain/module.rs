//! Anatomical modules and the module card payload.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{FaceCrop, Language, NormBox, QualityGrade, Region, RegionType, VisualIssue};

/// One of the seven fixed face zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleId {
    /// Forehead.
    Forehead,
    /// Left cheek.
    LeftCheek,
    /// Right cheek.
    RightCheek,
    /// Nose.
    Nose,
    /// Chin.
    Chin,
    /// Under the left eye.
    UnderEyeLeft,
    /// Under the right eye.
    UnderEyeRight,
}

impl ModuleId {
    /// All modules in card order.
    pub const ALL: [Self; 7] = [
        Self::Forehead,
        Self::LeftCheek,
        Self::RightCheek,
        Self::Nose,
        Self::Chin,
        Self::UnderEyeLeft,
        Self::UnderEyeRight,
    ];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forehead => "forehead",
            Self::LeftCheek => "left_cheek",
            Self::RightCheek => "right_cheek",
            Self::Nose => "nose",
            Self::Chin => "chin",
            Self::UnderEyeLeft => "under_eye_left",
            Self::UnderEyeRight => "under_eye_right",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// Human label.
    #[must_use]
    pub const fn label(self, lang: Language) -> &'static str {
        match self {
            Self::Forehead => lang.pick("forehead", "额头"),
            Self::LeftCheek => lang.pick("left cheek", "左脸颊"),
            Self::RightCheek => lang.pick("right cheek", "右脸颊"),
            Self::Nose => lang.pick("nose", "鼻部"),
            Self::Chin => lang.pick("chin", "下巴"),
            Self::UnderEyeLeft => lang.pick("left under-eye", "左眼下"),
            Self::UnderEyeRight => lang.pick("right under-eye", "右眼下"),
        }
    }

    /// Default box in face-crop-normalized space.
    #[must_use]
    pub const fn default_box(self) -> NormBox {
        match self {
            Self::Forehead => NormBox::new(0.2, 0.03, 0.6, 0.22),
            Self::LeftCheek => NormBox::new(0.08, 0.34, 0.34, 0.3),
            Self::RightCheek => NormBox::new(0.58, 0.34, 0.34, 0.3),
            Self::Nose => NormBox::new(0.42, 0.32, 0.16, 0.32),
            Self::Chin => NormBox::new(0.33, 0.67, 0.34, 0.26),
            Self::UnderEyeLeft => NormBox::new(0.18, 0.24, 0.24, 0.13),
            Self::UnderEyeRight => NormBox::new(0.58, 0.24, 0.24, 0.13),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issue aggregated inside one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleIssue {
    /// Issue.
    pub issue_type: VisualIssue,
    /// Severity on a `0..=4` scale.
    pub severity_0_4: f64,
    /// Confidence in `[0,1]`.
    pub confidence_0_1: f64,
    /// Up to three contributing regions, largest overlap first.
    pub evidence_region_ids: Vec<String>,
    /// One-sentence explanation.
    pub explanation_short: String,
}

/// One module on the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Which zone.
    pub module_id: ModuleId,
    /// Up to four issues, most severe first.
    pub issues: Vec<ModuleIssue>,
    /// The zone's box after sanitizing; shrinking applies only to the mask.
    #[serde(rename = "box")]
    pub module_box: NormBox,
    /// Bounding box of the final mask, in grid-normalized units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_bbox_norm: Option<NormBox>,
    /// Side length of the square mask grid.
    pub mask_grid: usize,
    /// Run-length encoding of the mask.
    pub mask_rle_norm: String,
}

/// Fixed safety copy shown with every card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disclaimers {
    /// The card is not a medical diagnosis.
    pub non_medical: bool,
    /// When to seek care.
    pub seek_care_triggers: Vec<String>,
}

impl Default for Disclaimers {
    fn default() -> Self {
        Self {
            non_medical: true,
            seek_care_triggers: vec![
                "Rapidly worsening pain, swelling, or spreading rash.".into(),
                "Eye swelling, breathing discomfort, or severe allergy signs.".into(),
                "Persistent worsening after stopping all new actives for 72 hours.".into(),
            ],
        }
    }
}

/// Card body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulePayload {
    /// Always `true`.
    pub used_photos: bool,
    /// Photo grade; only `pass` and `degraded` produce a card.
    pub quality_grade: QualityGrade,
    /// Crop the coordinates are relative to.
    pub face_crop: FaceCrop,
    /// Up to 120 regions.
    pub regions: Vec<Region>,
    /// All seven modules.
    pub modules: Vec<Module>,
    /// Safety copy.
    pub disclaimers: Disclaimers,
}

/// `(reason, region_type) → count` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryCount {
    /// Rejection or clip reason.
    pub reason: String,
    /// Geometry kind.
    pub region_type: RegionType,
    /// Occurrences.
    pub count: usize,
}

/// `(region_type, issue_type) → count` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCount {
    /// Geometry kind.
    pub region_type: RegionType,
    /// Issue.
    pub issue_type: VisualIssue,
    /// Occurrences.
    pub count: usize,
}

/// `(module_id, issue_type) → count` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleIssueCount {
    /// Module.
    pub module_id: ModuleId,
    /// Issue.
    pub issue_type: VisualIssue,
    /// Occurrences.
    pub count: usize,
}

/// Why a module mask refinement was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskFallback {
    /// No region referenced the module; its base box was used.
    NoEvidence,
    /// The face oval did not overlap the mask.
    OvalEmpty,
    /// The skin mask coverage was outside the plausible band.
    SkinMaskImplausible,
    /// The skin mask intersection kept too few pixels.
    SkinMaskTooAggressive,
}

/// `(module_id, fallback) → count` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskFallbackCount {
    /// Module.
    pub module_id: ModuleId,
    /// What was discarded.
    pub fallback: MaskFallback,
    /// Occurrences.
    pub count: usize,
}

/// Observability counters for one card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardMetrics {
    /// Dropped or clipped geometries.
    pub geometry_drop_counts: Vec<GeometryCount>,
    /// Emitted regions by kind and issue.
    pub region_counts: Vec<RegionCount>,
    /// Module issues by module and issue.
    pub module_issue_counts: Vec<ModuleIssueCount>,
    /// Mask refinements that fell back.
    pub mask_fallback_counts: Vec<MaskFallbackCount>,
}

/// The module card and its counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleCard {
    /// `photo_modules_<crop_id>`.
    pub card_id: String,
    /// Always `photo_modules_v1`.
    #[serde(rename = "type")]
    pub card_type: String,
    /// Body.
    pub payload: ModulePayload,
    /// Counters.
    pub metrics: CardMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_order_and_names() {
        let names: Vec<&str> = ModuleId::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(
            names,
            ["forehead", "left_cheek", "right_cheek", "nose", "chin", "under_eye_left", "under_eye_right"]
        );
        assert_eq!(ModuleId::UnderEyeRight.label(Language::Cn), "右眼下");
        assert_eq!(ModuleId::from_name("left_cheek"), Some(ModuleId::LeftCheek));
        assert_eq!(ModuleId::from_name("ear"), None);
    }

    #[test]
    fn test_default_boxes_fit_unit_square() {
        for m in ModuleId::ALL {
            let b = m.default_box();
            assert!(b.x >= 0.0 && b.y >= 0.0 && b.x1() <= 1.0 && b.y1() <= 1.0, "{m}");
        }
    }
}
