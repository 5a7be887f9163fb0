//! Per-module mask rasterization and refinement.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::layout::{ShrinkFactors, DEFAULT_FACE_OVAL};
use crate::domain::{MaskFallback, ModuleId, NormBox, NormPoint, RegionShape};
use crate::mask::{Bitmap, HEATMAP_THRESHOLD};
use crate::numeric::{clamp01, round3};
use crate::regions::BuiltRegion;

/// Tunables of the module mask builder.
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleMaskConfig {
    /// Side length of each module's square mask.
    pub grid: usize,
    /// Base-box shrink per module.
    pub shrink: ShrinkFactors,
    /// Lowest skin-mask positive ratio considered plausible.
    pub skin_ratio_min: f64,
    /// Highest skin-mask positive ratio considered plausible.
    pub skin_ratio_max: f64,
    /// Absolute floor on pixels a skin-mask intersection must keep.
    pub min_kept_pixels: usize,
    /// Fraction of the module's pixels a skin-mask intersection must keep.
    pub min_kept_ratio: f64,
    /// Face outline to clip modules to; `None` disables oval clipping.
    pub face_oval: Option<Vec<NormPoint>>,
    /// Replacement module boxes.
    pub module_boxes: BTreeMap<ModuleId, NormBox>,
}

impl Default for ModuleMaskConfig {
    fn default() -> Self {
        Self {
            grid: 64,
            shrink: ShrinkFactors::default(),
            skin_ratio_min: 0.04,
            skin_ratio_max: 0.95,
            min_kept_pixels: 24,
            min_kept_ratio: 0.25,
            face_oval: Some(DEFAULT_FACE_OVAL.to_vec()),
            module_boxes: BTreeMap::new(),
        }
    }
}

impl ModuleMaskConfig {
    /// Largest accepted grid.
    pub const MAX_GRID: usize = 256;

    /// Clamps the grid to `1..=256` and the ratios into `[0,1]`, ordering the band.
    #[must_use]
    pub fn normalized(self) -> Self {
        let lo = clamp01(self.skin_ratio_min);
        let hi = clamp01(self.skin_ratio_max);
        Self {
            grid: self.grid.clamp(1, Self::MAX_GRID),
            skin_ratio_min: lo.min(hi),
            skin_ratio_max: lo.max(hi),
            min_kept_ratio: clamp01(self.min_kept_ratio),
            ..self
        }
    }
}

/// A module's final mask and the refinements that fell back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMask {
    /// `grid × grid` mask; never blank.
    pub mask: Bitmap,
    /// Refinements discarded on the way.
    pub fallbacks: Vec<MaskFallback>,
}

impl ModuleMask {
    /// Bounding box of the mask in grid-normalized units.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn bbox_norm(&self) -> Option<NormBox> {
        let b = self.mask.bounding_box()?;
        let w = self.mask.width() as f64;
        let h = self.mask.height() as f64;
        Some(NormBox::new(
            round3(f64::from(b.x0) / w),
            round3(f64::from(b.y0) / h),
            round3(f64::from(b.width()) / w),
            round3(f64::from(b.height()) / h),
        ))
    }
}

/// Rasterizes a region at `grid × grid`.
#[must_use]
pub fn region_bitmap(region: &BuiltRegion, grid: usize) -> Bitmap {
    match &region.region.shape {
        RegionShape::Bbox { bbox } => Bitmap::from_norm_box(bbox, grid, grid),
        RegionShape::Polygon { polygon } => Bitmap::from_polygon(&polygon.points, grid, grid),
        RegionShape::Heatmap { heatmap } => Bitmap::from_heatmap(
            &heatmap.values,
            heatmap.grid.w,
            heatmap.grid.h,
            grid,
            grid,
            HEATMAP_THRESHOLD,
            1.0,
        ),
    }
}

/// Builds one module's mask.
///
/// Starts from the shrunk base box, replaced by the evidence union clipped to
/// the base box when evidence exists. The face oval and the skin mask are
/// each applied only when they keep enough of the mask; otherwise the
/// pre-refinement mask stands and the fallback is recorded. The result is
/// never blank.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn build_module_mask(
    module: ModuleId,
    module_box: NormBox,
    evidence: &[&BuiltRegion],
    skin_mask: Option<&Bitmap>,
    config: &ModuleMaskConfig,
) -> ModuleMask {
    let grid = config.grid;
    let mut fallbacks = Vec::new();

    let mut base = Bitmap::from_norm_box(&module_box.shrink(config.shrink.for_module(module)), grid, grid);
    if base.is_blank() {
        base = Bitmap::from_norm_box(&module_box, grid, grid);
    }

    let mut mask = if evidence.is_empty() {
        None
    } else {
        let mut union = Bitmap::square(grid);
        for region in evidence {
            union.or_assign(&region_bitmap(region, grid));
        }
        Some(union.and(&base)).filter(|m| !m.is_blank())
    }
    .unwrap_or_else(|| {
        fallbacks.push(MaskFallback::NoEvidence);
        base.clone()
    });

    if let Some(oval) = &config.face_oval {
        let clipped = mask.and(&Bitmap::from_polygon(oval, grid, grid));
        if clipped.is_blank() {
            fallbacks.push(MaskFallback::OvalEmpty);
        } else {
            mask = clipped;
        }
    }

    if let Some(skin) = skin_mask {
        let plausible = skin.width() == grid && skin.height() == grid && {
            let ratio = skin.positive_ratio();
            ratio >= config.skin_ratio_min && ratio <= config.skin_ratio_max
        };
        if plausible {
            let kept = mask.and(skin);
            let need = (config.min_kept_pixels as f64).max(config.min_kept_ratio * mask.count_ones() as f64);
            if kept.count_ones() as f64 >= need && !kept.is_blank() {
                mask = kept;
            } else {
                fallbacks.push(MaskFallback::SkinMaskTooAggressive);
            }
        } else {
            fallbacks.push(MaskFallback::SkinMaskImplausible);
        }
    }

    if !fallbacks.is_empty() {
        debug!(module = %module, ?fallbacks, "module mask refinement fell back");
    }
    ModuleMask { mask, fallbacks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Region, RegionStyle, VisualIssue, FACE_COORD_SPACE};

    fn bbox_region(b: NormBox) -> BuiltRegion {
        BuiltRegion {
            region: Region {
                region_id: "r_bbox".into(),
                shape: RegionShape::Bbox { bbox: b },
                coord_space: FACE_COORD_SPACE.into(),
                style: RegionStyle {
                    intensity: 0.5,
                    priority: 0.5,
                    label_hint: VisualIssue::Redness,
                },
                notes: vec![],
                quality_flags: vec![],
            },
            issue: VisualIssue::Redness,
            severity: 2.0,
            confidence: 0.7,
            bbox: Some(b),
        }
    }

    fn no_oval() -> ModuleMaskConfig {
        ModuleMaskConfig {
            face_oval: None,
            ..ModuleMaskConfig::default()
        }
    }

    // === Fallbacks ===

    #[test]
    fn test_no_evidence_uses_base_box() {
        let cfg = no_oval();
        let b = ModuleId::Nose.default_box();
        let out = build_module_mask(ModuleId::Nose, b, &[], None, &cfg);
        assert_eq!(out.fallbacks, vec![MaskFallback::NoEvidence]);
        let expected = Bitmap::from_norm_box(&b.shrink(0.95), 64, 64);
        assert_eq!(out.mask, expected);
    }

    #[test]
    fn test_empty_skin_mask_never_blanks_module() {
        let cfg = no_oval();
        let skin = Bitmap::square(64);
        let b = ModuleId::Chin.default_box();
        let out = build_module_mask(ModuleId::Chin, b, &[], Some(&skin), &cfg);
        assert!(!out.mask.is_blank());
        assert_eq!(
            out.fallbacks,
            vec![MaskFallback::NoEvidence, MaskFallback::SkinMaskImplausible]
        );
    }

    #[test]
    fn test_disjoint_skin_mask_is_too_aggressive() {
        let cfg = no_oval();
        let mut skin = Bitmap::square(64);
        skin.fill_rect(0.0, 0.0, 64.0, 10.0, true);
        let b = ModuleId::Chin.default_box();
        let out = build_module_mask(ModuleId::Chin, b, &[], Some(&skin), &cfg);
        assert!(!out.mask.is_blank());
        assert!(out.fallbacks.contains(&MaskFallback::SkinMaskTooAggressive));
    }

    #[test]
    fn test_plausible_skin_mask_is_applied() {
        let cfg = no_oval();
        let mut skin = Bitmap::square(64);
        skin.fill_rect(0.0, 0.0, 32.0, 64.0, true);
        let b = ModuleId::Forehead.default_box();
        let out = build_module_mask(ModuleId::Forehead, b, &[], Some(&skin), &cfg);
        assert_eq!(out.fallbacks, vec![MaskFallback::NoEvidence]);
        let bbox = out.mask.bounding_box().unwrap();
        assert!(bbox.x1 < 32);
    }

    // === Evidence and oval ===

    #[test]
    fn test_evidence_is_clipped_to_base() {
        let cfg = no_oval();
        let region = bbox_region(NormBox::new(0.0, 0.0, 0.3, 1.0));
        let b = ModuleId::LeftCheek.default_box();
        let out = build_module_mask(ModuleId::LeftCheek, b, &[&region], None, &cfg);
        assert!(out.fallbacks.is_empty());
        let base = Bitmap::from_norm_box(&b.shrink(0.9), 64, 64);
        assert_eq!(out.mask.and(&base), out.mask);
        assert!(out.mask.count_ones() < base.count_ones());
    }

    #[test]
    fn test_oval_outside_module_falls_back() {
        let cfg = ModuleMaskConfig {
            face_oval: Some(vec![
                NormPoint::new(0.9, 0.9),
                NormPoint::new(1.0, 0.9),
                NormPoint::new(1.0, 1.0),
            ]),
            ..ModuleMaskConfig::default()
        };
        let b = ModuleId::Forehead.default_box();
        let out = build_module_mask(ModuleId::Forehead, b, &[], None, &cfg);
        assert!(out.fallbacks.contains(&MaskFallback::OvalEmpty));
        assert!(!out.mask.is_blank());
    }

    #[test]
    fn test_default_oval_trims_forehead_corners() {
        let b = ModuleId::Forehead.default_box();
        let out = build_module_mask(ModuleId::Forehead, b, &[], None, &ModuleMaskConfig::default());
        let unclipped = Bitmap::from_norm_box(&b.shrink(0.88), 64, 64);
        assert!(out.mask.count_ones() < unclipped.count_ones());
    }

    #[test]
    fn test_bbox_norm_and_normalized_config() {
        let mut mask = Bitmap::square(10);
        mask.fill_rect(2.0, 3.0, 6.0, 5.0, true);
        let m = ModuleMask {
            mask,
            fallbacks: vec![],
        };
        assert_eq!(m.bbox_norm(), Some(NormBox::new(0.2, 0.3, 0.4, 0.2)));

        let cfg = ModuleMaskConfig {
            grid: 0,
            skin_ratio_min: 0.9,
            skin_ratio_max: 0.1,
            ..ModuleMaskConfig::default()
        }
        .normalized();
        assert_eq!(cfg.grid, 1);
        assert!((cfg.skin_ratio_min - 0.1).abs() < f64::EPSILON);
        assert!((cfg.skin_ratio_max - 0.9).abs() < f64::EPSILON);
    }
}
