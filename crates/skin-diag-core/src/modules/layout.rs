//! Fixed face layout: module boxes, shrink factors and the default face oval.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{ModuleId, NormBox, NormPoint};
use crate::regions::sanitize_bbox;

/// A 16-vertex face outline in face-crop-normalized space, clockwise from the
/// top of the forehead.
pub const DEFAULT_FACE_OVAL: [NormPoint; 16] = [
    NormPoint::new(0.5, 0.06),
    NormPoint::new(0.64, 0.1),
    NormPoint::new(0.75, 0.2),
    NormPoint::new(0.82, 0.35),
    NormPoint::new(0.84, 0.5),
    NormPoint::new(0.8, 0.66),
    NormPoint::new(0.72, 0.8),
    NormPoint::new(0.62, 0.9),
    NormPoint::new(0.5, 0.95),
    NormPoint::new(0.38, 0.9),
    NormPoint::new(0.28, 0.8),
    NormPoint::new(0.2, 0.66),
    NormPoint::new(0.16, 0.5),
    NormPoint::new(0.18, 0.35),
    NormPoint::new(0.25, 0.2),
    NormPoint::new(0.36, 0.1),
];

/// Per-module scale applied to the base box before rasterizing its mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShrinkFactors {
    /// Forehead.
    pub forehead: f64,
    /// Both cheeks.
    pub cheeks: f64,
    /// Nose.
    pub nose: f64,
    /// Chin.
    pub chin: f64,
    /// Both under-eye zones.
    pub under_eyes: f64,
}

impl Default for ShrinkFactors {
    fn default() -> Self {
        Self {
            forehead: 0.88,
            cheeks: 0.9,
            nose: 0.95,
            chin: 0.8,
            under_eyes: 0.95,
        }
    }
}

impl ShrinkFactors {
    /// Factor for `module`.
    #[must_use]
    pub const fn for_module(&self, module: ModuleId) -> f64 {
        match module {
            ModuleId::Forehead => self.forehead,
            ModuleId::LeftCheek | ModuleId::RightCheek => self.cheeks,
            ModuleId::Nose => self.nose,
            ModuleId::Chin => self.chin,
            ModuleId::UnderEyeLeft | ModuleId::UnderEyeRight => self.under_eyes,
        }
    }
}

/// The module's box: an override if it survives sanitizing, else the default.
#[must_use]
pub fn module_box(module: ModuleId, overrides: &BTreeMap<ModuleId, NormBox>) -> NormBox {
    overrides
        .get(&module)
        .and_then(|b| sanitize_bbox(*b).ok())
        .map_or_else(|| module.default_box(), |s| s.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::sanitize_polygon;

    #[test]
    fn test_face_oval_is_a_valid_polygon() {
        let s = sanitize_polygon(&DEFAULT_FACE_OVAL).unwrap();
        assert!(!s.clipped());
        assert_eq!(s.value.polygon.points.len(), 16);
        assert_eq!(s.value.bbox, NormBox::new(0.16, 0.06, 0.68, 0.89));
    }

    #[test]
    fn test_shrink_lookup() {
        let f = ShrinkFactors::default();
        assert!((f.for_module(ModuleId::Chin) - 0.8).abs() < f64::EPSILON);
        assert!((f.for_module(ModuleId::RightCheek) - 0.9).abs() < f64::EPSILON);
        assert!((f.for_module(ModuleId::UnderEyeLeft) - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_override_must_sanitize() {
        let mut overrides = BTreeMap::new();
        overrides.insert(ModuleId::Nose, NormBox::new(0.4, 0.3, 0.2, 0.3));
        overrides.insert(ModuleId::Chin, NormBox::new(f64::NAN, 0.3, 0.2, 0.3));
        assert_eq!(module_box(ModuleId::Nose, &overrides), NormBox::new(0.4, 0.3, 0.2, 0.3));
        assert_eq!(module_box(ModuleId::Chin, &overrides), ModuleId::Chin.default_box());
        assert_eq!(module_box(ModuleId::Forehead, &overrides), ModuleId::Forehead.default_box());
    }
}
