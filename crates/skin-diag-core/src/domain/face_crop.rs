//! Face crop rectangle that region and module coordinates are relative to.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{NormCorners, PixelRect, Size};
use crate::numeric::clamp01;

/// Coordinate space tag of [`FaceCrop::bbox_px`].
pub const ORIG_COORD_SPACE: &str = "orig_px_v1";

/// Default margin applied around the skin bbox.
pub const DEFAULT_MARGIN_SCALE: f64 = 1.2;

/// Longest edge of the suggested render size.
const RENDER_MAX_EDGE: u32 = 512;

/// Smallest normalized extent used when centring a crop on a degenerate bbox.
const MIN_BASE_EXTENT: f64 = 0.01;

/// A crop in original-photo pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceCrop {
    /// Deterministic identifier derived from the geometry.
    pub crop_id: String,
    /// Always [`ORIG_COORD_SPACE`].
    pub coord_space: String,
    /// Crop rectangle.
    pub bbox_px: PixelRect,
    /// Size of the photo the rectangle lives in.
    pub orig_size_px: Size,
    /// Suggested render size, longest edge at most 512.
    pub render_size_px_hint: Size,
}

impl FaceCrop {
    /// Builds a crop with a derived id and render hint.
    #[must_use]
    pub fn new(bbox_px: PixelRect, orig_size_px: Size) -> Self {
        let bbox_px = PixelRect {
            w: bbox_px.w.max(1),
            h: bbox_px.h.max(1),
            ..bbox_px
        };
        let orig_size_px = Size::new(orig_size_px.w.max(1), orig_size_px.h.max(1));
        Self {
            crop_id: crop_id(bbox_px, orig_size_px),
            coord_space: ORIG_COORD_SPACE.to_string(),
            bbox_px,
            orig_size_px,
            render_size_px_hint: render_hint(bbox_px.w, bbox_px.h),
        }
    }

    /// The whole photo.
    #[must_use]
    pub fn full_frame(orig_size_px: Size) -> Self {
        let w = orig_size_px.w.max(1);
        let h = orig_size_px.h.max(1);
        Self::new(PixelRect { x: 0, y: 0, w, h }, Size::new(w, h))
    }

    /// Centres a `margin_scale`-enlarged copy of a normalized skin bbox and
    /// clamps it into the photo. A non-positive or non-finite scale uses
    /// [`DEFAULT_MARGIN_SCALE`]; a non-finite bbox yields the full frame.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn from_skin_bbox(skin: NormCorners, orig_size_px: Size, margin_scale: f64) -> Self {
        if !skin.is_finite() {
            return Self::full_frame(orig_size_px);
        }
        let width = orig_size_px.w.max(1);
        let height = orig_size_px.h.max(1);
        let scale = if margin_scale.is_finite() && margin_scale > 0.0 {
            margin_scale
        } else {
            DEFAULT_MARGIN_SCALE
        };

        let s = NormCorners::ordered(
            clamp01(skin.x0),
            clamp01(skin.y0),
            clamp01(skin.x1),
            clamp01(skin.y1),
        );
        let axis = |lo: f64, hi: f64, size: u32| -> (u32, u32) {
            let base = (hi - lo).max(MIN_BASE_EXTENT);
            let center = lo + base / 2.0;
            let extent = (base * scale).min(1.0);
            let c0 = clamp01(center - extent / 2.0);
            let c1 = clamp01(c0 + extent);
            let size_f = f64::from(size);
            let px = (c0 * size_f).floor().max(0.0) as u32;
            let pw = ((c1 - c0) * size_f).round().max(1.0) as u32;
            let bounded = pw.min(size.saturating_sub(px)).max(1);
            (px.min(size - 1), bounded)
        };
        let (x, w) = axis(s.x0, s.x1, width);
        let (y, h) = axis(s.y0, s.y1, height);
        Self::new(PixelRect { x, y, w, h }, Size::new(width, height))
    }

    /// Maps corners normalized to the whole photo into this crop's
    /// normalized space, clamping to `[0,1]`.
    #[must_use]
    pub fn to_crop_norm(&self, corners: NormCorners) -> NormCorners {
        let ow = f64::from(self.orig_size_px.w.max(1));
        let oh = f64::from(self.orig_size_px.h.max(1));
        let cx = f64::from(self.bbox_px.x) / ow;
        let cy = f64::from(self.bbox_px.y) / oh;
        let cw = f64::from(self.bbox_px.w.max(1)) / ow;
        let ch = f64::from(self.bbox_px.h.max(1)) / oh;
        NormCorners::ordered(
            clamp01((corners.x0 - cx) / cw),
            clamp01((corners.y0 - cy) / ch),
            clamp01((corners.x1 - cx) / cw),
            clamp01((corners.y1 - cy) / ch),
        )
    }
}

fn crop_id(bbox: PixelRect, orig: Size) -> String {
    let signature = format!("{}:{}:{}:{}:{}:{}", orig.w, orig.h, bbox.x, bbox.y, bbox.w, bbox.h);
    let digest = Sha256::digest(signature.as_bytes());
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("crop_{hex}")
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn render_hint(w: u32, h: u32) -> Size {
    let w = w.max(1);
    let h = h.max(1);
    let max_edge = w.max(h);
    if max_edge <= RENDER_MAX_EDGE {
        return Size::new(w, h);
    }
    let ratio = f64::from(RENDER_MAX_EDGE) / f64::from(max_edge);
    Size::new(
        (f64::from(w) * ratio).round().max(1.0) as u32,
        (f64::from(h) * ratio).round().max(1.0) as u32,
    )
}
