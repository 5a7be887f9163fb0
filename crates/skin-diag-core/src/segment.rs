//! Skin region-of-interest segmentation.
//!
//! Pixels pass a YCrCb seed test, 4-connected seed pixels are grouped into
//! components, and the largest component (boosted if it reaches the centre
//! of the frame) becomes the ROI.

use tracing::debug;

use crate::color::rgb_to_ycrcb;
use crate::domain::{PixelBox, SegmentError};
use crate::imaging::AnalysisImage;
use crate::mask::Bitmap;

/// Components smaller than this are never accepted, whatever the image size.
const MIN_ACCEPT_PIXELS: usize = 200;
/// Components smaller than this fraction of the frame are rejected.
const MIN_ACCEPT_FRACTION: f64 = 0.06;
/// Score boost for a component that touches the centre band.
const CENTER_BOOST: f64 = 1.35;

/// The selected skin component.
#[derive(Debug, Clone)]
pub struct SkinRoi {
    /// Component mask over the analysis image.
    pub mask: Bitmap,
    /// Number of pixels in the component.
    pub skin_pixels: usize,
    /// `skin_pixels / N`.
    pub coverage: f64,
    /// Inclusive bounding box of the component.
    pub bbox: PixelBox,
    /// Whether the component reaches the central band of the frame.
    pub touches_center: bool,
}

#[derive(Debug, Clone, Copy)]
struct Component {
    id: u32,
    size: usize,
    touches_center: bool,
    bbox: PixelBox,
}

fn is_seed_skin(image: &AnalysisImage, idx: usize) -> bool {
    let [r, g, b] = image.rgb_at(idx);
    let px = rgb_to_ycrcb(r, g, b);
    px.y >= 40.0 && (133.0..=178.0).contains(&px.cr) && (80.0..=135.0).contains(&px.cb)
}

/// Finds the skin ROI.
///
/// # Errors
///
/// [`SegmentError::NotFound`] if no pixel is skin-coloured, and
/// [`SegmentError::TooSmall`] if every component is below
/// `max(200, floor(0.06 · N))` pixels.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn segment_skin(image: &AnalysisImage) -> Result<SkinRoi, SegmentError> {
    let width = image.width();
    let height = image.height();
    let n = width * height;

    let center_x0 = (width as f64 * 0.35).floor() as usize;
    let center_x1 = (width as f64 * 0.65).ceil() as usize;
    let center_y0 = (height as f64 * 0.35).floor() as usize;
    let center_y1 = (height as f64 * 0.7).ceil() as usize;

    let mut labels = vec![0u32; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut components: Vec<Component> = Vec::new();
    let mut next_id = 0u32;

    for start in 0..n {
        if labels[start] != 0 || !is_seed_skin(image, start) {
            continue;
        }
        next_id += 1;
        let id = next_id;
        labels[start] = id;
        stack.push(start);

        let mut size = 0usize;
        let mut touches_center = false;
        let (mut min_x, mut min_y) = (width, height);
        let (mut max_x, mut max_y) = (0usize, 0usize);

        while let Some(idx) = stack.pop() {
            size += 1;
            let x = idx % width;
            let y = idx / width;
            if (center_x0..=center_x1).contains(&x) && (center_y0..=center_y1).contains(&y) {
                touches_center = true;
            }
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            let neighbours = [
                (y > 0).then(|| idx - width),
                (y + 1 < height).then(|| idx + width),
                (x > 0).then(|| idx - 1),
                (x + 1 < width).then(|| idx + 1),
            ];
            for nb in neighbours.into_iter().flatten() {
                if labels[nb] == 0 && is_seed_skin(image, nb) {
                    labels[nb] = id;
                    stack.push(nb);
                }
            }
        }

        components.push(Component {
            id,
            size,
            touches_center,
            bbox: PixelBox::new(min_x as u32, min_y as u32, max_x as u32, max_y as u32),
        });
    }

    if components.is_empty() {
        return Err(SegmentError::NotFound);
    }

    let required = MIN_ACCEPT_PIXELS.max((n as f64 * MIN_ACCEPT_FRACTION).floor() as usize);
    let mut best: Option<(f64, Component)> = None;
    for c in &components {
        if c.size < required {
            continue;
        }
        let score = c.size as f64 * if c.touches_center { CENTER_BOOST } else { 1.0 };
        match best {
            Some((best_score, _)) if score <= best_score => {}
            _ => best = Some((score, *c)),
        }
    }

    let Some((_, best)) = best else {
        let largest = components.iter().map(|c| c.size).max().unwrap_or(0);
        return Err(SegmentError::TooSmall { largest, required });
    };

    let cells = labels.iter().map(|&l| u8::from(l == best.id)).collect();
    let mask = Bitmap::from_raw(width, height, cells).ok_or(SegmentError::NotFound)?;
    let coverage = best.size as f64 / n as f64;
    debug!(
        components = components.len(),
        skin_pixels = best.size,
        coverage,
        touches_center = best.touches_center,
        "skin roi selected"
    );

    Ok(SkinRoi {
        mask,
        skin_pixels: best.size,
        coverage,
        bbox: best.bbox,
        touches_center: best.touches_center,
    })
}

/// Sub-boxes of the ROI used by the detectors, in analysis pixels (inclusive).
///
/// Boxes are placed by fraction of the ROI bbox and may extend one pixel
/// past the ROI on the far edge; readers clamp to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBoxes {
    /// The ROI bbox itself.
    pub full: PixelBox,
    /// Upper band.
    pub forehead: PixelBox,
    /// Central column.
    pub nose: PixelBox,
    /// Both cheeks and the nose between them.
    pub cheeks: PixelBox,
    /// Left cheek.
    pub left_cheek: PixelBox,
    /// Right cheek.
    pub right_cheek: PixelBox,
    /// Lower band.
    pub chin: PixelBox,
    /// Eye band excluded from acne candidates.
    pub exclude_eyes: PixelBox,
    /// Mouth area excluded from acne candidates.
    pub exclude_mouth: PixelBox,
}

impl RegionBoxes {
    /// Lays out the sub-boxes over an ROI bbox.
    #[must_use]
    pub fn from_roi(bbox: PixelBox) -> Self {
        let w = f64::from(bbox.width().max(1));
        let h = f64::from(bbox.height().max(1));
        let x0 = f64::from(bbox.x0);
        let y0 = f64::from(bbox.y0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let place = |rx0: f64, ry0: f64, rx1: f64, ry1: f64| {
            let px = |v: f64| v.round().max(0.0) as u32;
            PixelBox::new(
                px(x0 + rx0 * w),
                px(y0 + ry0 * h),
                px(x0 + rx1 * w),
                px(y0 + ry1 * h),
            )
        };
        Self {
            full: bbox,
            forehead: place(0.2, 0.0, 0.8, 0.28),
            nose: place(0.4, 0.34, 0.6, 0.66),
            cheeks: place(0.12, 0.34, 0.88, 0.74),
            left_cheek: place(0.12, 0.38, 0.42, 0.74),
            right_cheek: place(0.58, 0.38, 0.88, 0.74),
            chin: place(0.25, 0.74, 0.75, 1.0),
            exclude_eyes: place(0.15, 0.22, 0.85, 0.46),
            exclude_mouth: place(0.22, 0.74, 0.78, 0.93),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Size;
    use image::{Rgb, RgbImage};

    const SKIN: Rgb<u8> = Rgb([160, 140, 120]);
    const BACKGROUND: Rgb<u8> = Rgb([30, 60, 120]);

    fn analysis(img: RgbImage) -> AnalysisImage {
        let size = Size::new(img.width(), img.height());
        AnalysisImage::from_rgb(img, size)
    }

    // === Selection ===

    #[test]
    fn test_full_frame_skin() {
        let roi = segment_skin(&analysis(RgbImage::from_pixel(64, 64, SKIN))).unwrap();
        assert_eq!(roi.skin_pixels, 64 * 64);
        assert!((roi.coverage - 1.0).abs() < f64::EPSILON);
        assert_eq!(roi.bbox, PixelBox::new(0, 0, 63, 63));
        assert!(roi.touches_center);
    }

    #[test]
    fn test_no_skin_is_not_found() {
        let err = segment_skin(&analysis(RgbImage::from_pixel(32, 32, BACKGROUND))).unwrap_err();
        assert_eq!(err, SegmentError::NotFound);
    }

    #[test]
    fn test_small_patch_is_too_small() {
        let mut img = RgbImage::from_pixel(64, 64, BACKGROUND);
        for y in 0..10 {
            for x in 0..10 {
                img.put_pixel(x, y, SKIN);
            }
        }
        let err = segment_skin(&analysis(img)).unwrap_err();
        assert_eq!(
            err,
            SegmentError::TooSmall {
                largest: 100,
                required: 245
            }
        );
    }

    #[test]
    fn test_center_boost_beats_larger_corner_blob() {
        // Corner blob 30x30 = 900 px, centre blob 28x28 = 784 px (784*1.35 > 900).
        let mut img = RgbImage::from_pixel(100, 100, BACKGROUND);
        for y in 0..30 {
            for x in 0..30 {
                img.put_pixel(x, y, SKIN);
            }
        }
        for y in 40..68 {
            for x in 40..68 {
                img.put_pixel(x, y, SKIN);
            }
        }
        let roi = segment_skin(&analysis(img)).unwrap();
        assert_eq!(roi.skin_pixels, 784);
        assert!(roi.touches_center);
        assert_eq!(roi.bbox, PixelBox::new(40, 40, 67, 67));
    }

    // === Region boxes ===

    #[test]
    fn test_region_boxes_layout() {
        let boxes = RegionBoxes::from_roi(PixelBox::new(0, 0, 99, 99));
        assert_eq!(boxes.nose, PixelBox::new(40, 34, 60, 66));
        assert_eq!(boxes.cheeks, PixelBox::new(12, 34, 88, 74));
        assert_eq!(boxes.chin, PixelBox::new(25, 74, 75, 100));
        assert_eq!(boxes.full, PixelBox::new(0, 0, 99, 99));
    }
}
