//! Sharpness proxy: mean absolute 4-neighbour Laplacian over skin pixels.

use crate::domain::PixelBox;
use crate::mask::Bitmap;

/// `|4c - up - down - left - right|` at an interior pixel.
///
/// The caller guarantees that `idx` is at least one pixel away from every edge.
#[must_use]
pub fn laplacian_abs(gray: &[u8], width: usize, idx: usize) -> u32 {
    let c = i32::from(gray[idx]);
    let sum = i32::from(gray[idx - 1])
        + i32::from(gray[idx + 1])
        + i32::from(gray[idx - width])
        + i32::from(gray[idx + width]);
    (sum - 4 * c).unsigned_abs()
}

/// Mean absolute Laplacian over skin pixels strictly inside `bbox`.
///
/// Returns `0` when no interior skin pixel exists.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn laplacian_energy(gray: &[u8], mask: &Bitmap, bbox: PixelBox) -> f64 {
    let width = mask.width();
    let height = mask.height();
    let x_end = (bbox.x1 as usize).min(width.saturating_sub(1));
    let y_end = (bbox.y1 as usize).min(height.saturating_sub(1));
    let mut sum = 0u64;
    let mut count = 0u64;
    for y in (bbox.y0 as usize + 1)..y_end {
        for x in (bbox.x0 as usize + 1)..x_end {
            if !mask.get(x, y) {
                continue;
            }
            sum += u64::from(laplacian_abs(gray, width, y * width + x));
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Maps Laplacian energy onto `[0,1]`: 6 and below is fully blurred, 24 and above is sharp.
#[must_use]
pub fn blur_factor(energy: f64) -> f64 {
    crate::numeric::clamp01((energy - 6.0) / 18.0)
}
