//! Rasterizers from normalized geometry into [`Bitmap`]s.
//!
//! All inputs live in `[0,1]²`; coordinates are clamped before rasterizing.

use super::Bitmap;
use crate::domain::{NormBox, NormPoint};
use crate::numeric::clamp01;

/// Default cut-off when turning a heatmap into a binary mask.
pub const HEATMAP_THRESHOLD: f64 = 0.35;

impl Bitmap {
    /// Rasterizes a normalized box; the far edges are ceiled so any touched cell is set.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_norm_box(b: &NormBox, width: usize, height: usize) -> Self {
        let mut out = Self::new(width, height);
        let w = out.width() as f64;
        let h = out.height() as f64;
        let x0 = clamp01(b.x);
        let y0 = clamp01(b.y);
        let x1 = clamp01(b.x + b.w);
        let y1 = clamp01(b.y + b.h);
        out.fill_rect(x0 * w, y0 * h, x1 * w, y1 * h, true);
        out
    }

    /// Rasterizes a polygon with the even-odd rule, sampling cell centres.
    ///
    /// Fewer than three vertices yields a blank bitmap.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_polygon(points: &[NormPoint], width: usize, height: usize) -> Self {
        let mut out = Self::new(width, height);
        if points.len() < 3 {
            return out;
        }
        let pts: Vec<NormPoint> = points
            .iter()
            .map(|p| NormPoint::new(clamp01(p.x), clamp01(p.y)))
            .collect();
        let (w, h) = (out.width(), out.height());
        for y in 0..h {
            let ny = (y as f64 + 0.5) / h as f64;
            for x in 0..w {
                let nx = (x as f64 + 0.5) / w as f64;
                if point_in_polygon(nx, ny, &pts) {
                    out.set(x, y, true);
                }
            }
        }
        out
    }

    /// Bilinearly resamples a `src_w × src_h` heatmap onto the destination grid
    /// and sets cells whose `clamp01(value · intensity)` reaches `threshold`.
    ///
    /// A value count that does not match the source grid yields a blank bitmap.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::suboptimal_flops
    )]
    #[must_use]
    pub fn from_heatmap(
        values: &[f64],
        src_w: usize,
        src_h: usize,
        dst_w: usize,
        dst_h: usize,
        threshold: f64,
        intensity: f64,
    ) -> Self {
        let mut out = Self::new(dst_w, dst_h);
        if src_w == 0 || src_h == 0 || values.len() != src_w * src_h {
            return out;
        }
        let threshold = clamp01(threshold);
        let intensity = if intensity == 0.0 || !intensity.is_finite() {
            1.0
        } else {
            clamp01(intensity)
        };
        let value_at = |x: usize, y: usize| {
            let v = values[y * src_w + x];
            if v.is_finite() {
                v
            } else {
                0.0
            }
        };
        let (w, h) = (out.width(), out.height());
        for y in 0..h {
            let sy = ((y as f64 + 0.5) * src_h as f64) / h as f64 - 0.5;
            let y0 = (sy.floor().max(0.0) as usize).min(src_h - 1);
            let y1 = (y0 + 1).min(src_h - 1);
            let ty = sy - y0 as f64;
            for x in 0..w {
                let sx = ((x as f64 + 0.5) * src_w as f64) / w as f64 - 0.5;
                let x0 = (sx.floor().max(0.0) as usize).min(src_w - 1);
                let x1 = (x0 + 1).min(src_w - 1);
                let tx = sx - x0 as f64;
                let a = value_at(x0, y0) * (1.0 - tx) + value_at(x1, y0) * tx;
                let b = value_at(x0, y1) * (1.0 - tx) + value_at(x1, y1) * tx;
                let v = clamp01((a * (1.0 - ty) + b * ty) * intensity);
                if v >= threshold {
                    out.set(x, y, true);
                }
            }
        }
        out
    }
}

/// Even-odd point-in-polygon test.
#[must_use]
pub fn point_in_polygon(x: f64, y: f64, points: &[NormPoint]) -> bool {
    let mut inside = false;
    let mut j = points.len().wrapping_sub(1);
    for (i, pi) in points.iter().enumerate() {
        let pj = points[j];
        let dy = pj.y - pi.y;
        let dy = if dy == 0.0 { 1e-12 } else { dy };
        let crosses = (pi.y > y) != (pj.y > y) && x < ((pj.x - pi.x) * (y - pi.y)) / dy + pi.x;
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_box_mask_full_and_partial() {
        let full = Bitmap::from_norm_box(&NormBox::new(0.0, 0.0, 1.0, 1.0), 8, 8);
        assert_eq!(full.count_ones(), 64);

        // x in [0.25*8, 0.5*8) = [2, 4), y same
        let part = Bitmap::from_norm_box(&NormBox::new(0.25, 0.25, 0.25, 0.25), 8, 8);
        assert_eq!(part.count_ones(), 4);
        assert!(part.get(2, 2) && part.get(3, 3));
    }

    #[test]
    fn test_norm_box_mask_clamps_overflow() {
        let b = Bitmap::from_norm_box(&NormBox::new(0.75, -0.5, 1.0, 1.0), 4, 4);
        // x in [3, 4), y in [0, 2)
        assert_eq!(b.count_ones(), 2);
    }

    #[test]
    fn test_polygon_square_matches_box() {
        let square = [
            NormPoint::new(0.25, 0.25),
            NormPoint::new(0.75, 0.25),
            NormPoint::new(0.75, 0.75),
            NormPoint::new(0.25, 0.75),
        ];
        let poly = Bitmap::from_polygon(&square, 8, 8);
        let rect = Bitmap::from_norm_box(&NormBox::new(0.25, 0.25, 0.5, 0.5), 8, 8);
        assert_eq!(poly, rect);
    }

    #[test]
    fn test_polygon_needs_three_points() {
        let line = [NormPoint::new(0.0, 0.0), NormPoint::new(1.0, 1.0)];
        assert!(Bitmap::from_polygon(&line, 4, 4).is_blank());
    }

    #[test]
    fn test_point_in_triangle() {
        let tri = [
            NormPoint::new(0.0, 0.0),
            NormPoint::new(1.0, 0.0),
            NormPoint::new(0.0, 1.0),
        ];
        assert!(point_in_polygon(0.2, 0.2, &tri));
        assert!(!point_in_polygon(0.8, 0.8, &tri));
    }

    #[test]
    fn test_heatmap_threshold() {
        // Left column hot, right column cold.
        let values = [1.0, 0.0, 1.0, 0.0];
        let m = Bitmap::from_heatmap(&values, 2, 2, 4, 4, HEATMAP_THRESHOLD, 1.0);
        for y in 0..4 {
            assert!(m.get(0, y));
            assert!(m.get(1, y));
            assert!(!m.get(3, y));
        }
    }

    #[test]
    fn test_heatmap_wrong_length_is_blank() {
        let m = Bitmap::from_heatmap(&[1.0; 3], 2, 2, 4, 4, 0.35, 1.0);
        assert!(m.is_blank());
    }
}
