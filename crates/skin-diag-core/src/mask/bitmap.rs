//! Row-major binary bitmap with one byte per pixel.

use crate::domain::{PixelBox, PixelRect};

/// A `width × height` bitmap whose cells are `0` or `1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// Creates an all-zero bitmap. Zero dimensions are bumped to `1`.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Creates an all-one bitmap.
    #[must_use]
    pub fn filled(width: usize, height: usize) -> Self {
        let mut out = Self::new(width, height);
        out.data.fill(1);
        out
    }

    /// Creates an all-zero `grid × grid` bitmap.
    #[must_use]
    pub fn square(grid: usize) -> Self {
        Self::new(grid, grid)
    }

    /// Wraps raw cells, mapping every non-zero byte to `1`.
    ///
    /// Returns `None` if `data.len() != width * height`.
    #[must_use]
    pub fn from_raw(width: usize, height: usize, mut data: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return None;
        }
        for cell in &mut data {
            *cell = u8::from(*cell != 0);
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`; a bitmap has at least one cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw row-major cells.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Reads a cell; out-of-range coordinates read as unset.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data[y * self.width + x] != 0
    }

    /// Writes a cell; out-of-range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = u8::from(value);
        }
    }

    /// Sets every cell of the half-open rectangle spanned by two corners.
    ///
    /// Corners are in cell units: the low edge is floored, the high edge is
    /// ceiled, and both are clamped to the grid.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, value: bool) {
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return;
        }
        let w = self.width as f64;
        let h = self.height as f64;
        let nx0 = x0.min(x1).floor().clamp(0.0, w) as usize;
        let nx1 = x0.max(x1).ceil().clamp(0.0, w) as usize;
        let ny0 = y0.min(y1).floor().clamp(0.0, h) as usize;
        let ny1 = y0.max(y1).ceil().clamp(0.0, h) as usize;
        if nx1 <= nx0 || ny1 <= ny0 {
            return;
        }
        let v = u8::from(value);
        for y in ny0..ny1 {
            let row = y * self.width;
            self.data[row + nx0..row + nx1].fill(v);
        }
    }

    /// Number of set cells.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Whether no cell is set.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Fraction of cells that are set.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn positive_ratio(&self) -> f64 {
        self.count_ones() as f64 / self.data.len() as f64
    }

    /// Sets every cell that is set in `other` (over the common prefix).
    pub fn or_assign(&mut self, other: &Self) {
        for (dst, &src) in self.data.iter_mut().zip(&other.data) {
            if src != 0 {
                *dst = 1;
            }
        }
    }

    /// Cell-wise AND on this bitmap's grid; cells past the end of `other` read as unset.
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        let mut out = Self::new(self.width, self.height);
        for ((dst, &a), &b) in out.data.iter_mut().zip(&self.data).zip(&other.data) {
            *dst = u8::from(a != 0 && b != 0);
        }
        out
    }

    /// Cell-wise complement.
    #[must_use]
    pub fn not(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| u8::from(v == 0)).collect(),
        }
    }

    /// Count of cells set in both bitmaps.
    #[must_use]
    pub fn intersection_count(&self, other: &Self) -> usize {
        self.data
            .iter()
            .zip(&other.data)
            .filter(|(&a, &b)| a != 0 && b != 0)
            .count()
    }

    /// Count of cells set in either bitmap (over the common prefix).
    #[must_use]
    pub fn union_count(&self, other: &Self) -> usize {
        self.data
            .iter()
            .zip(&other.data)
            .filter(|(&a, &b)| a != 0 || b != 0)
            .count()
    }

    /// Inclusive bounding box of the set cells, `None` when blank.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn bounding_box(&self) -> Option<PixelBox> {
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut any = false;
        for y in 0..self.height {
            let row = &self.data[y * self.width..(y + 1) * self.width];
            for (x, &v) in row.iter().enumerate() {
                if v == 0 {
                    continue;
                }
                any = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
        any.then(|| PixelBox::new(min_x as u32, min_y as u32, max_x as u32, max_y as u32))
    }

    /// Crops `rect` out of this bitmap and resamples it to `dst_w × dst_h`
    /// by nearest neighbour, sampling at destination pixel centres.
    ///
    /// The crop origin is clamped into the bitmap and its size to at least one cell.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn crop_resample_nearest(&self, rect: PixelRect, dst_w: usize, dst_h: usize) -> Self {
        let mut out = Self::new(dst_w, dst_h);
        let x = (rect.x as usize).min(self.width - 1);
        let y = (rect.y as usize).min(self.height - 1);
        let w = (rect.w as usize).clamp(1, self.width);
        let h = (rect.h as usize).clamp(1, self.height);
        let crop_w = (x + w).min(self.width) - x;
        let crop_h = (y + h).min(self.height) - y;

        for dy in 0..out.height {
            let sy = (((dy as f64 + 0.5) * crop_h as f64) / out.height as f64).floor() as usize;
            let sy = sy.min(crop_h - 1);
            for dx in 0..out.width {
                let sx = (((dx as f64 + 0.5) * crop_w as f64) / out.width as f64).floor() as usize;
                let sx = sx.min(crop_w - 1);
                if self.get(x + sx, y + sy) {
                    out.data[dy * out.width + dx] = 1;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Construction ===

    #[test]
    fn test_new_bumps_zero_dimensions() {
        let b = Bitmap::new(0, 0);
        assert_eq!((b.width(), b.height(), b.len()), (1, 1, 1));
        assert!(b.is_blank());
    }

    #[test]
    fn test_from_raw_normalizes_and_validates() {
        let b = Bitmap::from_raw(2, 2, vec![0, 7, 255, 0]).unwrap();
        assert_eq!(b.as_slice(), &[0, 1, 1, 0]);
        assert!(Bitmap::from_raw(2, 2, vec![0; 3]).is_none());
    }

    // === Rectangles ===

    #[test]
    fn test_fill_rect_floors_and_ceils() {
        let mut b = Bitmap::new(10, 10);
        b.fill_rect(1.5, 1.2, 3.1, 2.0, true);
        // x in [1, 4), y in [1, 2)
        assert_eq!(b.count_ones(), 3);
        assert!(b.get(1, 1) && b.get(3, 1));
        assert!(!b.get(4, 1) && !b.get(1, 2));
    }

    #[test]
    fn test_fill_rect_clamps_and_ignores_empty() {
        let mut b = Bitmap::new(4, 4);
        b.fill_rect(-5.0, -5.0, 100.0, 1.0, true);
        assert_eq!(b.count_ones(), 4);
        b.fill_rect(2.0, 2.0, 2.0, 3.0, true);
        assert_eq!(b.count_ones(), 4);
        b.fill_rect(f64::NAN, 0.0, 3.0, 3.0, true);
        assert_eq!(b.count_ones(), 4);
    }

    // === Boolean ops ===

    #[test]
    fn test_boolean_ops() {
        let mut a = Bitmap::new(4, 1);
        a.set(0, 0, true);
        a.set(1, 0, true);
        let mut b = Bitmap::new(4, 1);
        b.set(1, 0, true);
        b.set(2, 0, true);

        assert_eq!(a.and(&b).as_slice(), &[0, 1, 0, 0]);
        assert_eq!(a.not().as_slice(), &[0, 0, 1, 1]);
        assert_eq!(a.intersection_count(&b), 1);
        assert_eq!(a.union_count(&b), 3);

        let mut c = a.clone();
        c.or_assign(&b);
        assert_eq!(c.as_slice(), &[1, 1, 1, 0]);
    }

    #[test]
    fn test_bounding_box() {
        let mut b = Bitmap::new(8, 8);
        assert!(b.bounding_box().is_none());
        b.set(2, 5, true);
        b.set(6, 1, true);
        assert_eq!(b.bounding_box(), Some(PixelBox::new(2, 1, 6, 5)));
    }

    #[test]
    fn test_positive_ratio() {
        let mut b = Bitmap::new(2, 2);
        b.set(0, 0, true);
        assert!((b.positive_ratio() - 0.25).abs() < f64::EPSILON);
    }

    // === Resampling ===

    #[test]
    fn test_crop_resample_nearest_upscales_block() {
        let mut src = Bitmap::new(4, 4);
        src.fill_rect(2.0, 2.0, 4.0, 4.0, true);
        let rect = PixelRect {
            x: 2,
            y: 2,
            w: 2,
            h: 2,
        };
        let out = src.crop_resample_nearest(rect, 8, 8);
        assert_eq!(out.count_ones(), 64);
    }

    #[test]
    fn test_crop_resample_nearest_clamps_rect() {
        let mut src = Bitmap::new(4, 4);
        src.set(3, 3, true);
        let rect = PixelRect {
            x: 10,
            y: 10,
            w: 50,
            h: 50,
        };
        // Origin clamps to (3, 3) and the crop becomes the single last cell.
        let out = src.crop_resample_nearest(rect, 2, 2);
        assert_eq!(out.count_ones(), 4);
    }
}
