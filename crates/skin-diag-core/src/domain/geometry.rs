//! Geometry value types shared by the segmenter, region sanitizer and module builder.

use serde::{Deserialize, Serialize};

/// A box in normalized `[0,1]` coordinates, origin + extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl NormBox {
    /// Creates a box from origin and extent.
    #[must_use]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge.
    #[must_use]
    pub fn x1(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge.
    #[must_use]
    pub fn y1(&self) -> f64 {
        self.y + self.h
    }

    /// Scales the box about its centre. Factors outside `(0, 1]` leave it unchanged.
    #[must_use]
    pub fn shrink(&self, factor: f64) -> Self {
        if !factor.is_finite() || factor <= 0.0 || factor >= 1.0 {
            return *self;
        }
        let cx = self.x + self.w / 2.0;
        let cy = self.y + self.h / 2.0;
        let w = self.w * factor;
        let h = self.h * factor;
        Self::new(cx - w / 2.0, cy - h / 2.0, w, h)
    }

    /// Corners of the box in clockwise order starting top-left.
    #[must_use]
    pub fn to_polygon(&self) -> [NormPoint; 4] {
        [
            NormPoint::new(self.x, self.y),
            NormPoint::new(self.x1(), self.y),
            NormPoint::new(self.x1(), self.y1()),
            NormPoint::new(self.x, self.y1()),
        ]
    }
}

/// A box in normalized coordinates given by its two corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormCorners {
    /// Left edge.
    pub x0: f64,
    /// Top edge.
    pub y0: f64,
    /// Right edge.
    pub x1: f64,
    /// Bottom edge.
    pub y1: f64,
}

impl NormCorners {
    /// Creates corners, swapping as needed so `x0 <= x1` and `y0 <= y1`.
    #[must_use]
    pub fn ordered(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Converts to origin + extent form.
    #[must_use]
    pub fn to_box(&self) -> NormBox {
        let ordered = Self::ordered(self.x0, self.y0, self.x1, self.y1);
        NormBox::new(
            ordered.x0,
            ordered.y0,
            ordered.x1 - ordered.x0,
            ordered.y1 - ordered.y0,
        )
    }

    /// Whether all four coordinates are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }
}

/// A point in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormPoint {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl NormPoint {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An inclusive pixel rectangle `[x0, x1] × [y0, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    /// Leftmost column.
    pub x0: u32,
    /// Topmost row.
    pub y0: u32,
    /// Rightmost column (inclusive).
    pub x1: u32,
    /// Bottom row (inclusive).
    pub y1: u32,
}

impl PixelBox {
    /// Creates an inclusive box, ordering the corners.
    #[must_use]
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Whether `(x, y)` lies inside the box, edges included.
    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Number of columns covered.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    /// Number of rows covered.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.y1 - self.y0 + 1
    }

    /// Normalizes by the image size (`x / width`), clamped to `[0,1]`.
    #[must_use]
    pub fn to_norm(&self, width: u32, height: u32) -> NormCorners {
        let w = f64::from(width.max(1));
        let h = f64::from(height.max(1));
        NormCorners::ordered(
            crate::numeric::clamp01(f64::from(self.x0) / w),
            crate::numeric::clamp01(f64::from(self.y0) / h),
            crate::numeric::clamp01(f64::from(self.x1) / w),
            crate::numeric::clamp01(f64::from(self.y1) / h),
        )
    }
}

/// A pixel rectangle given by origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
}

impl Size {
    /// Creates a size.
    #[must_use]
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}
