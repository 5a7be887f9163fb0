//! Color-space conversions used by segmentation and the detectors.
//!
//! Everything operates on 8-bit sRGB input. Lab conversion goes through a
//! 256-entry linearisation table so results are identical across platforms.

use once_cell::sync::Lazy;

/// sRGB → linear-light lookup, indexed by the 8-bit channel value.
///
/// Stored at single precision so every platform reads the same table.
#[allow(clippy::cast_possible_truncation)]
static SRGB_TO_LINEAR: Lazy<[f32; 256]> = Lazy::new(|| {
    let mut table = [0.0f32; 256];
    for value in 0..=u8::MAX {
        let c = f64::from(value) / 255.0;
        let linear = if c <= 0.040_45 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        };
        table[usize::from(value)] = linear as f32;
    }
    table
});

/// D65 reference white.
const WHITE_X: f64 = 0.950_47;
const WHITE_Z: f64 = 1.088_83;

/// A pixel in YCrCb space (offset chroma, 128 = neutral).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YCrCb {
    /// Luma.
    pub y: f64,
    /// Red-difference chroma.
    pub cr: f64,
    /// Blue-difference chroma.
    pub cb: f64,
}

/// A pixel in CIE L*a*b*.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    /// Lightness, 0..100.
    pub l: f64,
    /// Green (−) to red (+).
    pub a: f64,
    /// Blue (−) to yellow (+).
    pub b: f64,
}

/// Linearised value of an 8-bit sRGB channel.
#[must_use]
pub fn srgb_to_linear(value: u8) -> f64 {
    f64::from(SRGB_TO_LINEAR[usize::from(value)])
}

/// Rec. 601 luma.
#[allow(clippy::suboptimal_flops)]
#[must_use]
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)
}

/// Luma rounded to the nearest 8-bit level.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    luma(r, g, b).round().clamp(0.0, 255.0) as u8
}

/// Converts 8-bit RGB to YCrCb.
#[allow(clippy::suboptimal_flops)]
#[must_use]
pub fn rgb_to_ycrcb(r: u8, g: u8, b: u8) -> YCrCb {
    let y = luma(r, g, b);
    YCrCb {
        y,
        cr: (f64::from(r) - y) * 0.713 + 128.0,
        cb: (f64::from(b) - y) * 0.564 + 128.0,
    }
}

/// Converts 8-bit sRGB to CIE Lab (D65).
#[allow(clippy::suboptimal_flops)]
#[must_use]
pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> Lab {
    let r = srgb_to_linear(r);
    let g = srgb_to_linear(g);
    let b = srgb_to_linear(b);

    let x = (r * 0.4124 + g * 0.3576 + b * 0.1805) / WHITE_X;
    let y = r * 0.2126 + g * 0.7152 + b * 0.0722;
    let z = (r * 0.0193 + g * 0.1192 + b * 0.9505) / WHITE_Z;

    let fx = lab_f(x);
    let fy = lab_f(y);
    let fz = lab_f(z);

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

#[allow(clippy::suboptimal_flops)]
fn lab_f(t: f64) -> f64 {
    if t > 0.008_856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

/// HSV-style saturation `(max - min) / max`, `0` for black.
#[must_use]
pub fn saturation(r: u8, g: u8, b: u8) -> f64 {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == 0 {
        return 0.0;
    }
    f64::from(max - min) / f64::from(max)
}
