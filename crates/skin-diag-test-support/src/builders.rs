//! Synthetic skin photo builders for testing.

use std::io::Cursor;

use image::{imageops, ImageFormat, Rgb, RgbImage};
use skin_diag_core::ports::SourcePhoto;

/// A medium skin tone that passes the YCrCb seed test.
pub const SKIN_TONE: [u8; 3] = [200, 150, 130];

/// A redder tone that still passes the seed test.
pub const RED_TONE: [u8; 3] = [210, 130, 115];

/// A saturated blue that never passes the seed test.
pub const NON_SKIN: [u8; 3] = [20, 40, 200];

/// A rectangle in fractions of the image size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Patch {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    color: [u8; 3],
}

/// Builder for synthetic face-like photos.
///
/// The default is a full-frame, flat [`SKIN_TONE`] image; texture, red
/// patches, a non-skin border and Gaussian blur are layered on in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSkinBuilder {
    width: u32,
    height: u32,
    base: [u8; 3],
    texture_amp: u8,
    border: Option<(f64, [u8; 3])>,
    patches: Vec<Patch>,
    blur_sigma: Option<f32>,
}

impl SyntheticSkinBuilder {
    /// Starts a flat skin image.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            base: SKIN_TONE,
            texture_amp: 0,
            border: None,
            patches: Vec::new(),
            blur_sigma: None,
        }
    }

    /// A 256×256 textured face, sharp enough to pass the quality gate.
    #[must_use]
    pub fn textured_face() -> Self {
        Self::new(256, 256).texture(18)
    }

    /// Sets the base tone.
    #[must_use]
    pub const fn base(mut self, rgb: [u8; 3]) -> Self {
        self.base = rgb;
        self
    }

    /// Adds a 1-pixel checkerboard of `base ± amp`.
    #[must_use]
    pub const fn texture(mut self, amp: u8) -> Self {
        self.texture_amp = amp;
        self
    }

    /// Paints a rectangle given in fractions of the image size.
    #[must_use]
    pub fn patch(mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: [u8; 3]) -> Self {
        self.patches.push(Patch {
            x0,
            y0,
            x1,
            y1,
            color,
        });
        self
    }

    /// Paints a [`RED_TONE`] patch over the cheek band of a full-frame face.
    #[must_use]
    pub fn red_cheek_patch(self) -> Self {
        self.patch(0.15, 0.45, 0.45, 0.7, RED_TONE)
    }

    /// Surrounds the face with a non-skin border `fraction` of each side wide.
    #[must_use]
    pub const fn border(mut self, fraction: f64, color: [u8; 3]) -> Self {
        self.border = Some((fraction, color));
        self
    }

    /// Applies a Gaussian blur as the final step.
    #[must_use]
    pub const fn blur(mut self, sigma: f32) -> Self {
        self.blur_sigma = Some(sigma);
        self
    }

    /// Renders the image.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn build(&self) -> RgbImage {
        let (w, h) = (self.width, self.height);
        let amp = i16::from(self.texture_amp);
        let shade = |c: [u8; 3], x: u32, y: u32| -> Rgb<u8> {
            let delta = if (x + y) % 2 == 0 { amp } else { -amp };
            Rgb(c.map(|v| (i16::from(v) + delta).clamp(0, 255) as u8))
        };
        let inside = |p: &Patch, x: u32, y: u32| {
            let fx = (f64::from(x) + 0.5) / f64::from(w);
            let fy = (f64::from(y) + 0.5) / f64::from(h);
            fx >= p.x0 && fx < p.x1 && fy >= p.y0 && fy < p.y1
        };

        let mut img = RgbImage::from_fn(w, h, |x, y| {
            let color = self
                .patches
                .iter()
                .rev()
                .find(|p| inside(p, x, y))
                .map_or(self.base, |p| p.color);
            shade(color, x, y)
        });

        if let Some((fraction, color)) = self.border {
            let bx = (f64::from(w) * fraction).round() as u32;
            let by = (f64::from(h) * fraction).round() as u32;
            for (x, y, px) in img.enumerate_pixels_mut() {
                if x < bx || y < by || x + bx >= w || y + by >= h {
                    *px = Rgb(color);
                }
            }
        }

        match self.blur_sigma {
            Some(sigma) => imageops::blur(&img, sigma),
            None => img,
        }
    }

    /// Renders and encodes as PNG.
    ///
    /// # Panics
    ///
    /// Panics if PNG encoding fails, which only happens on allocation failure.
    #[must_use]
    pub fn png(&self) -> Vec<u8> {
        encode_png(&self.build())
    }

    /// Renders, encodes and wraps as a [`SourcePhoto`].
    #[must_use]
    pub fn photo(&self, path: &str) -> SourcePhoto {
        SourcePhoto {
            path: path.to_string(),
            bytes: self.png(),
        }
    }
}

/// Encodes an RGB image as PNG bytes.
///
/// # Panics
///
/// Panics if encoding fails.
#[must_use]
#[allow(clippy::expect_used)]
pub fn encode_png(img: &RgbImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("PNG encoding of an in-memory image");
    out.into_inner()
}
