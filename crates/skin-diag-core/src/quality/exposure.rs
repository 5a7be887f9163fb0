//! Exposure and white-balance statistics over the skin ROI.

use crate::imaging::AnalysisImage;
use crate::mask::Bitmap;
use crate::numeric::clamp01;

/// Mean skin luma that maps to a perfect exposure factor.
const TARGET_LUMA: f64 = 135.0;

/// Luma and colour moments of the skin pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinToneStats {
    /// Mean rounded luma.
    pub mean_luma: f64,
    /// Population standard deviation of rounded luma.
    pub luma_std: f64,
    /// Mean red channel.
    pub mean_r: f64,
    /// Mean green channel.
    pub mean_g: f64,
    /// Mean blue channel.
    pub mean_b: f64,
}

impl SkinToneStats {
    /// Accumulates over the set cells of `mask`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn measure(image: &AnalysisImage, mask: &Bitmap) -> Self {
        let gray = image.gray();
        let mut n = 0u64;
        let (mut sum_y, mut sum_y2) = (0f64, 0f64);
        let (mut sum_r, mut sum_g, mut sum_b) = (0f64, 0f64, 0f64);
        for (idx, &cell) in mask.as_slice().iter().enumerate() {
            if cell == 0 {
                continue;
            }
            let y = f64::from(gray[idx]);
            let [r, g, b] = image.rgb_at(idx);
            n += 1;
            sum_y += y;
            sum_y2 += y * y;
            sum_r += f64::from(r);
            sum_g += f64::from(g);
            sum_b += f64::from(b);
        }
        if n == 0 {
            return Self {
                mean_luma: 0.0,
                luma_std: 0.0,
                mean_r: 0.0,
                mean_g: 0.0,
                mean_b: 0.0,
            };
        }
        let n = n as f64;
        let mean_luma = sum_y / n;
        let variance = (sum_y2 / n - mean_luma * mean_luma).max(0.0);
        Self {
            mean_luma,
            luma_std: variance.sqrt(),
            mean_r: sum_r / n,
            mean_g: sum_g / n,
            mean_b: sum_b / n,
        }
    }

    /// `max(|R/G - 1|, |B/G - 1|)`, with neutral ratios when green is zero.
    #[must_use]
    pub fn white_balance_cast(&self) -> f64 {
        let (rg, bg) = if self.mean_g > 0.0 {
            (self.mean_r / self.mean_g, self.mean_b / self.mean_g)
        } else {
            (1.0, 1.0)
        };
        (rg - 1.0).abs().max((bg - 1.0).abs())
    }

    /// `1` at the target luma, falling linearly to `0` 110 levels away.
    #[must_use]
    pub fn exposure_factor(&self) -> f64 {
        clamp01(1.0 - (self.mean_luma - TARGET_LUMA).abs() / 110.0)
    }

    /// `1` for a neutral cast, `0` at a cast of 0.45 or more.
    #[must_use]
    pub fn white_balance_factor(&self) -> f64 {
        clamp01(1.0 - self.white_balance_cast() / 0.45)
    }
}
