//! CIE Lab distribution of the skin ROI.

use crate::color::rgb_to_lab;
use crate::imaging::AnalysisImage;
use crate::mask::Bitmap;
use crate::numeric::{median_sorted, percentile_sorted};

/// Samples kept unconditionally.
const SAMPLE_SOFT_CAP: usize = 24_000;
/// Samples kept at most; past the soft cap only every third pixel is taken.
const SAMPLE_HARD_CAP: usize = 42_000;

/// Summary of one Lab channel. All fields are `0` for an empty sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelSummary {
    /// Arithmetic mean.
    pub mean: f64,
    /// 10th percentile (nearest rank).
    pub p10: f64,
    /// Median.
    pub p50: f64,
    /// 90th percentile (nearest rank).
    pub p90: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl ChannelSummary {
    #[allow(clippy::cast_precision_loss)]
    fn from_samples(mut samples: Vec<f64>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        samples.sort_by(f64::total_cmp);
        Self {
            mean,
            p10: percentile_sorted(&samples, 0.1).unwrap_or(0.0),
            p50: median_sorted(&samples).unwrap_or(0.0),
            p90: percentile_sorted(&samples, 0.9).unwrap_or(0.0),
            std: var.sqrt(),
        }
    }
}

/// Lab summaries over the skin ROI.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LabStats {
    /// Lightness.
    pub l: ChannelSummary,
    /// Green-red axis.
    pub a: ChannelSummary,
    /// Blue-yellow axis.
    pub b: ChannelSummary,
    /// Number of pixels sampled.
    pub samples: usize,
}

impl LabStats {
    /// Samples skin pixels in row-major order and summarises each channel.
    #[must_use]
    pub fn measure(image: &AnalysisImage, mask: &Bitmap) -> Self {
        let mut l = Vec::new();
        let mut a = Vec::new();
        let mut b = Vec::new();
        for (idx, &cell) in mask.as_slice().iter().enumerate() {
            if cell == 0 {
                continue;
            }
            let taken = l.len();
            if taken >= SAMPLE_SOFT_CAP && !(idx % 3 == 0 && taken < SAMPLE_HARD_CAP) {
                continue;
            }
            let [r, g, bl] = image.rgb_at(idx);
            let lab = rgb_to_lab(r, g, bl);
            l.push(lab.l);
            a.push(lab.a);
            b.push(lab.b);
        }
        let samples = l.len();
        Self {
            l: ChannelSummary::from_samples(l),
            a: ChannelSummary::from_samples(a),
            b: ChannelSummary::from_samples(b),
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Size;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_uniform_has_no_spread() {
        let img = RgbImage::from_pixel(10, 10, Rgb([160, 140, 120]));
        let image = AnalysisImage::from_rgb(img, Size::new(10, 10));
        let stats = LabStats::measure(&image, &Bitmap::filled(10, 10));
        assert_eq!(stats.samples, 100);
        assert!(stats.a.std.abs() < 1e-9);
        assert!((stats.a.mean - stats.a.p50).abs() < 1e-9);
        assert!(stats.a.mean > 0.0);
        assert!(stats.l.p10 <= stats.l.p90);
    }

    #[test]
    fn test_sample_cap_applies() {
        // 200 x 200 = 40k skin pixels: 24k unconditional, then every third index.
        let img = RgbImage::from_pixel(200, 200, Rgb([160, 140, 120]));
        let image = AnalysisImage::from_rgb(img, Size::new(200, 200));
        let stats = LabStats::measure(&image, &Bitmap::filled(200, 200));
        let tail = (24_000..40_000).filter(|i| i % 3 == 0).count();
        assert_eq!(stats.samples, 24_000 + tail);
    }

    #[test]
    fn test_empty_mask_is_zeroed() {
        let img = RgbImage::from_pixel(4, 4, Rgb([160, 140, 120]));
        let image = AnalysisImage::from_rgb(img, Size::new(4, 4));
        let stats = LabStats::measure(&image, &Bitmap::new(4, 4));
        assert_eq!(stats, LabStats::default());
    }

    #[test]
    fn test_summary_percentiles() {
        let s = ChannelSummary::from_samples((0..11).map(f64::from).collect());
        assert!((s.p10 - 1.0).abs() < f64::EPSILON);
        assert!((s.p50 - 5.0).abs() < f64::EPSILON);
        assert!((s.p90 - 9.0).abs() < f64::EPSILON);
        assert!((s.mean - 5.0).abs() < f64::EPSILON);
    }
}
