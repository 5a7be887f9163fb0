//! Acne: small, red, high-gradient blobs on the cheeks.

use crate::color::rgb_to_lab;
use crate::domain::{AcneMetrics, IssueMetrics, IssueType, PixelBox, RawSignal};
use crate::numeric::clamp01;

use super::{clip_box, ensure_mask_matches, DetectorContext, IssueDetector};

/// Tuning for [`AcneDetector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcneConfig {
    /// How far above the ROI median a* a candidate must be.
    pub a_margin: f64,
    /// Minimum gradient magnitude for a candidate.
    pub min_gradient: u8,
    /// Smallest component that counts as a spot.
    pub min_area: usize,
    /// Largest component that counts as a spot.
    pub max_area: usize,
    /// Density gain: `score = clamp01(density · gain)`.
    pub density_gain: f64,
}

impl Default for AcneConfig {
    fn default() -> Self {
        Self {
            a_margin: 10.0,
            min_gradient: 35,
            min_area: 2,
            max_area: 110,
            density_gain: 520.0,
        }
    }
}

/// Counts inflamed red spots in the cheek area.
#[derive(Debug, Clone, Default)]
pub struct AcneDetector {
    config: AcneConfig,
}

impl AcneDetector {
    /// Creates a detector with custom tuning.
    #[must_use]
    pub const fn new(config: AcneConfig) -> Self {
        Self { config }
    }
}

impl IssueDetector for AcneDetector {
    fn issue_type(&self) -> IssueType {
        IssueType::Acne
    }

    fn name(&self) -> &'static str {
        "acne"
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn detect(&self, ctx: &DetectorContext<'_>) -> anyhow::Result<RawSignal> {
        ensure_mask_matches(ctx)?;
        let width = ctx.image.width();
        let height = ctx.image.height();
        let grad = gradient_magnitude(ctx.image.gray(), width, height);

        let mut candidates = vec![0u8; width * height];
        let threshold = ctx.lab.a.p50 + self.config.a_margin;
        let area = ctx.boxes.cheeks;
        if let Some((x0, y0, x1, y1)) = clip_box(area, width, height) {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let (xu, yu) = (x as u32, y as u32);
                    if ctx.boxes.exclude_eyes.contains(xu, yu) || ctx.boxes.exclude_mouth.contains(xu, yu) {
                        continue;
                    }
                    if !ctx.roi.mask.get(x, y) {
                        continue;
                    }
                    let idx = y * width + x;
                    if grad[idx] < self.config.min_gradient {
                        continue;
                    }
                    let [r, g, b] = ctx.image.rgb_at(idx);
                    if rgb_to_lab(r, g, b).a <= threshold {
                        continue;
                    }
                    candidates[idx] = 1;
                }
            }
        }

        let count = count_components(&candidates, width, height, area, self.config.min_area, self.config.max_area);
        let density = count as f64 / ctx.roi.skin_pixels.max(1) as f64;
        Ok(RawSignal {
            score: clamp01(density * self.config.density_gain),
            model_conf: clamp01(0.18 + (count as f64 / 18.0).min(1.0) * 0.65),
            metrics: IssueMetrics::Acne(AcneMetrics {
                acne_count: count as u32,
                acne_density: density,
            }),
        })
    }
}

/// `min(255, |∂x| + |∂y|)` with central differences; the border stays `0`.
pub(crate) fn gradient_magnitude(gray: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut grad = vec![0u8; width * height];
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let idx = y * width + x;
            let gx = i32::from(gray[idx + 1]).abs_diff(i32::from(gray[idx - 1]));
            let gy = i32::from(gray[idx + width]).abs_diff(i32::from(gray[idx - width]));
            grad[idx] = u8::try_from((gx + gy).min(255)).unwrap_or(u8::MAX);
        }
    }
    grad
}

/// Counts 4-connected components of set cells whose size is within
/// `[min_area, max_area]`. Growth never leaves `area`.
fn count_components(
    binary: &[u8],
    width: usize,
    height: usize,
    area: PixelBox,
    min_area: usize,
    max_area: usize,
) -> usize {
    let Some((x0, y0, x1, y1)) = clip_box(area, width, height) else {
        return 0;
    };
    let mut seen = vec![false; binary.len()];
    let mut stack = Vec::new();
    let mut count = 0;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let start = y * width + x;
            if binary[start] == 0 || seen[start] {
                continue;
            }
            seen[start] = true;
            stack.push((x, y));
            let mut size = 0usize;
            while let Some((cx, cy)) = stack.pop() {
                size += 1;
                let neighbours = [
                    (cy > y0).then(|| (cx, cy - 1)),
                    (cy < y1).then(|| (cx, cy + 1)),
                    (cx > x0).then(|| (cx - 1, cy)),
                    (cx < x1).then(|| (cx + 1, cy)),
                ];
                for (nx, ny) in neighbours.into_iter().flatten() {
                    let nb = ny * width + nx;
                    if binary[nb] != 0 && !seen[nb] {
                        seen[nb] = true;
                        stack.push((nx, ny));
                    }
                }
            }
            if (min_area..=max_area).contains(&size) {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::testing::{textured, Fixture};
    use image::Rgb;

    // === Components ===

    #[test]
    fn test_component_size_window() {
        // 6x6: a single pixel, a 2-pixel pair, and a 4-pixel square.
        let mut bin = vec![0u8; 36];
        bin[0] = 1;
        bin[3] = 1;
        bin[4] = 1;
        bin[20..22].fill(1);
        bin[26..28].fill(1);
        let all = PixelBox::new(0, 0, 5, 5);
        assert_eq!(count_components(&bin, 6, 6, all, 2, 110), 2);
        assert_eq!(count_components(&bin, 6, 6, all, 1, 3), 2);
        assert_eq!(count_components(&bin, 6, 6, all, 1, 110), 3);
    }

    #[test]
    fn test_components_stay_inside_area() {
        // A 1x4 bar, of which only the first two cells are inside the area.
        let mut bin = vec![0u8; 16];
        bin[4..8].fill(1);
        assert_eq!(count_components(&bin, 4, 4, PixelBox::new(0, 0, 1, 3), 3, 10), 0);
        assert_eq!(count_components(&bin, 4, 4, PixelBox::new(0, 0, 1, 3), 2, 10), 1);
    }

    #[test]
    fn test_gradient_is_capped() {
        let mut gray = vec![0u8; 9];
        gray[3] = 0;
        gray[5] = 255;
        gray[1] = 0;
        gray[7] = 255;
        let grad = gradient_magnitude(&gray, 3, 3);
        assert_eq!(grad[4], 255);
        assert_eq!(grad[0], 0);
    }

    // === Detector ===

    #[test]
    fn test_smooth_skin_has_no_acne() {
        let fx = Fixture::new(textured(64, 64, [160, 140, 120], 3));
        let signal = AcneDetector::default().detect(&fx.ctx()).unwrap();
        assert!(signal.score.abs() < f64::EPSILON);
        assert!((signal.model_conf - 0.18).abs() < 1e-12);
        match signal.metrics {
            IssueMetrics::Acne(m) => assert_eq!(m.acne_count, 0),
            other => panic!("unexpected metrics {other:?}"),
        }
    }

    #[test]
    fn test_red_spots_on_cheeks_are_counted() {
        let mut img = textured(64, 64, [160, 140, 120], 3);
        // Three 2x2 red spots inside the cheek band, clear of the eye and mouth boxes.
        for (sx, sy) in [(10, 36), (50, 36), (12, 44)] {
            for dy in 0..2 {
                for dx in 0..2 {
                    img.put_pixel(sx + dx, sy + dy, Rgb([150, 60, 60]));
                }
            }
        }
        let fx = Fixture::new(img);
        let signal = AcneDetector::default().detect(&fx.ctx()).unwrap();
        let IssueMetrics::Acne(m) = signal.metrics else {
            panic!("unexpected metrics");
        };
        assert_eq!(m.acne_count, 3);
        assert!(signal.score > 0.0);
        let expected_density = 3.0 / fx.roi.skin_pixels as f64;
        assert!((m.acne_density - expected_density).abs() < 1e-12);
    }
}
