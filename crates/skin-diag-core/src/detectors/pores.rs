//! Pores: Laplacian texture on the nose and cheeks, discounted for shine.

use crate::color::{luma, saturation};
use crate::domain::{IssueMetrics, IssueType, PixelBox, PoresMetrics, RawSignal};
use crate::imaging::AnalysisImage;
use crate::mask::Bitmap;
use crate::numeric::clamp01;
use crate::quality::laplacian_abs;

use super::{clip_box, ensure_mask_matches, DetectorContext, IssueDetector};

/// Tuning for [`PoresDetector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoresConfig {
    /// Texture energy that maps to a zero pore index.
    pub energy_floor: f64,
    /// Energy span from zero to a full pore index.
    pub energy_span: f64,
    /// Specular fraction below which no shine penalty applies.
    pub specular_floor: f64,
    /// Specular span from no penalty to the full penalty.
    pub specular_span: f64,
}

impl Default for PoresConfig {
    fn default() -> Self {
        Self {
            energy_floor: 6.0,
            energy_span: 18.0,
            specular_floor: 0.06,
            specular_span: 0.22,
        }
    }
}

/// Scores visible pores and texture.
#[derive(Debug, Clone, Default)]
pub struct PoresDetector {
    config: PoresConfig,
}

impl PoresDetector {
    /// Creates a detector with custom tuning.
    #[must_use]
    pub const fn new(config: PoresConfig) -> Self {
        Self { config }
    }
}

impl IssueDetector for PoresDetector {
    fn issue_type(&self) -> IssueType {
        IssueType::Pores
    }

    fn name(&self) -> &'static str {
        "pores"
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn detect(&self, ctx: &DetectorContext<'_>) -> anyhow::Result<RawSignal> {
        ensure_mask_matches(ctx)?;
        let width = ctx.image.width();
        let height = ctx.image.height();
        let gray = ctx.image.gray();
        let full = ctx.boxes.full;
        let nose = ctx.boxes.nose;
        let cheeks = ctx.boxes.cheeks;

        let (mut nose_sum, mut nose_n) = (0u64, 0u64);
        let (mut cheek_sum, mut cheek_n) = (0u64, 0u64);
        let x_end = (full.x1 as usize).min(width.saturating_sub(1));
        let y_end = (full.y1 as usize).min(height.saturating_sub(1));
        for y in (full.y0 as usize + 1)..y_end {
            for x in (full.x0 as usize + 1)..x_end {
                if !ctx.roi.mask.get(x, y) {
                    continue;
                }
                let lap = u64::from(laplacian_abs(gray, width, y * width + x));
                let (xu, yu) = (x as u32, y as u32);
                if nose.contains(xu, yu) {
                    nose_sum += lap;
                    nose_n += 1;
                } else if cheeks.contains(xu, yu) {
                    cheek_sum += lap;
                    cheek_n += 1;
                }
            }
        }
        let mean = |sum: u64, n: u64| if n == 0 { 0.0 } else { sum as f64 / n as f64 };
        let texture_energy = (mean(nose_sum, nose_n) + mean(cheek_sum, cheek_n)) / 2.0;

        let specular_fraction = specular_fraction(ctx.image, &ctx.roi.mask, nose);
        let c = self.config;
        let shine_penalty = clamp01((specular_fraction - c.specular_floor) / c.specular_span);
        let pore_index =
            clamp01((texture_energy - c.energy_floor) / c.energy_span) * (1.0 - 0.65 * shine_penalty);

        Ok(RawSignal {
            score: pore_index,
            model_conf: clamp01(0.22 + pore_index * 0.65) * (1.0 - 0.55 * shine_penalty),
            metrics: IssueMetrics::Pores(PoresMetrics {
                texture_energy,
                pore_index,
                specular_fraction,
            }),
        })
    }
}

/// Fraction of skin pixels in `area` that are bright (`luma > 215`) and
/// nearly unsaturated (`sat < 0.12`).
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn specular_fraction(image: &AnalysisImage, mask: &Bitmap, area: PixelBox) -> f64 {
    let Some((x0, y0, x1, y1)) = clip_box(area, image.width(), image.height()) else {
        return 0.0;
    };
    let (mut n, mut specular) = (0usize, 0usize);
    for y in y0..=y1 {
        for x in x0..=x1 {
            if !mask.get(x, y) {
                continue;
            }
            let [r, g, b] = image.rgb_at(y * image.width() + x);
            n += 1;
            if luma(r, g, b) > 215.0 && saturation(r, g, b) < 0.12 {
                specular += 1;
            }
        }
    }
    if n == 0 {
        0.0
    } else {
        specular as f64 / n as f64
    }
}
