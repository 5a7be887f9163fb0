//! Dark spots: lightness drop below the median plus a b* hue cast.
//!
//! The signal is only trusted on a passing photo with stable white
//! balance. Otherwise the score is forced to zero with a floor confidence.

use crate::domain::{DarkSpotMetrics, IssueMetrics, IssueType, QualityGrade, RawSignal};
use crate::numeric::clamp01;

use super::{DetectorContext, IssueDetector};

/// Confidence reported when the lighting makes the signal unusable.
const SUPPRESSED_CONFIDENCE: f64 = 0.1;

/// Scores pigmentation and uneven tone.
#[derive(Debug, Clone, Copy, Default)]
pub struct DarkSpotDetector;

impl IssueDetector for DarkSpotDetector {
    fn issue_type(&self) -> IssueType {
        IssueType::DarkSpots
    }

    fn name(&self) -> &'static str {
        "dark_spots"
    }

    fn detect(&self, ctx: &DetectorContext<'_>) -> anyhow::Result<RawSignal> {
        let l = ctx.lab.l;
        let luma_drop = l.p50 - l.p10;
        let drop = clamp01((luma_drop - 2.0) / 16.0);
        let hue_shift = clamp01(ctx.lab.b.mean.abs() / 35.0);
        let raw = clamp01(drop * 0.85 + hue_shift * 0.15);

        let trusted = ctx.quality.grade == QualityGrade::Pass && !ctx.quality.white_balance_unstable();
        let (score, model_conf) = if trusted {
            (raw, clamp01(0.15 + raw * 0.55))
        } else {
            (0.0, SUPPRESSED_CONFIDENCE)
        };
        Ok(RawSignal {
            score,
            model_conf,
            metrics: IssueMetrics::DarkSpots(DarkSpotMetrics { luma_drop, hue_shift }),
        })
    }
}
