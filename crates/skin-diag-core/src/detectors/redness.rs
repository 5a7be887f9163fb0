//! Redness: spread and right skew of the a* channel.

use crate::domain::{IssueMetrics, IssueType, RawSignal, RednessMetrics};
use crate::numeric::clamp01;

use super::{DetectorContext, IssueDetector};

/// a* standard deviation treated as fully spread.
const A_STD_SPAN: f64 = 22.0;

/// Scores diffuse redness from the ROI a* distribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct RednessDetector;

impl IssueDetector for RednessDetector {
    fn issue_type(&self) -> IssueType {
        IssueType::Redness
    }

    fn name(&self) -> &'static str {
        "redness"
    }

    fn detect(&self, ctx: &DetectorContext<'_>) -> anyhow::Result<RawSignal> {
        let a = ctx.lab.a;
        let shift = a.mean - a.p50;
        let spread = if a.std > 0.0 { a.std / A_STD_SPAN } else { 0.0 };
        let red_fraction = clamp01(spread * 0.35 + clamp01(shift / 10.0) * 0.55);
        Ok(RawSignal {
            score: red_fraction,
            model_conf: clamp01(0.22 + clamp01(a.std / A_STD_SPAN) * 0.55),
            metrics: IssueMetrics::Redness(RednessMetrics {
                a_shift: shift,
                red_fraction,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::testing::{textured, Fixture};
    use crate::detectors::{ChannelSummary, LabStats};

    fn signal_for(a: ChannelSummary) -> RawSignal {
        let mut fx = Fixture::new(textured(32, 32, [160, 140, 120], 3));
        fx.lab = LabStats { a, ..fx.lab };
        RednessDetector.detect(&fx.ctx()).unwrap()
    }

    #[test]
    fn test_symmetric_a_star() {
        let s = signal_for(ChannelSummary {
            mean: 10.0,
            p50: 10.0,
            std: 11.0,
            ..ChannelSummary::default()
        });
        // 0.5 * 0.35
        assert!((s.score - 0.175).abs() < 1e-12);
        assert!((s.model_conf - (0.22 + 0.5 * 0.55)).abs() < 1e-12);
    }

    #[test]
    fn test_right_skew_raises_score() {
        let s = signal_for(ChannelSummary {
            mean: 15.0,
            p50: 10.0,
            std: 0.0,
            ..ChannelSummary::default()
        });
        assert!((s.score - 0.275).abs() < 1e-12);
        assert!((s.model_conf - 0.22).abs() < 1e-12);
        let IssueMetrics::Redness(m) = s.metrics else {
            panic!("unexpected metrics");
        };
        assert!((m.a_shift - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_saturates() {
        let s = signal_for(ChannelSummary {
            mean: 40.0,
            p50: 10.0,
            std: 80.0,
            ..ChannelSummary::default()
        });
        assert!((s.score - 1.0).abs() < f64::EPSILON);
        assert!((s.model_conf - 0.77).abs() < 1e-12);
    }
}
