//! Raw signal → calibrated [`IssueFinding`].

use tracing::debug;

use crate::domain::{
    Calibration, ConfidenceLabel, Evidence, IssueFinding, IssueType, Language, ProfileSummary,
    QualityGrade, QualityReport, RawSignal, RecentLog,
};
use crate::numeric::{clamp01, round3};

use super::{agreement_factor, evidence_text, CalibrationTable, SeverityThresholds};

/// Quality reasons carried into each finding's evidence.
const MAX_QUALITY_NOTES: usize = 6;

/// Everything besides the raw signal that shapes a finding.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInputs<'a> {
    /// Graded photo quality.
    pub quality: &'a QualityReport,
    /// Output language.
    pub language: Language,
    /// User goals.
    pub profile: &'a ProfileSummary,
    /// Self-reported logs, most recent first.
    pub recent_logs: &'a [RecentLog],
    /// Banding table.
    pub thresholds: &'a SeverityThresholds,
    /// Confidence recalibration table.
    pub calibration: &'a CalibrationTable,
}

/// Threshold region an issue is banded with.
#[must_use]
pub const fn threshold_region(issue: IssueType) -> &'static str {
    match issue {
        IssueType::Pores => "nose",
        _ => super::ALL_REGIONS,
    }
}

/// Bands, calibrates and annotates one raw signal.
#[must_use]
pub fn score_issue(issue: IssueType, signal: &RawSignal, inputs: &ScoringInputs<'_>) -> IssueFinding {
    let region = threshold_region(issue);
    let severity = inputs.thresholds.band(issue, region, signal.score);
    let quality_factor = inputs.quality.quality_factor;
    let agreement = agreement_factor(issue, severity.level(), inputs.profile, inputs.recent_logs);
    let calibrated = inputs.calibration.calibrate(issue, signal.model_conf);
    let confidence = clamp01(calibrated * quality_factor * agreement);

    let suppressed = inputs.quality.grade != QualityGrade::Pass || inputs.quality.white_balance_unstable();
    let evidence_short = evidence_text(
        issue,
        severity,
        confidence,
        &signal.metrics,
        inputs.language,
        suppressed,
    );

    debug!(
        issue = %issue,
        score = signal.score,
        severity = severity.level(),
        confidence,
        "issue scored"
    );

    IssueFinding {
        issue_type: issue,
        region: region.to_string(),
        severity,
        severity_level: severity.level(),
        severity_score: round3(clamp01(signal.score)),
        confidence: round3(confidence),
        confidence_label: ConfidenceLabel::from_confidence(confidence),
        calibration: Calibration {
            model_conf: round3(clamp01(signal.model_conf)),
            model_conf_calibrated: round3(clamp01(calibrated)),
            quality_factor: round3(clamp01(quality_factor)),
            agreement_factor: agreement,
        },
        evidence: Evidence {
            evidence_short,
            metrics: signal.metrics.rounded(),
            quality_notes: inputs.quality.reasons.iter().take(MAX_QUALITY_NOTES).copied().collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IssueMetrics, QualityMetrics, QualityReason, RednessMetrics, Severity};

    fn report(grade: QualityGrade, quality_factor: f64, reasons: Vec<QualityReason>) -> QualityReport {
        QualityReport {
            grade,
            quality_factor,
            reasons,
            metrics: QualityMetrics::default(),
        }
    }

    fn redness(score: f64, model_conf: f64) -> RawSignal {
        RawSignal {
            score,
            model_conf,
            metrics: IssueMetrics::Redness(RednessMetrics {
                a_shift: 1.234_56,
                red_fraction: score,
            }),
        }
    }

    fn score(issue: IssueType, signal: &RawSignal, quality: &QualityReport, logs: &[RecentLog]) -> IssueFinding {
        let profile = ProfileSummary::default();
        let thresholds = SeverityThresholds::default();
        let calibration = CalibrationTable::identity();
        let inputs = ScoringInputs {
            quality,
            language: Language::En,
            profile: &profile,
            recent_logs: logs,
            thresholds: &thresholds,
            calibration: &calibration,
        };
        score_issue(issue, signal, &inputs)
    }

    #[test]
    fn test_confidence_is_product_of_factors() {
        let q = report(QualityGrade::Pass, 0.8, vec![]);
        let logs = [RecentLog {
            acne: None,
            redness: Some(2.0),
        }];
        // 0.45 -> moderate (level 2); log 2 -> level 1; off by one -> 1.03
        let f = score(IssueType::Redness, &redness(0.45, 0.7), &q, &logs);
        assert_eq!(f.severity, Severity::Moderate);
        assert!((f.calibration.agreement_factor - 1.03).abs() < 1e-12);
        assert!((f.confidence - round3(0.7 * 0.8 * 1.03)).abs() < 1e-12);
        assert_eq!(f.confidence_label, ConfidenceLabel::SomewhatSure);
        assert_eq!(f.region, "all");
    }

    #[test]
    fn test_metrics_and_scores_are_rounded() {
        let q = report(QualityGrade::Pass, 1.0, vec![]);
        let f = score(IssueType::Redness, &redness(0.123_456, 0.5), &q, &[]);
        assert!((f.severity_score - 0.123).abs() < 1e-12);
        let IssueMetrics::Redness(m) = f.evidence.metrics else {
            panic!("unexpected metrics");
        };
        assert!((m.a_shift - 1.235).abs() < 1e-12);
        assert_eq!(f.evidence.evidence_short[0], "Redness signals: a* shift 1.235, red fraction 0.123.");
    }

    #[test]
    fn test_pores_band_with_nose_thresholds() {
        let q = report(QualityGrade::Pass, 1.0, vec![]);
        let signal = RawSignal {
            score: 0.34,
            model_conf: 0.5,
            metrics: IssueMetrics::Pores(crate::domain::PoresMetrics {
                texture_energy: 12.0,
                pore_index: 0.34,
                specular_fraction: 0.0,
            }),
        };
        let f = score(IssueType::Pores, &signal, &q, &[]);
        assert_eq!(f.region, "nose");
        assert_eq!(f.severity, Severity::None);
    }

    #[test]
    fn test_quality_notes_are_capped() {
        let reasons = vec![
            QualityReason::LowSkinCoverage,
            QualityReason::Blur,
            QualityReason::TooDark,
            QualityReason::WhiteBalanceUnstable,
            QualityReason::FrameOffCenter,
            QualityReason::TooBright,
            QualityReason::Blur,
        ];
        let q = report(QualityGrade::Degraded, 0.5, reasons);
        let f = score(IssueType::Redness, &redness(0.2, 0.5), &q, &[]);
        assert_eq!(f.evidence.quality_notes.len(), 6);
    }
}
