//! Agreement between detector output and what the user reports.

use crate::domain::{IssueType, ProfileSummary, RecentLog};
use crate::numeric::{clamp, round3};

const MIN_FACTOR: f64 = 0.55;
const MAX_FACTOR: f64 = 1.25;

/// Maps a 0-5 self-reported level to a severity level.
fn log_level(log: f64) -> u8 {
    let log = clamp(log, 0.0, 5.0);
    if log <= 1.0 {
        0
    } else if log <= 2.0 {
        1
    } else if log <= 3.0 {
        2
    } else {
        3
    }
}

/// `(exact, off by one, further)` factors for a log comparison.
fn by_distance(detector: u8, logged: u8, factors: (f64, f64, f64)) -> f64 {
    match detector.abs_diff(logged) {
        0 => factors.0,
        1 => factors.1,
        _ => factors.2,
    }
}

/// Confidence multiplier in `[0.55, 1.25]`, rounded to three decimals.
///
/// Acne and redness compare against the latest log (`recent_logs[0]`);
/// pores and dark spots get a small boost when a goal mentions them and
/// the detector found something.
#[must_use]
pub fn agreement_factor(
    issue: IssueType,
    severity_level: u8,
    profile: &ProfileSummary,
    recent_logs: &[RecentLog],
) -> f64 {
    let latest = recent_logs.first();
    let factor = match issue {
        IssueType::Acne => latest
            .and_then(|log| log.acne)
            .map_or(1.0, |v| by_distance(severity_level, log_level(v), (1.15, 1.05, 0.78))),
        IssueType::Redness => latest
            .and_then(|log| log.redness)
            .map_or(1.0, |v| by_distance(severity_level, log_level(v), (1.12, 1.03, 0.8))),
        IssueType::Pores if severity_level > 0 && profile.has_goal_matching(&["pores"]) => 1.05,
        IssueType::DarkSpots if severity_level > 0 && profile.has_goal_matching(&["dark", "spot", "pigment"]) => 1.03,
        IssueType::Pores | IssueType::DarkSpots => 1.0,
    };
    round3(clamp(factor, MIN_FACTOR, MAX_FACTOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(acne: Option<f64>, redness: Option<f64>) -> Vec<RecentLog> {
        vec![RecentLog { acne, redness }]
    }

    #[test]
    fn test_log_buckets() {
        assert_eq!(log_level(-3.0), 0);
        assert_eq!(log_level(1.0), 0);
        assert_eq!(log_level(1.5), 1);
        assert_eq!(log_level(2.0), 1);
        assert_eq!(log_level(3.0), 2);
        assert_eq!(log_level(9.0), 3);
    }

    #[test]
    fn test_acne_agreement() {
        let p = ProfileSummary::default();
        assert!((agreement_factor(IssueType::Acne, 2, &p, &log(Some(3.0), None)) - 1.15).abs() < 1e-12);
        assert!((agreement_factor(IssueType::Acne, 1, &p, &log(Some(3.0), None)) - 1.05).abs() < 1e-12);
        assert!((agreement_factor(IssueType::Acne, 0, &p, &log(Some(5.0), None)) - 0.78).abs() < 1e-12);
    }

    #[test]
    fn test_redness_agreement() {
        let p = ProfileSummary::default();
        assert!((agreement_factor(IssueType::Redness, 0, &p, &log(None, Some(0.0))) - 1.12).abs() < 1e-12);
        assert!((agreement_factor(IssueType::Redness, 3, &p, &log(None, Some(2.5))) - 1.03).abs() < 1e-12);
        assert!((agreement_factor(IssueType::Redness, 3, &p, &log(None, Some(0.5))) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_only_latest_log_counts() {
        let p = ProfileSummary::default();
        let logs = vec![
            RecentLog { acne: None, redness: None },
            RecentLog { acne: Some(5.0), redness: None },
        ];
        assert!((agreement_factor(IssueType::Acne, 0, &p, &logs) - 1.0).abs() < f64::EPSILON);
        assert!((agreement_factor(IssueType::Acne, 0, &p, &[]) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_goal_boosts() {
        let p = ProfileSummary {
            goals: vec!["Minimize PORES".into(), "fade pigmentation".into()],
        };
        assert!((agreement_factor(IssueType::Pores, 1, &p, &[]) - 1.05).abs() < 1e-12);
        assert!((agreement_factor(IssueType::Pores, 0, &p, &[]) - 1.0).abs() < 1e-12);
        assert!((agreement_factor(IssueType::DarkSpots, 2, &p, &[]) - 1.03).abs() < 1e-12);
        let none = ProfileSummary::default();
        assert!((agreement_factor(IssueType::DarkSpots, 2, &none, &[]) - 1.0).abs() < 1e-12);
    }
}
