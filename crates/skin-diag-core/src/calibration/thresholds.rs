//! Severity banding: three ascending cut points per issue and region.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{IssueType, Severity};
use crate::numeric::{clamp, clamp01};

/// Three ascending cut points producing four severity bands.
pub type Triplet = [f64; 3];

/// Cut points used when neither the region nor `all` is configured.
pub const FALLBACK_TRIPLET: Triplet = [0.25, 0.5, 0.75];

/// Region key every issue falls back to.
pub const ALL_REGIONS: &str = "all";

/// Raw override shape: `issue -> region -> [t1, t2, t3]`.
///
/// Values are arbitrary caller input; they are normalised on merge.
pub type ThresholdOverrides = BTreeMap<String, BTreeMap<String, Vec<f64>>>;

/// Per-issue, per-region cut points.
///
/// Every stored triplet satisfies `0 ≤ t1 ≤ t2 ≤ t3 ≤ 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeverityThresholds {
    table: BTreeMap<IssueType, BTreeMap<String, Triplet>>,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        let mut table = BTreeMap::new();
        let mut put = |issue: IssueType, rows: &[(&str, Triplet)]| {
            table.insert(
                issue,
                rows.iter()
                    .map(|(region, t)| ((*region).to_string(), *t))
                    .collect::<BTreeMap<_, _>>(),
            );
        };
        put(IssueType::Acne, &[(ALL_REGIONS, [0.12, 0.3, 0.52])]);
        put(IssueType::Redness, &[(ALL_REGIONS, [0.18, 0.38, 0.6])]);
        put(
            IssueType::Pores,
            &[
                ("nose", [0.35, 0.6, 0.82]),
                ("cheeks", [0.3, 0.55, 0.78]),
                ("forehead", [0.28, 0.5, 0.72]),
                (ALL_REGIONS, [0.3, 0.55, 0.78]),
            ],
        );
        put(IssueType::DarkSpots, &[(ALL_REGIONS, [0.22, 0.42, 0.65])]);
        Self { table }
    }
}

impl SeverityThresholds {
    /// Merges caller overrides into the table.
    ///
    /// Unknown issue types and blank region keys are skipped. Each override
    /// is normalised against the current region triplet (or the issue's
    /// `all` triplet, or [`FALLBACK_TRIPLET`]).
    #[must_use]
    pub fn with_overrides(mut self, overrides: &ThresholdOverrides) -> Self {
        for (issue_name, regions) in overrides {
            let Some(issue) = IssueType::from_name(issue_name) else {
                tracing::warn!(issue = %issue_name, "ignoring thresholds for unknown issue type");
                continue;
            };
            let current = self.table.entry(issue).or_default();
            let fallback_all = current.get(ALL_REGIONS).copied().unwrap_or(FALLBACK_TRIPLET);
            for (region, raw) in regions {
                let region = region.trim();
                if region.is_empty() {
                    continue;
                }
                let fallback = current.get(region).copied().unwrap_or(fallback_all);
                current.insert(region.to_string(), normalize_triplet(raw, fallback));
            }
        }
        self
    }

    /// Cut points for `issue` in `region`, falling back to `all`.
    #[must_use]
    pub fn triplet(&self, issue: IssueType, region: &str) -> Triplet {
        self.table
            .get(&issue)
            .and_then(|map| map.get(region).or_else(|| map.get(ALL_REGIONS)))
            .copied()
            .unwrap_or(FALLBACK_TRIPLET)
    }

    /// Bands a raw score.
    #[must_use]
    pub fn band(&self, issue: IssueType, region: &str, score: f64) -> Severity {
        let s = clamp01(score);
        let [t1, t2, t3] = self.triplet(issue, region);
        if s < t1 {
            Severity::None
        } else if s < t2 {
            Severity::Mild
        } else if s < t3 {
            Severity::Moderate
        } else {
            Severity::Severe
        }
    }
}

/// Clamps an override into `[0,1]` and forces `t1 ≤ t2 ≤ t3`.
///
/// Fewer than three values yields `fallback` unchanged.
#[must_use]
pub fn normalize_triplet(raw: &[f64], fallback: Triplet) -> Triplet {
    let [t1, t2, t3] = match raw {
        [a, b, c, ..] => [clamp01(*a), clamp01(*b), clamp01(*c)],
        _ => return fallback,
    };
    let t2 = clamp(t2, t1, 1.0);
    let t3 = clamp(t3, t2, 1.0);
    [t1, t2, t3]
}
