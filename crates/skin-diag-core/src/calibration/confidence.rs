//! Detector self-confidence recalibration.
//!
//! A [`CalibrationTable`] maps issue names to a method. It is an explicit,
//! immutable value: load it once and share it by reference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::IssueType;
use crate::numeric::clamp01;

const LOGIT_EPS: f64 = 1e-6;

/// How one issue's confidence is recalibrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CalibrationMethod {
    /// `sigmoid(logit(p) / T)`.
    Temperature {
        /// Temperature; non-positive or missing means `1`.
        #[serde(default)]
        temperature: Option<f64>,
    },
    /// Piecewise-linear interpolation over `(x, y)` control points, flat
    /// beyond the first and last point.
    Isotonic {
        /// Control points; entries with fewer than two values are ignored.
        #[serde(default)]
        points: Vec<Vec<f64>>,
    },
}

impl CalibrationMethod {
    /// Applies the method to a probability.
    #[must_use]
    pub fn apply(&self, p: f64) -> f64 {
        match self {
            Self::Temperature { temperature } => temperature_scale(p, temperature.unwrap_or(1.0)),
            Self::Isotonic { points } => isotonic(p, points),
        }
    }
}

/// Per-issue calibration methods. Issues without an entry pass through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    /// Keyed by issue wire name; unknown names are kept but never used.
    #[serde(default)]
    pub issues: BTreeMap<String, CalibrationMethod>,
}

impl CalibrationTable {
    /// The identity table.
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Recalibrates `model_conf` for `issue`; the input is clamped to `[0,1]` first.
    #[must_use]
    pub fn calibrate(&self, issue: IssueType, model_conf: f64) -> f64 {
        let p = clamp01(model_conf);
        self.issues.get(issue.as_str()).map_or(p, |method| method.apply(p))
    }
}

fn logit(p: f64) -> f64 {
    let p = clamp01(p).clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    (p / (1.0 - p)).ln()
}

fn sigmoid(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.5;
    }
    1.0 / (1.0 + (-x).exp())
}

/// Temperature scaling in logit space.
#[must_use]
pub fn temperature_scale(p: f64, temperature: f64) -> f64 {
    let t = if temperature.is_finite() && temperature > 0.0 {
        temperature
    } else {
        1.0
    };
    sigmoid(logit(p) / t)
}

/// Clamped piecewise-linear interpolation. No usable points returns `p`.
#[must_use]
pub fn isotonic(p: f64, points: &[Vec<f64>]) -> f64 {
    let x = clamp01(p);
    let mut pts: Vec<(f64, f64)> = points
        .iter()
        .filter_map(|pt| match pt.as_slice() {
            [px, py, ..] => Some((clamp01(*px), clamp01(*py))),
            _ => None,
        })
        .collect();
    pts.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (Some(&first), Some(&last)) = (pts.first(), pts.last()) else {
        return x;
    };
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    for pair in pts.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        if x >= x0 && x <= x1 {
            let t = if x1 > x0 { (x - x0) / (x1 - x0) } else { 0.0 };
            return y0 + t * (y1 - y0);
        }
    }
    x
}
