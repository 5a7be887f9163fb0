//! Severity banding and confidence calibration.
//!
//! Turns a detector's [`RawSignal`](crate::domain::RawSignal) into an
//! [`IssueFinding`](crate::domain::IssueFinding): band the score, recalibrate
//! the detector confidence, then scale it by photo quality and by agreement
//! with the user's own logs.

mod agreement;
mod confidence;
mod evidence;
mod scoring;
mod thresholds;

pub use agreement::agreement_factor;
pub use confidence::{isotonic, temperature_scale, CalibrationMethod, CalibrationTable};
pub use evidence::evidence_text;
pub use scoring::{score_issue, threshold_region, ScoringInputs};
pub use thresholds::{
    normalize_triplet, SeverityThresholds, ThresholdOverrides, Triplet, ALL_REGIONS,
    FALLBACK_TRIPLET,
};
