//! Analysis result types.

use serde::{Deserialize, Serialize};

use super::{
    AnalysisError, FaceCrop, FailureReason, IssueFinding, IssueType, ModuleCard, NormCorners,
    PhotoFinding, QualityReport, Size, Takeaway,
};
use crate::mask::Bitmap;

/// Schema tag of [`Diagnosis`].
pub const DIAGNOSIS_SCHEMA: &str = "aurora.skin_diagnosis.v1";

/// Schema tag of [`PolicySummary`].
pub const POLICY_SCHEMA: &str = "aurora.skin_diagnosis_policy.v1";

/// Per-photo diagnosis payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Always [`DIAGNOSIS_SCHEMA`].
    pub schema_version: String,
    /// Graded photo quality.
    pub quality: QualityReport,
    /// One finding per issue type, in detector order.
    pub issues: Vec<IssueFinding>,
    /// Up to ten photo-level findings; empty when quality failed.
    pub photo_findings: Vec<PhotoFinding>,
    /// Up to ten takeaways.
    pub takeaways: Vec<Takeaway>,
    /// Up to six summary notes.
    pub notes: Vec<String>,
}

/// How much the detectors can be trusted overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// Passing photo with a confident, at least moderate top issue.
    High,
    /// Passing photo with a reasonably confident top issue.
    Medium,
    /// Everything else.
    Low,
}

/// Compact summary consumed by response policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySummary {
    /// Always [`POLICY_SCHEMA`].
    pub schema_version: String,
    /// Overall detector trust.
    pub detector_confidence_level: ConfidenceLevel,
    /// Whether any uncertainty reason applies.
    pub uncertainty: bool,
    /// `quality_<grade>`, `low_top_confidence`, `top2_close`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uncertainty_reasons: Vec<String>,
    /// Up to three issues with non-zero severity, most severe first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_issue_types: Vec<IssueType>,
}

/// Side data for building the module card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInternal {
    /// Decoded photo size before downscaling.
    pub orig_size_px: Size,
    /// Inclusive ROI bbox divided by the analysis size.
    pub skin_bbox_norm: NormCorners,
    /// Crop derived from the ROI bbox.
    pub face_crop: FaceCrop,
}

/// A successful analysis.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Diagnosis payload.
    pub diagnosis: Diagnosis,
    /// Policy summary of the diagnosis.
    pub policy: PolicySummary,
    /// Side data.
    pub internal: AnalysisInternal,
    /// ROI mask resampled into the face crop at the module grid.
    pub crop_skin_mask: Bitmap,
}

/// Outcome for one photo, as written by the output adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoReport {
    /// Where the photo came from.
    pub path: String,
    /// When it was analysed (RFC 3339).
    pub timestamp: String,
    /// Whether analysis produced a diagnosis.
    pub ok: bool,
    /// Fail-closed reason code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    /// Human-readable error chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Diagnosis payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Diagnosis>,
    /// Policy summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicySummary>,
    /// Side data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<AnalysisInternal>,
    /// Module card, when requested and the photo is usable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_card: Option<ModuleCard>,
}

impl PhotoReport {
    /// Report for a successful analysis.
    #[must_use]
    pub fn success(
        path: impl Into<String>,
        timestamp: impl Into<String>,
        analysis: Analysis,
        module_card: Option<ModuleCard>,
    ) -> Self {
        Self {
            path: path.into(),
            timestamp: timestamp.into(),
            ok: true,
            reason: None,
            error: None,
            diagnosis: Some(analysis.diagnosis),
            policy: Some(analysis.policy),
            internal: Some(analysis.internal),
            module_card,
        }
    }

    /// Report for a fail-closed analysis.
    #[must_use]
    pub fn failure(path: impl Into<String>, timestamp: impl Into<String>, err: &AnalysisError) -> Self {
        Self {
            path: path.into(),
            timestamp: timestamp.into(),
            ok: false,
            reason: Some(err.reason()),
            error: Some(error_chain(err)),
            diagnosis: None,
            policy: None,
            internal: None,
            module_card: None,
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
