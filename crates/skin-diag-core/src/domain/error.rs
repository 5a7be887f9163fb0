//! Fail-closed analysis errors and their wire reason codes.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason code reported when an analysis stops without a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Missing or truncated image bytes.
    NoImage,
    /// The bytes could not be decoded as an image.
    DecodeFailed,
    /// No skin-coloured component was found.
    SkinRoiNotFound,
    /// Skin components exist but none is large enough.
    SkinRoiTooSmall,
    /// Quality measurement could not run.
    QualityFailed,
    /// A detector returned an error.
    DetectorFailed,
    /// Scoring or calibration could not complete.
    PostprocessFailed,
}

impl FailureReason {
    /// Wire name of the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoImage => "no_image",
            Self::DecodeFailed => "decode_failed",
            Self::SkinRoiNotFound => "skin_roi_not_found",
            Self::SkinRoiTooSmall => "skin_roi_too_small",
            Self::QualityFailed => "quality_failed",
            Self::DetectorFailed => "detector_failed",
            Self::PostprocessFailed => "postprocess_failed",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the skin ROI segmenter found nothing usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SegmentError {
    /// No pixel passed the chroma seed test.
    #[error("no skin-coloured component in the image")]
    NotFound,
    /// The largest component is below the acceptance size.
    #[error("largest skin component has {largest} pixels, need at least {required}")]
    TooSmall {
        /// Size of the largest component.
        largest: usize,
        /// Minimum accepted size.
        required: usize,
    },
}

/// Errors that stop an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input shorter than the minimum plausible image.
    #[error("image payload too small ({len} bytes)")]
    NoImage {
        /// Payload length.
        len: usize,
    },
    /// The image could not be decoded.
    #[error("failed to decode image")]
    Decode(#[from] image::ImageError),
    /// The decoded image has no pixels.
    #[error("decoded image is empty")]
    EmptyImage,
    /// Segmentation failed.
    #[error(transparent)]
    Segment(#[from] SegmentError),
    /// Quality measurement could not run.
    #[error("quality measurement failed: {0}")]
    Quality(String),
    /// A detector failed.
    #[error("detector '{name}' failed")]
    Detector {
        /// Detector name.
        name: &'static str,
        /// Underlying error.
        #[source]
        source: anyhow::Error,
    },
    /// Scoring or calibration could not complete.
    #[error("postprocess failed: {0}")]
    Postprocess(String),
}

impl AnalysisError {
    /// Wire reason code for this error.
    #[must_use]
    pub const fn reason(&self) -> FailureReason {
        match self {
            Self::NoImage { .. } => FailureReason::NoImage,
            Self::Decode(_) | Self::EmptyImage => FailureReason::DecodeFailed,
            Self::Segment(SegmentError::NotFound) => FailureReason::SkinRoiNotFound,
            Self::Segment(SegmentError::TooSmall { .. }) => FailureReason::SkinRoiTooSmall,
            Self::Quality(_) => FailureReason::QualityFailed,
            Self::Detector { .. } => FailureReason::DetectorFailed,
            Self::Postprocess(_) => FailureReason::PostprocessFailed,
        }
    }
}
