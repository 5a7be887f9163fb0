//! Raw-signal issue detectors.
//!
//! Each detector is independent: it reads the ROI, the region boxes, the
//! Lab statistics and the quality report, and returns an uncalibrated
//! [`RawSignal`]. Severity banding and confidence calibration happen later.

mod acne;
mod dark_spots;
mod pores;
mod redness;
mod stats;

pub use acne::{AcneConfig, AcneDetector};
pub use dark_spots::DarkSpotDetector;
pub use pores::{PoresConfig, PoresDetector};
pub use redness::RednessDetector;
pub use stats::{ChannelSummary, LabStats};

use crate::domain::{IssueType, PixelBox, QualityReport, RawSignal};
use crate::imaging::AnalysisImage;
use crate::segment::{RegionBoxes, SkinRoi};

/// Everything a detector may read.
#[derive(Debug, Clone, Copy)]
pub struct DetectorContext<'a> {
    /// Analysis image.
    pub image: &'a AnalysisImage,
    /// Selected skin component.
    pub roi: &'a SkinRoi,
    /// Sub-boxes of the ROI.
    pub boxes: &'a RegionBoxes,
    /// Lab distribution of the ROI.
    pub lab: &'a LabStats,
    /// Graded quality.
    pub quality: &'a QualityReport,
}

/// A raw-signal extractor for one issue type.
pub trait IssueDetector: Send + Sync {
    /// The issue this detector scores.
    fn issue_type(&self) -> IssueType;

    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Computes the raw signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is inconsistent (for example a mask
    /// that does not match the image).
    fn detect(&self, ctx: &DetectorContext<'_>) -> anyhow::Result<RawSignal>;
}

/// The four built-in detectors with default settings.
#[must_use]
pub fn default_detectors() -> Vec<Box<dyn IssueDetector>> {
    vec![
        Box::new(AcneDetector::default()),
        Box::new(RednessDetector),
        Box::new(PoresDetector::default()),
        Box::new(DarkSpotDetector),
    ]
}

/// Inclusive column/row ranges of `b` clipped to a `width × height` image.
///
/// Returns `None` when the box lies entirely outside.
pub(crate) fn clip_box(b: PixelBox, width: usize, height: usize) -> Option<(usize, usize, usize, usize)> {
    let x0 = b.x0 as usize;
    let y0 = b.y0 as usize;
    if x0 >= width || y0 >= height {
        return None;
    }
    let x1 = (b.x1 as usize).min(width - 1);
    let y1 = (b.y1 as usize).min(height - 1);
    Some((x0, y0, x1, y1))
}

pub(crate) fn ensure_mask_matches(ctx: &DetectorContext<'_>) -> anyhow::Result<()> {
    anyhow::ensure!(
        ctx.roi.mask.len() == ctx.image.pixel_count(),
        "skin mask has {} cells but the image has {} pixels",
        ctx.roi.mask.len(),
        ctx.image.pixel_count()
    );
    Ok(())
}
