//! The end-to-end photo analysis pipeline.
//!
//! bytes → decode → skin ROI → quality gate → detectors → calibration →
//! photo findings, takeaways and the policy summary. Everything after
//! decoding is pure pixel math; the analyzer holds only read-only
//! configuration and can be shared across threads.

use tracing::{debug, info};

use crate::calibration::{score_issue, CalibrationTable, ScoringInputs, SeverityThresholds, ThresholdOverrides};
use crate::detectors::{default_detectors, DetectorContext, IssueDetector, LabStats};
use crate::domain::{
    Analysis, AnalysisError, AnalysisInternal, Diagnosis, FaceCrop, Language, ModuleCard,
    PixelRect, ProfileSummary, RecentLog, Size, DEFAULT_MARGIN_SCALE, DIAGNOSIS_SCHEMA,
};
use crate::findings::{build_photo_findings, summarize_for_policy, summary_notes, CropProjection};
use crate::imaging::AnalysisImage;
use crate::modules::{build_modules, ModuleMaskConfig};
use crate::quality::{assess_quality, QualityGateConfig};
use crate::segment::{segment_skin, RegionBoxes};

/// Most photo findings kept in a diagnosis.
pub const MAX_PHOTO_FINDINGS: usize = 10;

/// Most takeaways kept in a diagnosis.
pub const MAX_TAKEAWAYS: usize = 10;

/// Caller context and configuration for an analyzer.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Output language for generated text.
    pub language: Language,
    /// User goals, read by the agreement factor.
    pub profile: ProfileSummary,
    /// Self-reported logs, most recent first.
    pub recent_logs: Vec<RecentLog>,
    /// Quality gate floors.
    pub quality_gate: QualityGateConfig,
    /// Severity cut-point overrides, merged over the defaults.
    pub threshold_overrides: ThresholdOverrides,
    /// Confidence recalibration table.
    pub calibration: CalibrationTable,
    /// Margin applied around the skin bbox to derive the face crop.
    pub margin_scale: f64,
    /// Module card settings; `grid` also sizes the crop-space skin mask.
    pub modules: ModuleMaskConfig,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            language: Language::En,
            profile: ProfileSummary::default(),
            recent_logs: Vec::new(),
            quality_gate: QualityGateConfig::default(),
            threshold_overrides: ThresholdOverrides::new(),
            calibration: CalibrationTable::identity(),
            margin_scale: DEFAULT_MARGIN_SCALE,
            modules: ModuleMaskConfig::default(),
        }
    }
}

/// Runs the analysis pipeline with a fixed configuration.
pub struct SkinAnalyzer {
    options: AnalysisOptions,
    thresholds: SeverityThresholds,
    detectors: Vec<Box<dyn IssueDetector>>,
}

impl std::fmt::Debug for SkinAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkinAnalyzer")
            .field("options", &self.options)
            .field("thresholds", &self.thresholds)
            .field(
                "detectors",
                &self.detectors.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for SkinAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisOptions::default())
    }
}

impl SkinAnalyzer {
    /// Creates an analyzer with the four built-in detectors.
    ///
    /// Configuration is normalized once here: gate floors are clamped,
    /// threshold overrides merged and ordered, and the module config clamped.
    #[must_use]
    pub fn new(options: AnalysisOptions) -> Self {
        let thresholds = SeverityThresholds::default().with_overrides(&options.threshold_overrides);
        let options = AnalysisOptions {
            quality_gate: options.quality_gate.normalized(),
            modules: options.modules.normalized(),
            ..options
        };
        Self {
            options,
            thresholds,
            detectors: default_detectors(),
        }
    }

    /// Replaces the detector set.
    #[must_use]
    pub fn with_detectors(mut self, detectors: Vec<Box<dyn IssueDetector>>) -> Self {
        self.detectors = detectors;
        self
    }

    /// The normalized options.
    #[must_use]
    pub const fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Decodes and analyses one photo.
    ///
    /// # Errors
    ///
    /// Fails closed with an [`AnalysisError`] whose [`reason`] is the wire
    /// code: undecodable input, no usable skin region, or a detector or
    /// postprocessing failure. A poor-quality photo is not an error.
    ///
    /// [`reason`]: AnalysisError::reason
    pub fn analyze(&self, bytes: &[u8]) -> Result<Analysis, AnalysisError> {
        let image = AnalysisImage::decode(bytes)?;
        self.analyze_image(&image)
    }

    /// Analyses an already-decoded image.
    ///
    /// # Errors
    ///
    /// Same as [`SkinAnalyzer::analyze`], minus decoding.
    pub fn analyze_image(&self, image: &AnalysisImage) -> Result<Analysis, AnalysisError> {
        let roi = segment_skin(image)?;
        let quality = assess_quality(image, &roi, &self.options.quality_gate)?;
        info!(
            coverage = roi.coverage,
            grade = %quality.grade,
            quality_factor = quality.quality_factor,
            "quality graded"
        );

        let boxes = RegionBoxes::from_roi(roi.bbox);
        let lab = LabStats::measure(image, &roi.mask);
        let ctx = DetectorContext {
            image,
            roi: &roi,
            boxes: &boxes,
            lab: &lab,
            quality: &quality,
        };
        let inputs = ScoringInputs {
            quality: &quality,
            language: self.options.language,
            profile: &self.options.profile,
            recent_logs: &self.options.recent_logs,
            thresholds: &self.thresholds,
            calibration: &self.options.calibration,
        };

        let mut issues = Vec::with_capacity(self.detectors.len());
        for detector in &self.detectors {
            let signal = detector
                .detect(&ctx)
                .map_err(|source| AnalysisError::Detector {
                    name: detector.name(),
                    source,
                })?;
            debug!(
                detector = detector.name(),
                score = signal.score,
                model_conf = signal.model_conf,
                "raw signal"
            );
            issues.push(score_issue(detector.issue_type(), &signal, &inputs));
        }

        let width = dimension(image.width())?;
        let height = dimension(image.height())?;
        let skin_bbox_norm = roi.bbox.to_norm(width, height);
        let orig_size_px = image.orig_size();
        let face_crop = FaceCrop::from_skin_bbox(skin_bbox_norm, orig_size_px, self.options.margin_scale);

        let projection = CropProjection {
            width,
            height,
            crop: &face_crop,
        };
        let mut photo = build_photo_findings(&issues, &quality, &boxes, &projection, self.options.language)?;
        photo.photo_findings.truncate(MAX_PHOTO_FINDINGS);
        photo.takeaways.truncate(MAX_TAKEAWAYS);

        let notes = summary_notes(&quality, self.options.language);
        let policy = summarize_for_policy(&issues, &quality);
        let grid = self.options.modules.grid;
        let crop_skin_mask = roi.mask.crop_resample_nearest(
            crop_in_analysis_space(&face_crop, Size::new(width, height)),
            grid,
            grid,
        );

        Ok(Analysis {
            diagnosis: Diagnosis {
                schema_version: DIAGNOSIS_SCHEMA.to_string(),
                quality,
                issues,
                photo_findings: photo.photo_findings,
                takeaways: photo.takeaways,
                notes,
            },
            policy,
            internal: AnalysisInternal {
                orig_size_px,
                skin_bbox_norm,
                face_crop,
            },
            crop_skin_mask,
        })
    }

    /// Builds the module card for a finished analysis, using the
    /// analysis's own crop-space skin mask.
    #[must_use]
    pub fn module_card(&self, analysis: &Analysis) -> Option<ModuleCard> {
        build_modules(
            &analysis.diagnosis.photo_findings,
            &analysis.internal.face_crop,
            &analysis.diagnosis.quality,
            Some(&analysis.crop_skin_mask),
            &self.options.modules,
            self.options.language,
        )
    }
}

fn dimension(value: usize) -> Result<u32, AnalysisError> {
    u32::try_from(value).map_err(|_| AnalysisError::Postprocess(format!("image dimension {value} out of range")))
}

/// Scales the crop rectangle from original-photo pixels to analysis pixels.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn crop_in_analysis_space(crop: &FaceCrop, analysis: Size) -> PixelRect {
    let sx = f64::from(analysis.w) / f64::from(crop.orig_size_px.w.max(1));
    let sy = f64::from(analysis.h) / f64::from(crop.orig_size_px.h.max(1));
    let b = crop.bbox_px;
    PixelRect {
        x: (f64::from(b.x) * sx).floor().max(0.0) as u32,
        y: (f64::from(b.y) * sy).floor().max(0.0) as u32,
        w: (f64::from(b.w) * sx).ceil().max(1.0) as u32,
        h: (f64::from(b.h) * sy).ceil().max(1.0) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::testing::textured;
    use crate::domain::{FailureReason, IssueType, QualityGrade, RawSignal};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(img: &RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn face() -> RgbImage {
        textured(200, 200, [200, 150, 130], 18)
    }

    // === Fail-closed ===

    #[test]
    fn test_tiny_payload_is_no_image() {
        let err = SkinAnalyzer::default().analyze(b"abc").unwrap_err();
        assert_eq!(err.reason(), FailureReason::NoImage);
    }

    #[test]
    fn test_garbage_is_decode_failed() {
        let err = SkinAnalyzer::default().analyze(&[7u8; 200]).unwrap_err();
        assert_eq!(err.reason(), FailureReason::DecodeFailed);
    }

    #[test]
    fn test_no_skin_fails_closed() {
        let blue = RgbImage::from_pixel(120, 120, Rgb([20, 40, 200]));
        let err = SkinAnalyzer::default().analyze(&png(&blue)).unwrap_err();
        assert_eq!(err.reason(), FailureReason::SkinRoiNotFound);
    }

    struct Failing;

    impl IssueDetector for Failing {
        fn issue_type(&self) -> IssueType {
            IssueType::Acne
        }
        fn name(&self) -> &'static str {
            "failing"
        }
        fn detect(&self, _ctx: &DetectorContext<'_>) -> anyhow::Result<RawSignal> {
            anyhow::bail!("boom")
        }
    }

    #[test]
    fn test_detector_error_is_detector_failed() {
        let analyzer = SkinAnalyzer::default().with_detectors(vec![Box::new(Failing)]);
        let err = analyzer.analyze(&png(&face())).unwrap_err();
        assert_eq!(err.reason(), FailureReason::DetectorFailed);
        assert!(err.to_string().contains("failing"));
    }

    // === Success ===

    #[test]
    fn test_textured_face_produces_full_diagnosis() {
        let analyzer = SkinAnalyzer::default();
        let analysis = analyzer.analyze(&png(&face())).unwrap();
        let d = &analysis.diagnosis;
        assert_eq!(d.schema_version, DIAGNOSIS_SCHEMA);
        assert_eq!(d.issues.len(), 4);
        assert_eq!(analysis.internal.orig_size_px, Size::new(200, 200));
        assert_eq!(analysis.crop_skin_mask.width(), 64);
        if d.quality.grade.is_usable() {
            assert_eq!(d.photo_findings.len(), 4);
            let card = analyzer.module_card(&analysis).unwrap();
            assert_eq!(card.payload.modules.len(), 7);
            assert_eq!(card.payload.face_crop, analysis.internal.face_crop);
        } else {
            assert!(d.photo_findings.is_empty());
        }
    }

    #[test]
    fn test_large_photo_reports_original_size() {
        let big = textured(600, 400, [200, 150, 130], 18);
        let analysis = SkinAnalyzer::default().analyze(&png(&big)).unwrap();
        assert_eq!(analysis.internal.orig_size_px, Size::new(600, 400));
        let crop = &analysis.internal.face_crop;
        assert!(crop.bbox_px.x + crop.bbox_px.w <= 600);
        assert!(crop.bbox_px.y + crop.bbox_px.h <= 400);
    }

    #[test]
    fn test_fail_grade_still_ok() {
        let flat = RgbImage::from_pixel(200, 200, Rgb([200, 150, 130]));
        let analysis = SkinAnalyzer::default().analyze(&png(&flat)).unwrap();
        assert_eq!(analysis.diagnosis.quality.grade, QualityGrade::Fail);
        assert!(analysis.diagnosis.photo_findings.is_empty());
        assert_eq!(
            analysis.diagnosis.takeaways[0].takeaway_id,
            "tw_photo_quality_retake"
        );
        assert!(SkinAnalyzer::default().module_card(&analysis).is_none());
    }

    #[test]
    fn test_crop_scaled_into_analysis_space() {
        let crop = FaceCrop::new(
            PixelRect {
                x: 100,
                y: 50,
                w: 400,
                h: 300,
            },
            Size::new(1000, 500),
        );
        let rect = crop_in_analysis_space(&crop, Size::new(250, 125));
        assert_eq!(
            rect,
            PixelRect {
                x: 25,
                y: 12,
                w: 100,
                h: 75
            }
        );
    }
}
