//! Core domain types for skin photo analysis.

mod context;
mod error;
mod face_crop;
mod finding;
mod geometry;
mod issue;
mod module;
mod quality;
mod region;
mod result;

pub use context::{Language, ProfileSummary, RecentLog};
pub use error::{AnalysisError, FailureReason, SegmentError};
pub use face_crop::{FaceCrop, DEFAULT_MARGIN_SCALE, ORIG_COORD_SPACE};
pub use finding::{
    FeatureValue, FindingGeometry, GridInput, HeatmapInput, PhotoFinding, PolygonInput, Takeaway,
    VisualIssue,
};
pub use geometry::{NormBox, NormCorners, NormPoint, PixelBox, PixelRect, Size};
pub use issue::{
    AcneMetrics, Calibration, ConfidenceLabel, DarkSpotMetrics, Evidence, IssueFinding,
    IssueMetrics, IssueType, PoresMetrics, RawSignal, RednessMetrics, Severity,
};
pub use module::{
    CardMetrics, Disclaimers, GeometryCount, MaskFallback, MaskFallbackCount, Module, ModuleCard,
    ModuleId, ModuleIssue, ModuleIssueCount, ModulePayload, RegionCount,
};
pub use quality::{QualityGrade, QualityMetrics, QualityReason, QualityReport};
pub use region::{
    GeometryRejection, GridSize, Heatmap, Polygon, QualityFlag, Region, RegionShape, RegionStyle,
    RegionType, ValueRange, FACE_COORD_SPACE,
};
pub use result::{
    Analysis, AnalysisInternal, ConfidenceLevel, Diagnosis, PhotoReport, PolicySummary,
    DIAGNOSIS_SCHEMA, POLICY_SCHEMA,
};
