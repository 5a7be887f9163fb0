//! Skin Diagnosis Core - deterministic skin photo analysis
//!
//! This crate contains the domain types, the analysis pipeline (skin ROI
//! segmentation, quality gating, issue detectors, calibration), region
//! sanitizing, module mask building and the bitmap kernel shared with
//! offline evaluation. It performs no filesystem or terminal I/O; adapters
//! plug in through the traits in [`ports`].

pub mod calibration;
pub mod color;
pub mod detectors;
pub mod domain;
pub mod findings;
pub mod imaging;
pub mod mask;
pub mod modules;
pub mod numeric;
pub mod pipeline;
pub mod ports;
pub mod quality;
pub mod regions;
pub mod segment;

pub use domain::{
    Analysis, AnalysisError, Diagnosis, FailureReason, IssueFinding, IssueType, Language,
    ModuleCard, PhotoReport, PolicySummary, QualityGrade, QualityReport,
};
pub use modules::{build_modules, ModuleMaskConfig};
pub use pipeline::{AnalysisOptions, SkinAnalyzer};
pub use ports::{PhotoSource, ProgressEvent, ProgressSink, ResultOutput, SourcePhoto};
