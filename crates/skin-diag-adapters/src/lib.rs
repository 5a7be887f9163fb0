//! Skin-diag adapters - filesystem and configuration-file adapters.
//!
//! This crate provides:
//! - A filesystem photo source
//! - The calibration-table loader

pub mod calibration;
pub mod fs;

pub use calibration::{load_calibration, parse_calibration};
pub use fs::FsPhotoSource;
