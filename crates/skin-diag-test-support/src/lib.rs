//! Test support utilities for skin-diag.
//!
//! Provides port mocks and synthetic face-photo builders for exercising the
//! analysis pipeline without real photos.
//!
//! # Example
//!
//! ```
//! use skin_diag_test_support::{MockPhotoSource, SyntheticSkinBuilder};
//!
//! let sharp = SyntheticSkinBuilder::textured_face().photo("sharp.png");
//! let soft = SyntheticSkinBuilder::textured_face().blur(4.5).photo("soft.png");
//!
//! let source = MockPhotoSource::new(vec![sharp, soft]);
//! ```

mod builders;
mod mocks;

pub use builders::{encode_png, SyntheticSkinBuilder, NON_SKIN, RED_TONE, SKIN_TONE};
pub use mocks::{MockPhotoSource, MockProgressSink, MockResultOutput};
