//! Photo decoding into the small RGB buffer every stage works on.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use tracing::debug;

use crate::color::luma_u8;
use crate::domain::{AnalysisError, Size};

/// Longest side of the analysis buffer.
pub const ANALYSIS_MAX_SIDE: u32 = 256;

/// Payloads shorter than this are treated as missing.
pub const MIN_IMAGE_BYTES: usize = 50;

/// Decoded, orientation-corrected, downscaled photo.
#[derive(Debug, Clone)]
pub struct AnalysisImage {
    rgb: RgbImage,
    gray: Vec<u8>,
    orig: Size,
}

impl AnalysisImage {
    /// Decodes image bytes, applies EXIF orientation and fits the result
    /// inside [`ANALYSIS_MAX_SIDE`] without enlarging. Alpha is dropped.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::NoImage`] for tiny payloads, [`AnalysisError::Decode`]
    /// when the format is unknown or the data is corrupt, and
    /// [`AnalysisError::EmptyImage`] for zero-sized results.
    pub fn decode(bytes: &[u8]) -> Result<Self, AnalysisError> {
        if bytes.len() < MIN_IMAGE_BYTES {
            return Err(AnalysisError::NoImage { len: bytes.len() });
        }

        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?;
        let mut decoder = reader.into_decoder()?;
        let orientation = decoder.orientation()?;
        let mut img = DynamicImage::from_decoder(decoder)?;
        img.apply_orientation(orientation);

        let orig = Size::new(img.width(), img.height());
        if orig.w == 0 || orig.h == 0 {
            return Err(AnalysisError::EmptyImage);
        }

        if orig.w.max(orig.h) > ANALYSIS_MAX_SIDE {
            img = img.resize(ANALYSIS_MAX_SIDE, ANALYSIS_MAX_SIDE, FilterType::Lanczos3);
        }
        let rgb = img.to_rgb8();
        debug!(
            orig_w = orig.w,
            orig_h = orig.h,
            w = rgb.width(),
            h = rgb.height(),
            "decoded photo"
        );
        Ok(Self::from_rgb(rgb, orig))
    }

    /// Wraps an already-decoded buffer. `orig` is the size before any downscale.
    #[must_use]
    pub fn from_rgb(rgb: RgbImage, orig: Size) -> Self {
        let gray = rgb
            .pixels()
            .map(|p| luma_u8(p.0[0], p.0[1], p.0[2]))
            .collect();
        Self { rgb, gray, orig }
    }

    /// Analysis width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.rgb.width() as usize
    }

    /// Analysis height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.rgb.height() as usize
    }

    /// Number of analysis pixels.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.gray.len()
    }

    /// Size of the decoded photo before downscaling.
    #[must_use]
    pub const fn orig_size(&self) -> Size {
        self.orig
    }

    /// RGB triple at a row-major index.
    #[must_use]
    pub fn rgb_at(&self, idx: usize) -> [u8; 3] {
        let raw = self.rgb.as_raw();
        let off = idx * 3;
        [raw[off], raw[off + 1], raw[off + 2]]
    }

    /// Rounded luma plane, row-major.
    #[must_use]
    pub fn gray(&self) -> &[u8] {
        &self.gray
    }

    /// The underlying RGB buffer.
    #[must_use]
    pub const fn rgb(&self) -> &RgbImage {
        &self.rgb
    }
}
