//! Run-length wire format for binary masks.
//!
//! Runs alternate starting with zeros, so a mask beginning with a set cell
//! encodes a leading `0`. Lengths are joined with `,`.

use super::Bitmap;

/// Encodes row-major cells as comma-separated run lengths.
#[must_use]
pub fn encode_rle_binary(cells: &[u8]) -> String {
    let mut counts: Vec<usize> = Vec::new();
    let mut current = 0u8;
    let mut run = 0usize;
    for &cell in cells {
        let value = u8::from(cell != 0);
        if value == current {
            run += 1;
            continue;
        }
        counts.push(run);
        run = 1;
        current = value;
    }
    counts.push(run);
    counts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Decodes run lengths into exactly `expected_len` cells.
///
/// Chunks that are not non-negative numbers are skipped; a zero-length run
/// flips the current value. Missing runs leave trailing cells unset and
/// excess runs are ignored.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn decode_rle_binary(rle: &str, expected_len: usize) -> Vec<u8> {
    let mut out = vec![0u8; expected_len];
    let mut value = 0u8;
    let mut offset = 0usize;
    let runs = rle
        .split(',')
        .filter_map(|chunk| parse_run(chunk.trim()))
        .filter(|n| n.is_finite() && *n >= 0.0);
    for count in runs {
        let n = count.trunc();
        if n <= 0.0 {
            value ^= 1;
            continue;
        }
        let end = offset.saturating_add(n.min(usize::MAX as f64) as usize).min(out.len());
        if value == 1 {
            out[offset..end].fill(1);
        }
        offset = end;
        value ^= 1;
        if offset >= out.len() {
            break;
        }
    }
    out
}

fn parse_run(chunk: &str) -> Option<f64> {
    if chunk.is_empty() {
        return Some(0.0);
    }
    chunk.parse::<f64>().ok()
}

impl Bitmap {
    /// Encodes this bitmap in the run-length wire format.
    #[must_use]
    pub fn to_rle(&self) -> String {
        encode_rle_binary(self.as_slice())
    }

    /// Decodes a `width × height` bitmap from the run-length wire format.
    #[must_use]
    pub fn from_rle(rle: &str, width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let cells = decode_rle_binary(rle, width * height);
        Self::from_raw(width, height, cells).unwrap_or_else(|| Self::new(width, height))
    }
}
