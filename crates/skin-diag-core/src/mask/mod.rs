//! Binary mask kernel: rasterization, boolean ops, overlap scores and RLE.

mod bitmap;
mod metrics;
mod raster;
mod rle;

pub use bitmap::Bitmap;
pub use metrics::{coverage_score, iou_score, leakage_score, safe_ratio};
pub use raster::{point_in_polygon, HEATMAP_THRESHOLD};
pub use rle::{decode_rle_binary, encode_rle_binary};
