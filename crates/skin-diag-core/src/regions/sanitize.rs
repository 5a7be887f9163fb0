//! Validation and clipping of supplied finding geometry.
//!
//! Every sanitizer either rejects with a [`GeometryRejection`] or returns a
//! value that is a fixed point: sanitizing it again changes nothing and adds
//! no clip note.

use std::collections::BTreeSet;

use crate::domain::{
    GeometryRejection, GridSize, Heatmap, HeatmapInput, NormBox, NormCorners, NormPoint, Polygon,
    ValueRange, FACE_COORD_SPACE,
};
use crate::numeric::{clamp, clamp01, round3};

/// Side length of the canonical heatmap grid.
pub const CANONICAL_GRID: usize = 64;

/// Largest accepted source grid side.
pub const MAX_SOURCE_GRID: usize = 256;

/// Boxes and polygon bounds at or below this extent are rejected.
pub const MIN_EXTENT: f64 = 0.001;

const CLAMP_EPS: f64 = 1e-9;
const DEDUPE_EPS: f64 = 1e-6;
const ORIENTATION_EPS: f64 = 1e-9;

/// Clip note for an altered box.
pub const BBOX_CLIP: &str = "bbox_clamped";
/// Clip note for an altered heatmap.
pub const HEATMAP_CLIP: &str = "heatmap_clamped_or_resampled";

/// A sanitized value plus the note describing any clipping applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized<T> {
    /// The accepted value.
    pub value: T,
    /// Set when the input had to be altered.
    pub clip_reason: Option<String>,
}

impl<T> Sanitized<T> {
    /// Whether the input was altered.
    #[must_use]
    pub const fn clipped(&self) -> bool {
        self.clip_reason.is_some()
    }
}

/// A sanitized polygon and its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedPolygon {
    /// Closed outline.
    pub polygon: Polygon,
    /// Bounds of the outline, rounded.
    pub bbox: NormBox,
}

/// Clamps a box into the unit square.
///
/// # Errors
///
/// `BboxNonNumeric` for non-finite input, `BboxTooSmall` when the clamped
/// box is at most [`MIN_EXTENT`] wide or tall.
pub fn sanitize_bbox(b: NormBox) -> Result<Sanitized<NormBox>, GeometryRejection> {
    if !(b.x.is_finite() && b.y.is_finite() && b.w.is_finite() && b.h.is_finite()) {
        return Err(GeometryRejection::BboxNonNumeric);
    }
    let raw = [b.x, b.y, b.x + b.w, b.y + b.h];
    let [x0, y0, x1, y1] = raw.map(clamp01);
    let clipped = raw
        .iter()
        .zip([x0, y0, x1, y1])
        .any(|(r, c)| (r - c).abs() > CLAMP_EPS);

    // Size comes from the rounded corners, so `x + w` stays inside the unit square.
    let (rx0, rx1) = (round3(x0.min(x1)), round3(x0.max(x1)));
    let (ry0, ry1) = (round3(y0.min(y1)), round3(y0.max(y1)));
    let w = round3(rx1 - rx0);
    let h = round3(ry1 - ry0);
    if w <= MIN_EXTENT || h <= MIN_EXTENT {
        return Err(GeometryRejection::BboxTooSmall);
    }
    Ok(Sanitized {
        value: NormBox::new(rx0, ry0, w, h),
        clip_reason: clipped.then(|| BBOX_CLIP.to_string()),
    })
}

/// Corner form of [`sanitize_bbox`].
///
/// # Errors
///
/// Same as [`sanitize_bbox`].
pub fn sanitize_corners(c: NormCorners) -> Result<Sanitized<NormBox>, GeometryRejection> {
    if !c.is_finite() {
        return Err(GeometryRejection::BboxNonNumeric);
    }
    sanitize_bbox(c.to_box())
}

fn near(a: NormPoint, b: NormPoint) -> bool {
    (a.x - b.x).abs() <= DEDUPE_EPS && (a.y - b.y).abs() <= DEDUPE_EPS
}

/// Clamps, rounds and de-duplicates a polygon, then rejects degenerate or
/// self-intersecting outlines.
///
/// # Errors
///
/// `PolygonTooFewPoints`, `PolygonSelfIntersection` or `PolygonTooSmall`.
pub fn sanitize_polygon(points: &[NormPoint]) -> Result<Sanitized<SanitizedPolygon>, GeometryRejection> {
    let mut reasons = BTreeSet::new();
    let mut pts: Vec<NormPoint> = Vec::with_capacity(points.len());
    for p in points {
        if !(p.x.is_finite() && p.y.is_finite()) {
            reasons.insert("polygon_non_numeric");
            continue;
        }
        let x = clamp01(p.x);
        let y = clamp01(p.y);
        if (x - p.x).abs() > CLAMP_EPS || (y - p.y).abs() > CLAMP_EPS {
            reasons.insert("polygon_clamped");
        }
        let q = NormPoint::new(round3(x), round3(y));
        if pts.last().is_some_and(|last| near(*last, q)) {
            reasons.insert("polygon_deduped");
            continue;
        }
        pts.push(q);
    }
    if pts.len() >= 2 && near(pts[0], pts[pts.len() - 1]) {
        pts.pop();
        reasons.insert("polygon_deduped");
    }
    if pts.len() < 3 {
        return Err(GeometryRejection::PolygonTooFewPoints);
    }
    if self_intersects(&pts) {
        return Err(GeometryRejection::PolygonSelfIntersection);
    }

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (1.0_f64, 1.0_f64, 0.0_f64, 0.0_f64);
    for p in &pts {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let bbox = NormBox::new(
        round3(min_x),
        round3(min_y),
        round3(max_x - min_x),
        round3(max_y - min_y),
    );
    if bbox.w <= MIN_EXTENT || bbox.h <= MIN_EXTENT {
        return Err(GeometryRejection::PolygonTooSmall);
    }

    let clip_reason = if reasons.is_empty() {
        None
    } else {
        Some(reasons.into_iter().collect::<Vec<_>>().join("+"))
    };
    Ok(Sanitized {
        value: SanitizedPolygon {
            polygon: Polygon {
                points: pts,
                closed: true,
            },
            bbox,
        },
        clip_reason,
    })
}

/// 0 collinear, 1 clockwise, 2 counter-clockwise.
#[allow(clippy::suboptimal_flops)]
fn orientation(a: NormPoint, b: NormPoint, c: NormPoint) -> u8 {
    let v = (b.y - a.y) * (c.x - b.x) - (b.x - a.x) * (c.y - b.y);
    if v.abs() < ORIENTATION_EPS {
        0
    } else if v > 0.0 {
        1
    } else {
        2
    }
}

fn on_segment(a: NormPoint, b: NormPoint, c: NormPoint) -> bool {
    b.x <= a.x.max(c.x) + ORIENTATION_EPS
        && b.x + ORIENTATION_EPS >= a.x.min(c.x)
        && b.y <= a.y.max(c.y) + ORIENTATION_EPS
        && b.y + ORIENTATION_EPS >= a.y.min(c.y)
}

fn segments_intersect(p1: NormPoint, q1: NormPoint, p2: NormPoint, q2: NormPoint) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);
    if o1 != o2 && o3 != o4 {
        return true;
    }
    (o1 == 0 && on_segment(p1, p2, q1))
        || (o2 == 0 && on_segment(p1, q2, q1))
        || (o3 == 0 && on_segment(p2, p1, q2))
        || (o4 == 0 && on_segment(p2, q1, q2))
}

/// Tests non-adjacent edge pairs. Triangles never self-intersect.
fn self_intersects(pts: &[NormPoint]) -> bool {
    let n = pts.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let i_next = (i + 1) % n;
        for j in (i + 1)..n {
            let j_next = (j + 1) % n;
            if i_next == j || j_next == i || (i == 0 && j_next == n - 1) {
                continue;
            }
            if segments_intersect(pts[i], pts[i_next], pts[j], pts[j_next]) {
                return true;
            }
        }
    }
    false
}

/// Validates a heatmap and resamples it onto the canonical 64×64 grid.
///
/// # Errors
///
/// `HeatmapInvalidGrid` without a finite grid or values;
/// `HeatmapValuesLengthMismatch` when there are fewer values than cells.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn sanitize_heatmap(input: &HeatmapInput) -> Result<Sanitized<Heatmap>, GeometryRejection> {
    let Some(grid) = input.grid else {
        return Err(GeometryRejection::HeatmapInvalidGrid);
    };
    if !(grid.w.is_finite() && grid.h.is_finite()) || input.values.is_empty() {
        return Err(GeometryRejection::HeatmapInvalidGrid);
    }
    let max = MAX_SOURCE_GRID as f64;
    let src_w = clamp(grid.w.trunc(), 1.0, max);
    let src_h = clamp(grid.h.trunc(), 1.0, max);
    let mut clipped = src_w != grid.w || src_h != grid.h;
    let (src_w, src_h) = (src_w as usize, src_h as usize);

    let cells = src_w * src_h;
    if input.values.len() < cells {
        return Err(GeometryRejection::HeatmapValuesLengthMismatch);
    }
    if input.values.len() > cells {
        clipped = true;
    }
    let source: Vec<f64> = input.values[..cells]
        .iter()
        .map(|&v| {
            let c = clamp01(v);
            if !v.is_finite() || c != v {
                clipped = true;
            }
            c
        })
        .collect();

    let values = if src_w == CANONICAL_GRID && src_h == CANONICAL_GRID {
        source
    } else {
        clipped = true;
        resample_bilinear(&source, src_w, src_h, CANONICAL_GRID, CANONICAL_GRID)
    };

    Ok(Sanitized {
        value: Heatmap {
            coord_space: FACE_COORD_SPACE.to_string(),
            grid: GridSize {
                w: CANONICAL_GRID,
                h: CANONICAL_GRID,
            },
            values,
            value_range: ValueRange { min: 0.0, max: 1.0 },
            smoothing_hint: "bilinear".to_string(),
        },
        clip_reason: clipped.then(|| HEATMAP_CLIP.to_string()),
    })
}

/// Bilinear resample with edge clamping; outputs are rounded and in `[0,1]`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::suboptimal_flops
)]
fn resample_bilinear(src: &[f64], src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Vec<f64> {
    let at = |x: usize, y: usize| src[y * src_w + x];
    let mut out = Vec::with_capacity(dst_w * dst_h);
    for y in 0..dst_h {
        let sy = ((y as f64 + 0.5) * src_h as f64) / dst_h as f64 - 0.5;
        let y0 = (sy.floor().max(0.0) as usize).min(src_h - 1);
        let y1 = (y0 + 1).min(src_h - 1);
        let ty = sy - y0 as f64;
        for x in 0..dst_w {
            let sx = ((x as f64 + 0.5) * src_w as f64) / dst_w as f64 - 0.5;
            let x0 = (sx.floor().max(0.0) as usize).min(src_w - 1);
            let x1 = (x0 + 1).min(src_w - 1);
            let tx = sx - x0 as f64;
            let top = at(x0, y0) * (1.0 - tx) + at(x1, y0) * tx;
            let bottom = at(x0, y1) * (1.0 - tx) + at(x1, y1) * tx;
            out.push(round3(clamp01(top * (1.0 - ty) + bottom * ty)));
        }
    }
    out
}
