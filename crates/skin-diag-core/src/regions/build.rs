//! Turns photo findings into sanitized, styled regions.

use tracing::debug;

use super::sanitize::{sanitize_bbox, sanitize_corners, sanitize_heatmap, sanitize_polygon};
use super::{count_by, Sanitized};
use crate::domain::{
    FindingGeometry, GeometryCount, GeometryRejection, NormBox, PhotoFinding, QualityFlag,
    QualityReport, Region, RegionCount, RegionShape, RegionStyle, RegionType, VisualIssue,
    FACE_COORD_SPACE,
};
use crate::numeric::{clamp, clamp01, round3};

/// Upper bound on emitted regions.
pub const MAX_REGIONS: usize = 120;

const MAX_QUALITY_FLAGS: usize = 4;

/// A region plus the scoring data module aggregation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRegion {
    /// The renderable region.
    pub region: Region,
    /// Normalized issue.
    pub issue: VisualIssue,
    /// Finding severity clamped to `0..=4`.
    pub severity: f64,
    /// Finding confidence clamped to `[0,1]`.
    pub confidence: f64,
    /// Box used for overlap tests: the sanitized box itself, a polygon's
    /// bounds, or the finding's own box for heatmaps when it has one.
    pub bbox: Option<NormBox>,
}

impl BuiltRegion {
    /// Geometry kind.
    #[must_use]
    pub const fn region_type(&self) -> RegionType {
        self.region.shape.region_type()
    }
}

/// Regions for one card and the counters describing what was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSet {
    /// Up to [`MAX_REGIONS`] regions in finding order.
    pub regions: Vec<BuiltRegion>,
    /// Drops and clips by reason and geometry kind.
    pub geometry_counts: Vec<GeometryCount>,
    /// Emitted regions by kind and issue.
    pub region_counts: Vec<RegionCount>,
}

impl RegionSet {
    /// The renderable regions alone.
    #[must_use]
    pub fn to_regions(&self) -> Vec<Region> {
        self.regions.iter().map(|r| r.region.clone()).collect()
    }
}

struct Emitter<'a> {
    finding_id: &'a str,
    issue: VisualIssue,
    severity: f64,
    confidence: f64,
    style: RegionStyle,
    quality_flags: &'a [QualityFlag],
}

impl Emitter<'_> {
    fn emit<T>(
        &self,
        suffix: &str,
        sanitized: &Sanitized<T>,
        shape: RegionShape,
        bbox: Option<NormBox>,
    ) -> BuiltRegion {
        BuiltRegion {
            region: Region {
                region_id: format!("{}_{suffix}", self.finding_id),
                shape,
                coord_space: FACE_COORD_SPACE.to_string(),
                style: self.style.clone(),
                notes: sanitized.clip_reason.iter().cloned().collect(),
                quality_flags: self.quality_flags.to_vec(),
            },
            issue: self.issue,
            severity: self.severity,
            confidence: self.confidence,
            bbox,
        }
    }
}

/// Intensity and priority from severity (`0..=4`) and confidence.
#[allow(clippy::suboptimal_flops)]
#[must_use]
pub fn region_style(issue: VisualIssue, severity: f64, confidence: f64) -> RegionStyle {
    let sev = clamp01(severity / 4.0);
    RegionStyle {
        intensity: round3(clamp01(sev * 0.7 + confidence * 0.3)),
        priority: round3(clamp01(sev * 0.8 + confidence * 0.2)),
        label_hint: issue,
    }
}

fn raw_bbox(geometry: &FindingGeometry) -> Option<Result<Sanitized<NormBox>, GeometryRejection>> {
    geometry
        .bbox_norm
        .map(sanitize_corners)
        .or_else(|| geometry.bbox.map(sanitize_bbox))
}

/// Sanitizes every geometry of every supported finding.
///
/// Each geometry kind is handled independently: a rejected polygon does not
/// stop the same finding's box or heatmap from becoming regions.
#[must_use]
pub fn build_regions(findings: &[PhotoFinding], quality: &QualityReport) -> RegionSet {
    let reason_names: Vec<&str> = quality.reasons.iter().map(|r| r.as_str()).collect();
    let mut quality_flags = QualityFlag::from_reasons(&reason_names);
    quality_flags.truncate(MAX_QUALITY_FLAGS);

    let mut regions = Vec::new();
    let mut events: Vec<(String, RegionType)> = Vec::new();

    for (index, finding) in findings.iter().enumerate() {
        if !finding.issue_type.is_supported() {
            continue;
        }
        let finding_id = if finding.finding_id.trim().is_empty() {
            format!("finding_{}", index + 1)
        } else {
            finding.finding_id.clone()
        };
        let severity = clamp(finding.severity, 0.0, 4.0);
        let confidence = clamp01(finding.confidence);
        let emitter = Emitter {
            finding_id: &finding_id,
            issue: finding.issue_type,
            severity,
            confidence,
            style: region_style(finding.issue_type, severity, confidence),
            quality_flags: &quality_flags,
        };

        let Some(geometry) = finding.geometry.as_ref().filter(|g| !g.is_empty()) else {
            events.push((GeometryRejection::GeometryMissing.to_string(), RegionType::Unknown));
            continue;
        };

        let mut note = |s: Option<&String>, kind: RegionType| {
            if let Some(reason) = s {
                events.push((reason.clone(), kind));
            }
        };

        let bbox = raw_bbox(geometry);
        let sanitized_bbox = bbox.as_ref().and_then(|r| r.as_ref().ok()).map(|s| s.value);
        match bbox {
            Some(Ok(s)) => {
                note(s.clip_reason.as_ref(), RegionType::Bbox);
                let shape = RegionShape::Bbox { bbox: s.value };
                regions.push(emitter.emit("bbox", &s, shape, Some(s.value)));
            }
            Some(Err(rejection)) => note(Some(&rejection.to_string()), RegionType::Bbox),
            None => {}
        }

        match geometry.polygon.as_ref().map(|p| sanitize_polygon(&p.points)) {
            Some(Ok(s)) => {
                note(s.clip_reason.as_ref(), RegionType::Polygon);
                let shape = RegionShape::Polygon {
                    polygon: s.value.polygon.clone(),
                };
                regions.push(emitter.emit("polygon", &s, shape, Some(s.value.bbox)));
            }
            Some(Err(rejection)) => note(Some(&rejection.to_string()), RegionType::Polygon),
            None => {}
        }

        match geometry.heatmap.as_ref().map(sanitize_heatmap) {
            Some(Ok(s)) => {
                note(s.clip_reason.as_ref(), RegionType::Heatmap);
                let shape = RegionShape::Heatmap {
                    heatmap: s.value.clone(),
                };
                regions.push(emitter.emit("heatmap", &s, shape, sanitized_bbox));
            }
            Some(Err(rejection)) => note(Some(&rejection.to_string()), RegionType::Heatmap),
            None => {}
        }
    }

    if regions.len() > MAX_REGIONS {
        debug!(kept = MAX_REGIONS, total = regions.len(), "truncating regions");
        regions.truncate(MAX_REGIONS);
    }

    let geometry_counts = count_by(events)
        .into_iter()
        .map(|((reason, region_type), count)| GeometryCount {
            reason,
            region_type,
            count,
        })
        .collect();
    let region_counts = count_by(regions.iter().map(|r| (r.region_type(), r.issue)))
        .into_iter()
        .map(|((region_type, issue_type), count)| RegionCount {
            region_type,
            issue_type,
            count,
        })
        .collect();

    RegionSet {
        regions,
        geometry_counts,
        region_counts,
    }
}
