//! The photo module card: regions aggregated into seven face zones.

use tracing::debug;

use super::layout::module_box;
use super::masks::{build_module_mask, ModuleMaskConfig};
use crate::domain::{
    CardMetrics, Disclaimers, FaceCrop, Language, MaskFallbackCount, Module, ModuleCard, ModuleId,
    ModuleIssue, ModuleIssueCount, ModulePayload, NormBox, PhotoFinding, QualityGrade,
    QualityReport, RegionShape, VisualIssue,
};
use crate::mask::Bitmap;
use crate::numeric::{clamp01, round3};
use crate::regions::{build_regions, count_by, BuiltRegion};

/// Card type tag.
pub const MODULE_CARD_TYPE: &str = "photo_modules_v1";

const MAX_MODULE_ISSUES: usize = 4;
const MAX_EVIDENCE_IDS: usize = 3;
const MIN_HEATMAP_SIGNAL: f64 = 0.02;
const MIN_BOX_OVERLAP: f64 = 0.03;

/// How strongly one region speaks for one module.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Contribution<'a> {
    region: &'a BuiltRegion,
    overlap: f64,
    signal: f64,
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn heatmap_signal(values: &[f64], w: usize, h: usize, module: NormBox) -> Option<f64> {
    if w == 0 || h == 0 || values.len() < w * h {
        return None;
    }
    let span = |lo: f64, hi: f64, n: usize| {
        let nf = n as f64;
        let a = ((lo * nf).floor().max(0.0) as usize).min(n - 1);
        let b = ((hi * nf).ceil().max(0.0) as usize).min(n);
        (a, b)
    };
    let (x0, x1) = span(module.x, module.x1(), w);
    let (y0, y1) = span(module.y, module.y1(), h);
    let mut cells: Vec<f64> = (y0..y1)
        .flat_map(|y| (x0..x1).map(move |x| y * w + x))
        .map(|i| clamp01(values[i]))
        .collect();
    if cells.is_empty() {
        return None;
    }
    cells.sort_by(f64::total_cmp);
    let mean = cells.iter().sum::<f64>() / cells.len() as f64;
    let p90 = cells[((cells.len() - 1) as f64 * 0.9).floor() as usize];
    Some(mean.max(p90))
}

fn box_overlap(region: NormBox, module: NormBox) -> f64 {
    let iw = (region.x1().min(module.x1()) - region.x.max(module.x)).max(0.0);
    let ih = (region.y1().min(module.y1()) - region.y.max(module.y)).max(0.0);
    clamp01((iw * ih) / (region.w * region.h).max(1e-6))
}

fn contribution(region: &BuiltRegion, module: NormBox) -> Option<Contribution<'_>> {
    match &region.region.shape {
        RegionShape::Heatmap { heatmap } => {
            let signal = heatmap_signal(&heatmap.values, heatmap.grid.w, heatmap.grid.h, module)?;
            (signal > MIN_HEATMAP_SIGNAL).then_some(Contribution {
                region,
                overlap: signal,
                signal,
            })
        }
        RegionShape::Bbox { .. } | RegionShape::Polygon { .. } => {
            let overlap = box_overlap(region.bbox?, module);
            (overlap > MIN_BOX_OVERLAP).then_some(Contribution {
                region,
                overlap,
                signal: clamp01(region.severity / 4.0),
            })
        }
    }
}

const fn grade_factor(grade: QualityGrade) -> f64 {
    match grade {
        QualityGrade::Pass => 1.0,
        QualityGrade::Degraded => 0.82,
        QualityGrade::Fail => 0.7,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn aggregate_issue(
    issue: VisualIssue,
    mut contributions: Vec<Contribution<'_>>,
    module: ModuleId,
    grade: QualityGrade,
    lang: Language,
) -> ModuleIssue {
    let weight: f64 = contributions.iter().map(|c| c.overlap).sum();
    let weighted: f64 = contributions.iter().map(|c| c.signal * c.overlap).sum();
    let wmean = if weight > 0.0 { weighted / weight } else { 0.0 };

    let mut signals: Vec<f64> = contributions.iter().map(|c| c.signal).collect();
    signals.sort_by(f64::total_cmp);
    let p90 = signals
        .get(((signals.len().saturating_sub(1)) as f64 * 0.9).floor() as usize)
        .copied()
        .unwrap_or(0.0);

    let max_conf = contributions
        .iter()
        .map(|c| c.region.confidence)
        .fold(0.0, f64::max);

    contributions.sort_by(|a, b| b.overlap.total_cmp(&a.overlap));
    let evidence_region_ids: Vec<String> = contributions
        .iter()
        .take(MAX_EVIDENCE_IDS)
        .map(|c| c.region.region.region_id.clone())
        .collect();

    let evidence = if evidence_region_ids.is_empty() {
        lang.pick("highlighted regions", "高亮区域").to_string()
    } else {
        evidence_region_ids.join(", ")
    };
    let label = module.label(lang);
    let explanation_short = match lang {
        Language::En => format!(
            "Based on highlighted photo evidence ({evidence}), {issue} signals are visible in the {label}."
        ),
        Language::Cn => format!("基于照片高亮证据（{evidence}），{label}存在 {issue} 相关信号。"),
    };

    ModuleIssue {
        issue_type: issue,
        severity_0_4: round3(clamp01(wmean.max(p90)) * 4.0),
        confidence_0_1: round3(clamp01(max_conf * grade_factor(grade))),
        evidence_region_ids,
        explanation_short,
    }
}

fn module_issues(
    module: ModuleId,
    module_box: NormBox,
    regions: &[BuiltRegion],
    grade: QualityGrade,
    lang: Language,
) -> Vec<ModuleIssue> {
    let mut buckets: Vec<(VisualIssue, Vec<Contribution<'_>>)> = Vec::new();
    for c in regions.iter().filter_map(|r| contribution(r, module_box)) {
        match buckets.iter_mut().find(|(issue, _)| *issue == c.region.issue) {
            Some((_, list)) => list.push(c),
            None => buckets.push((c.region.issue, vec![c])),
        }
    }
    let mut issues: Vec<ModuleIssue> = buckets
        .into_iter()
        .map(|(issue, list)| aggregate_issue(issue, list, module, grade, lang))
        .collect();
    issues.sort_by(|a, b| b.severity_0_4.total_cmp(&a.severity_0_4));
    issues.truncate(MAX_MODULE_ISSUES);
    issues
}

/// Builds the module card for a usable photo.
///
/// `skin_mask` is the ROI mask already resampled into the face crop at
/// `config.grid`. Returns `None` for a failed photo.
#[must_use]
pub fn build_modules(
    findings: &[PhotoFinding],
    face_crop: &FaceCrop,
    quality: &QualityReport,
    skin_mask: Option<&Bitmap>,
    config: &ModuleMaskConfig,
    lang: Language,
) -> Option<ModuleCard> {
    if !quality.grade.is_usable() {
        return None;
    }
    let config = config.clone().normalized();
    let region_set = build_regions(findings, quality);

    let mut modules = Vec::with_capacity(ModuleId::ALL.len());
    let mut fallback_events = Vec::new();
    for module_id in ModuleId::ALL {
        let base = module_box(module_id, &config.module_boxes);
        let issues = module_issues(module_id, base, &region_set.regions, quality.grade, lang);

        let evidence: Vec<&BuiltRegion> = region_set
            .regions
            .iter()
            .filter(|r| {
                issues
                    .iter()
                    .any(|i| i.evidence_region_ids.contains(&r.region.region_id))
            })
            .collect();
        let mask = build_module_mask(module_id, base, &evidence, skin_mask, &config);
        fallback_events.extend(mask.fallbacks.iter().map(|f| (module_id, *f)));

        modules.push(Module {
            module_id,
            issues,
            module_box: base,
            mask_bbox_norm: mask.bbox_norm(),
            mask_grid: config.grid,
            mask_rle_norm: mask.mask.to_rle(),
        });
    }

    let module_issue_counts = count_by(
        modules
            .iter()
            .flat_map(|m| m.issues.iter().map(move |i| (m.module_id, i.issue_type))),
    )
    .into_iter()
    .map(|((module_id, issue_type), count)| ModuleIssueCount {
        module_id,
        issue_type,
        count,
    })
    .collect();
    let mask_fallback_counts = count_by(fallback_events)
        .into_iter()
        .map(|((module_id, fallback), count)| MaskFallbackCount {
            module_id,
            fallback,
            count,
        })
        .collect();

    debug!(
        regions = region_set.regions.len(),
        dropped = region_set.geometry_counts.len(),
        "module card built"
    );

    Some(ModuleCard {
        card_id: format!("photo_modules_{}", face_crop.crop_id),
        card_type: MODULE_CARD_TYPE.to_string(),
        payload: ModulePayload {
            used_photos: true,
            quality_grade: quality.grade,
            face_crop: face_crop.clone(),
            regions: region_set.to_regions(),
            modules,
            disclaimers: Disclaimers::default(),
        },
        metrics: CardMetrics {
            geometry_drop_counts: region_set.geometry_counts,
            region_counts: region_set.region_counts,
            module_issue_counts,
            mask_fallback_counts,
        },
    })
}
