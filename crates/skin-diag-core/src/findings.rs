//! Photo-level findings, takeaways, notes and the policy summary.
//!
//! Findings re-express the calibrated issues as four visual signals
//! (redness, shine, texture, tone), each with a coarse heatmap over the
//! face crop. A failed photo yields no findings, only retake guidance.

use std::collections::BTreeMap;

use crate::domain::{
    AnalysisError, ConfidenceLevel, DarkSpotMetrics, FaceCrop, FeatureValue, FindingGeometry,
    GridInput, HeatmapInput, IssueFinding, IssueMetrics, IssueType, Language, NormCorners,
    PhotoFinding, PixelBox, PoresMetrics, PolicySummary, QualityGrade, QualityReason,
    QualityReport, RednessMetrics, Takeaway, VisualIssue, POLICY_SCHEMA,
};
use crate::numeric::{clamp01, fmt3, round3};
use crate::segment::RegionBoxes;

/// Side length of the per-finding heatmap.
pub const FINDING_GRID: usize = 6;

const MAX_TAKEAWAYS_FROM_FINDINGS: usize = 8;
const MAX_NOTES: usize = 6;
const MAX_TOP_ISSUES: usize = 3;

const DEGRADED_PENALTY: f64 = 0.82;
const GLARE_PENALTY: f64 = 0.86;
const BLUR_PENALTY: f64 = 0.88;
const UNSTABLE_TONE_CONFIDENCE: f64 = 0.24;
const UNSTABLE_TONE_HEAT: f64 = 0.2;

/// Findings and the takeaways derived from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoFindings {
    /// Up to four findings.
    pub photo_findings: Vec<PhotoFinding>,
    /// Up to eight takeaways.
    pub takeaways: Vec<Takeaway>,
}

/// Maps analysis-pixel boxes into face-crop-normalized corners.
#[derive(Debug, Clone, Copy)]
pub struct CropProjection<'a> {
    /// Analysis width.
    pub width: u32,
    /// Analysis height.
    pub height: u32,
    /// Crop the output is relative to.
    pub crop: &'a FaceCrop,
}

impl CropProjection<'_> {
    /// Normalizes `b` by the analysis size, then re-expresses it in crop space.
    #[must_use]
    pub fn project(&self, b: PixelBox) -> NormCorners {
        self.crop.to_crop_norm(b.to_norm(self.width, self.height))
    }
}

/// Maps a `[0,1]` score onto the `0..=4` finding scale (cuts .15/.35/.55/.75).
#[must_use]
pub fn severity_0_4(score: f64) -> u8 {
    let s = clamp01(score);
    if s < 0.15 {
        0
    } else if s < 0.35 {
        1
    } else if s < 0.55 {
        2
    } else if s < 0.75 {
        3
    } else {
        4
    }
}

/// Row-major `FINDING_GRID²` heatmap: `score` inside the box, decaying outside.
#[allow(clippy::cast_precision_loss, clippy::suboptimal_flops)]
#[must_use]
pub fn grid_heatmap(b: NormCorners, score: f64) -> Vec<f64> {
    let s = clamp01(score);
    let n = FINDING_GRID as f64;
    let mut values = Vec::with_capacity(FINDING_GRID * FINDING_GRID);
    for r in 0..FINDING_GRID {
        let y = (r as f64 + 0.5) / n;
        for c in 0..FINDING_GRID {
            let x = (c as f64 + 0.5) / n;
            let inside = x >= b.x0 && x <= b.x1 && y >= b.y0 && y <= b.y1;
            if inside {
                values.push(round3(s));
                continue;
            }
            let dx = (b.x0 - x).max(x - b.x1).max(0.0);
            let dy = (b.y0 - y).max(y - b.y1).max(0.0);
            let d = (dx * dx + dy * dy).sqrt();
            values.push(round3(s * (1.0 - d * 4.5).max(0.0) * 0.45));
        }
    }
    values
}

#[allow(clippy::cast_precision_loss)]
fn geometry(b: NormCorners, score: f64) -> FindingGeometry {
    FindingGeometry {
        bbox_norm: Some(b),
        heatmap: Some(HeatmapInput {
            grid: Some(GridInput {
                w: FINDING_GRID as f64,
                h: FINDING_GRID as f64,
            }),
            values: grid_heatmap(b, score),
        }),
        ..FindingGeometry::default()
    }
}

fn features(pairs: &[(&str, FeatureValue)]) -> BTreeMap<String, FeatureValue> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
}

fn num(value: f64) -> FeatureValue {
    FeatureValue::Number(round3(value))
}

fn find_issue(issues: &[IssueFinding], issue: IssueType) -> Result<&IssueFinding, AnalysisError> {
    issues
        .iter()
        .find(|f| f.issue_type == issue)
        .ok_or_else(|| AnalysisError::Postprocess(format!("missing {issue} finding")))
}

fn metrics_mismatch(issue: IssueType) -> AnalysisError {
    AnalysisError::Postprocess(format!("{issue} finding carries metrics of another issue"))
}

fn redness_metrics(f: &IssueFinding) -> Result<RednessMetrics, AnalysisError> {
    match f.evidence.metrics {
        IssueMetrics::Redness(m) => Ok(m),
        _ => Err(metrics_mismatch(f.issue_type)),
    }
}

fn pores_metrics(f: &IssueFinding) -> Result<PoresMetrics, AnalysisError> {
    match f.evidence.metrics {
        IssueMetrics::Pores(m) => Ok(m),
        _ => Err(metrics_mismatch(f.issue_type)),
    }
}

fn dark_spot_metrics(f: &IssueFinding) -> Result<DarkSpotMetrics, AnalysisError> {
    match f.evidence.metrics {
        IssueMetrics::DarkSpots(m) => Ok(m),
        _ => Err(metrics_mismatch(f.issue_type)),
    }
}

/// Builds the four photo findings and their takeaways.
///
/// # Errors
///
/// [`AnalysisError::Postprocess`] if an issue finding is missing or carries
/// metrics of the wrong kind.
pub fn build_photo_findings(
    issues: &[IssueFinding],
    quality: &QualityReport,
    boxes: &RegionBoxes,
    projection: &CropProjection<'_>,
    lang: Language,
) -> Result<PhotoFindings, AnalysisError> {
    if quality.grade == QualityGrade::Fail {
        return Ok(PhotoFindings {
            photo_findings: Vec::new(),
            takeaways: vec![retake_takeaway(lang)],
        });
    }

    let wb_unstable = quality.white_balance_unstable();
    let glare = quality.has_reason(QualityReason::TooBright) || wb_unstable;
    let blur = quality.has_reason(QualityReason::Blur);
    let degraded = quality.grade == QualityGrade::Degraded;
    let qf = clamp01(quality.quality_factor);
    let penalty = (if degraded { DEGRADED_PENALTY } else { 1.0 })
        * (if glare { GLARE_PENALTY } else { 1.0 })
        * (if blur { BLUR_PENALTY } else { 1.0 });

    let redness = find_issue(issues, IssueType::Redness)?;
    let pores = find_issue(issues, IssueType::Pores)?;
    let dark = find_issue(issues, IssueType::DarkSpots)?;
    let rm = redness_metrics(redness)?;
    let pm = pores_metrics(pores)?;
    let dm = dark_spot_metrics(dark)?;

    let cheeks = projection.project(boxes.cheeks);
    let nose = projection.project(boxes.nose);
    let full = projection.project(boxes.full);

    let redness_score = clamp01(redness.severity_score);
    let redness_finding = PhotoFinding {
        finding_id: "pf_redness".into(),
        issue_type: VisualIssue::Redness,
        subtype: "diffuse_redness_proxy".into(),
        severity: f64::from(severity_0_4(redness_score)),
        confidence: round3(clamp01(clamp01(redness.confidence) * penalty)),
        uncertain: false,
        evidence: match lang {
            Language::En => format!(
                "From photo: a* shift={}, red-area ratio={}.{}",
                fmt3(rm.a_shift),
                fmt3(rm.red_fraction),
                if glare { " lighting/glare may affect this." } else { "" }
            ),
            Language::Cn => format!(
                "From photo: a* 偏移={}，红区占比={}。{}",
                fmt3(rm.a_shift),
                fmt3(rm.red_fraction),
                if glare { "光照/反光可能影响判断。" } else { "" }
            ),
        },
        computed_features: features(&[
            ("a_shift", num(rm.a_shift)),
            ("red_fraction", num(rm.red_fraction)),
            ("quality_factor", num(qf)),
        ]),
        geometry: Some(geometry(cheeks, redness_score)),
    };

    let specular = clamp01(pm.specular_fraction);
    let shine_score = clamp01((specular - 0.04) / 0.28);
    let shine_finding = PhotoFinding {
        finding_id: "pf_shine".into(),
        issue_type: VisualIssue::Shine,
        subtype: "specular_highlight_proxy".into(),
        severity: f64::from(severity_0_4(shine_score)),
        confidence: round3(clamp01(
            (0.48 + shine_score * 0.45) * qf * if glare { 0.8 } else { 1.0 },
        )),
        uncertain: false,
        evidence: match lang {
            Language::En => format!(
                "From photo: nose specular-highlight ratio={}.{}",
                fmt3(specular),
                if glare { " lighting/glare may inflate this." } else { "" }
            ),
            Language::Cn => format!(
                "From photo: 鼻部镜面反光比例={}。{}",
                fmt3(specular),
                if glare { "光照/反光可能抬高该值。" } else { "" }
            ),
        },
        computed_features: features(&[
            ("specular_fraction", num(specular)),
            ("shine_score", num(shine_score)),
            ("quality_factor", num(qf)),
        ]),
        geometry: Some(geometry(nose, shine_score)),
    };

    let pore_index = clamp01(pm.pore_index);
    let texture_finding = PhotoFinding {
        finding_id: "pf_texture".into(),
        issue_type: VisualIssue::Texture,
        subtype: "pores_proxy".into(),
        severity: f64::from(severity_0_4(pore_index)),
        confidence: round3(clamp01(
            pores.confidence * penalty * if blur { 0.8 } else { 1.0 },
        )),
        uncertain: false,
        evidence: match lang {
            Language::En => format!(
                "From photo: texture energy={}, pore proxy={}.{}",
                fmt3(pm.texture_energy),
                fmt3(pore_index),
                if blur || glare { " lighting/glare may affect this." } else { "" }
            ),
            Language::Cn => format!(
                "From photo: 纹理能量={}，毛孔代理指数={}。{}",
                fmt3(pm.texture_energy),
                fmt3(pore_index),
                if blur || glare { "光照/反光可能影响判断。" } else { "" }
            ),
        },
        computed_features: features(&[
            ("texture_energy", num(pm.texture_energy)),
            ("pore_index", num(pore_index)),
            ("specular_fraction", num(specular)),
            ("quality_factor", num(qf)),
        ]),
        geometry: Some(geometry(cheeks, pore_index)),
    };

    let tone_stable = quality.grade == QualityGrade::Pass
        && !wb_unstable
        && !quality.has_reason(QualityReason::TooBright)
        && !quality.has_reason(QualityReason::TooDark);
    let tone_score = clamp01(dark.severity_score);
    let tone_base = if tone_stable {
        clamp01(dark.confidence)
    } else {
        UNSTABLE_TONE_CONFIDENCE
    };
    let tone_finding = PhotoFinding {
        finding_id: "pf_tone".into(),
        issue_type: VisualIssue::Tone,
        subtype: "uneven_tone_proxy".into(),
        severity: if tone_stable {
            f64::from(severity_0_4(tone_score))
        } else {
            0.0
        },
        confidence: round3(clamp01(tone_base * penalty)),
        uncertain: !tone_stable,
        evidence: match (tone_stable, lang) {
            (true, Language::En) => format!(
                "From photo: luma-drop={}, hue shift={}.",
                fmt3(dm.luma_drop),
                fmt3(dm.hue_shift)
            ),
            (true, Language::Cn) => format!(
                "From photo: 亮度落差={}，色偏={}。",
                fmt3(dm.luma_drop),
                fmt3(dm.hue_shift)
            ),
            (false, Language::En) => {
                "From photo: uneven-tone signal is uncertain, retake recommended (lighting/WB instability)."
                    .to_string()
            }
            (false, Language::Cn) => {
                "From photo: 光照/白平衡不稳定，暗沉/肤色不均结果不确定，建议重拍。".to_string()
            }
        },
        computed_features: features(&[
            ("luma_drop", num(dm.luma_drop)),
            ("hue_shift", num(dm.hue_shift)),
            ("white_balance_unstable", FeatureValue::Flag(wb_unstable)),
            ("quality_factor", num(qf)),
        ]),
        geometry: Some(geometry(
            full,
            if tone_stable { tone_score } else { UNSTABLE_TONE_HEAT },
        )),
    };

    let photo_findings = vec![redness_finding, shine_finding, texture_finding, tone_finding];
    let takeaways = build_takeaways(&photo_findings, lang);
    Ok(PhotoFindings {
        photo_findings,
        takeaways,
    })
}

fn retake_takeaway(lang: Language) -> Takeaway {
    Takeaway {
        takeaway_id: "tw_photo_quality_retake".into(),
        source: "photo".into(),
        issue_type: "quality".into(),
        text: lang
            .pick(
                "From photo: image quality failed (blur/exposure/WB/coverage), so please retake before analysis.",
                "From photo: 本次图像质量未通过（模糊/曝光/白平衡/覆盖），建议按提示重拍后再继续分析。",
            )
            .to_string(),
        confidence: 1.0,
        linked_finding_ids: Vec::new(),
        linked_issue_types: vec!["quality".into()],
    }
}

fn takeaway_text(issue: VisualIssue, lang: Language) -> Option<&'static str> {
    let text = match issue {
        VisualIssue::Redness => lang.pick(
            "From photo: redness signals are elevated, so prioritize gentle cleansing, barrier repair, and lower active stacking.",
            "From photo: 泛红信号偏高，先用温和清洁+修护保湿，并降低强活性叠加频率。",
        ),
        VisualIssue::Shine => lang.pick(
            "From photo: T-zone shine/specular highlights are elevated, so keep SPF consistent and avoid heavy occlusive layering.",
            "From photo: T 区油光/镜面反射偏高，白天重视防晒并避免厚重封闭型叠加。",
        ),
        VisualIssue::Texture => lang.pick(
            "From photo: texture/pore signals are elevated; start with low-frequency gentle exfoliation and watch the 72-hour response.",
            "From photo: 纹理/毛孔信号偏高，建议从低频温和焕肤开始，并观察 72 小时反应。",
        ),
        VisualIssue::Tone => lang.pick(
            "From photo: uneven-tone signals are present; lock in daily SPF first, then add gentle brightening.",
            "From photo: 肤色不均信号存在，建议优先稳定防晒，再逐步加入温和提亮。",
        ),
        VisualIssue::Acne | VisualIssue::Unsupported => return None,
    };
    Some(text)
}

/// One takeaway per elevated or uncertain finding, at most eight.
#[must_use]
pub fn build_takeaways(findings: &[PhotoFinding], lang: Language) -> Vec<Takeaway> {
    let mut out = Vec::new();
    for f in findings {
        let issue = f.issue_type.as_str();
        let make = |id: String, text: &str| Takeaway {
            takeaway_id: id,
            source: "photo".into(),
            issue_type: issue.to_string(),
            text: text.to_string(),
            confidence: round3(clamp01(f.confidence)),
            linked_finding_ids: vec![f.finding_id.clone()],
            linked_issue_types: vec![issue.to_string()],
        };
        if f.uncertain {
            out.push(make(
                format!("tw_photo_{issue}_uncertain"),
                lang.pick(
                    "From photo: lighting/white balance is unstable, so uneven-tone assessment is uncertain; retake in daylight.",
                    "From photo: 光照或白平衡不稳定，暗沉/肤色不均暂不下结论，建议自然光重拍后再评估。",
                ),
            ));
            continue;
        }
        if f.severity <= 0.0 {
            continue;
        }
        if let Some(text) = takeaway_text(f.issue_type, lang) {
            out.push(make(format!("tw_photo_{issue}"), text));
        }
    }
    out.truncate(MAX_TAKEAWAYS_FROM_FINDINGS);
    out
}

/// Summary notes for a non-passing grade and unstable white balance.
#[must_use]
pub fn summary_notes(quality: &QualityReport, lang: Language) -> Vec<String> {
    let mut notes = Vec::new();
    if quality.grade != QualityGrade::Pass {
        notes.push(match lang {
            Language::En => format!(
                "photo_quality={} (more conservative; retake in daylight for accuracy)",
                quality.grade
            ),
            Language::Cn => format!(
                "照片质量={}（置信度会更保守；建议自然光重拍提升准确度）",
                quality.grade
            ),
        });
    }
    if quality.white_balance_unstable() {
        notes.push(
            lang.pick(
                "White balance unstable: dark spot assessment is conservative.",
                "白平衡不稳定：色沉/暗沉判断将更保守。",
            )
            .to_string(),
        );
    }
    notes.truncate(MAX_NOTES);
    notes
}

/// Condenses a diagnosis into the fields response policy keys on.
#[must_use]
pub fn summarize_for_policy(issues: &[IssueFinding], quality: &QualityReport) -> PolicySummary {
    let mut sorted: Vec<&IssueFinding> = issues.iter().collect();
    sorted.sort_by(|a, b| {
        b.severity_level
            .cmp(&a.severity_level)
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });

    let pass = quality.grade == QualityGrade::Pass;
    let top_level = sorted.first().map_or(0, |f| f.severity_level);
    let top_conf = sorted.first().map_or(0.0, |f| f.confidence);

    let detector_confidence_level = if pass && top_level >= 2 && top_conf >= 0.75 {
        ConfidenceLevel::High
    } else if pass && top_level >= 1 && top_conf >= 0.55 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };

    let mut uncertainty_reasons = Vec::new();
    if !pass {
        uncertainty_reasons.push(format!("quality_{}", quality.grade));
    }
    if top_conf < 0.6 {
        uncertainty_reasons.push("low_top_confidence".to_string());
    }
    if let [first, second, ..] = sorted.as_slice() {
        if (first.severity_score - second.severity_score).abs() < 0.06 {
            uncertainty_reasons.push("top2_close".to_string());
        }
    }

    let top_issue_types = sorted
        .iter()
        .filter(|f| f.severity_level > 0)
        .map(|f| f.issue_type)
        .take(MAX_TOP_ISSUES)
        .collect();

    PolicySummary {
        schema_version: POLICY_SCHEMA.to_string(),
        detector_confidence_level,
        uncertainty: !uncertainty_reasons.is_empty(),
        uncertainty_reasons,
        top_issue_types,
    }
}
