//! Short evidence sentences for an issue finding.

use crate::domain::{ConfidenceLabel, IssueMetrics, IssueType, Language, Severity};
use crate::numeric::fmt3;

/// Specular fraction above which the pores text mentions shine.
const STRONG_SHINE: f64 = 0.15;

fn confidence_phrase(confidence: f64, lang: Language) -> &'static str {
    match ConfidenceLabel::from_confidence(confidence) {
        ConfidenceLabel::PrettySure => lang.pick("fairly confident", "较确定"),
        ConfidenceLabel::SomewhatSure => lang.pick("somewhat confident", "中等把握"),
        ConfidenceLabel::NotSure => lang.pick("low confidence", "把握不高"),
    }
}

fn severity_phrase(severity: Severity, lang: Language) -> &'static str {
    match severity {
        Severity::None => lang.pick("no strong signal", "未见明显"),
        Severity::Mild => lang.pick("mild", "轻度"),
        Severity::Moderate => lang.pick("moderate", "中度"),
        Severity::Severe => lang.pick("high", "偏重"),
    }
}

fn overall(sev: &str, conf: &str, suffix: &str, lang: Language) -> String {
    match lang {
        Language::En => format!("Overall: {sev}, {conf}{suffix}."),
        Language::Cn => format!("结论为{sev}，{conf}{suffix}。"),
    }
}

/// Two sentences: what the detector measured, and the overall verdict.
///
/// `suppressed` marks a dark-spot result withheld because of unstable
/// lighting; it replaces both sentences with retake guidance.
#[must_use]
pub fn evidence_text(
    issue: IssueType,
    severity: Severity,
    confidence: f64,
    metrics: &IssueMetrics,
    lang: Language,
    suppressed: bool,
) -> Vec<String> {
    if issue == IssueType::DarkSpots && suppressed {
        return vec![
            lang.pick(
                "Lighting/white balance is unstable; I cannot reliably assess dark spots today.",
                "光照/白平衡不够稳定，本次不可靠判断色沉/暗沉。",
            )
            .to_string(),
            lang.pick(
                "Retake in daylight with no filters to reassess.",
                "建议自然光、无滤镜重拍后再评估。",
            )
            .to_string(),
        ];
    }

    let sev = severity_phrase(severity, lang);
    let conf = confidence_phrase(confidence, lang);
    match (metrics, lang) {
        (IssueMetrics::Acne(m), Language::En) => vec![
            format!(
                "Possible inflamed red spots: {} (density {}).",
                m.acne_count,
                fmt3(m.acne_density)
            ),
            overall(sev, conf, "", lang),
        ],
        (IssueMetrics::Acne(m), Language::Cn) => vec![
            format!("疑似炎性小红点：{} 个（密度 {}）。", m.acne_count, fmt3(m.acne_density)),
            overall(sev, conf, "", lang),
        ],
        (IssueMetrics::Redness(m), Language::En) => vec![
            format!(
                "Redness signals: a* shift {}, red fraction {}.",
                fmt3(m.a_shift),
                fmt3(m.red_fraction)
            ),
            overall(sev, conf, "", lang),
        ],
        (IssueMetrics::Redness(m), Language::Cn) => vec![
            format!("泛红信号：a* 偏移 {}，红区占比 {}。", fmt3(m.a_shift), fmt3(m.red_fraction)),
            overall(sev, conf, "", lang),
        ],
        (IssueMetrics::Pores(m), _) => {
            let shiny = m.specular_fraction > STRONG_SHINE;
            let (first, suffix) = match lang {
                Language::En => (
                    format!("Texture/pore index: {} (with specular correction).", fmt3(m.pore_index)),
                    if shiny { " (strong shine → more conservative)" } else { "" },
                ),
                Language::Cn => (
                    format!("纹理/毛孔指数：{}（油光校正系数已应用）。", fmt3(m.pore_index)),
                    if shiny { "（鼻部油光较强 → 更保守）" } else { "" },
                ),
            };
            vec![first, overall(sev, conf, suffix, lang)]
        }
        (IssueMetrics::DarkSpots(m), Language::En) => vec![
            format!(
                "Dark spot signals: luma_drop {}, hue shift {}.",
                fmt3(m.luma_drop),
                fmt3(m.hue_shift)
            ),
            overall(sev, conf, "", lang),
        ],
        (IssueMetrics::DarkSpots(m), Language::Cn) => vec![
            format!("暗沉/色沉信号：luma_drop {}，色相偏移 {}。", fmt3(m.luma_drop), fmt3(m.hue_shift)),
            overall(sev, conf, "", lang),
        ],
    }
}
