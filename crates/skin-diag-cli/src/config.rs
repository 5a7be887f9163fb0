//! Configuration file support for skin-diag.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/skin-diag/config.toml` (lowest priority)
//! - Project-local: `.skin-diag.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use skin_diag_core::calibration::ThresholdOverrides;
use skin_diag_core::domain::{ModuleId, NormBox};
use skin_diag_core::modules::ShrinkFactors;
use skin_diag_core::quality::QualityGateConfig;
use skin_diag_core::ModuleMaskConfig;
use tracing::{debug, info, warn};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Quality gate floors, replacing the defaults wholesale when present.
    pub quality: Option<QualityGateConfig>,
    /// Severity cut points: `issue -> region -> [t1, t2, t3]`.
    pub thresholds: ThresholdOverrides,
    /// Calibration table settings.
    pub calibration: CalibrationConfig,
    /// Module card settings.
    pub modules: ModulesConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
    /// Output language: "en" or "cn".
    pub language: Option<String>,
    /// Margin applied around the skin bbox for the face crop.
    pub margin_scale: Option<f64>,
    /// Skincare goals fed to the agreement factor.
    pub goals: Option<Vec<String>>,
}

/// Calibration table configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Path to a calibration JSON file.
    pub path: Option<PathBuf>,
}

/// Module card configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Build the module card by default.
    pub enabled: Option<bool>,
    /// Mask grid side length (1-256).
    pub grid: Option<usize>,
    /// Lowest plausible skin-mask ratio.
    pub skin_ratio_min: Option<f64>,
    /// Highest plausible skin-mask ratio.
    pub skin_ratio_max: Option<f64>,
    /// Absolute floor on kept pixels.
    pub min_kept_pixels: Option<usize>,
    /// Relative floor on kept pixels.
    pub min_kept_ratio: Option<f64>,
    /// Clip modules to the default face oval.
    pub face_oval: Option<bool>,
    /// Per-module shrink factors.
    pub shrink: Option<ShrinkFactors>,
    /// Module box overrides keyed by module id.
    pub boxes: BTreeMap<String, [f64; 4]>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/skin-diag/config.toml`
    /// 2. Project-local: `.skin-diag.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as
    /// warnings and dropped.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        for problem in config.sanitize() {
            eprintln!("warning: {problem}");
        }

        config
    }

    /// Drops values outside their accepted ranges, returning one message per
    /// dropped value.
    fn sanitize(&mut self) -> Vec<String> {
        let mut problems = Vec::new();
        let unit = |v: f64| (0.0..=1.0).contains(&v);

        if let Some(ref lang) = self.general.language {
            if !matches!(lang.to_lowercase().as_str(), "en" | "cn") {
                problems.push(format!("general.language must be 'en' or 'cn', got '{lang}'"));
                self.general.language = None;
            }
        }
        if let Some(m) = self.general.margin_scale {
            if !(m.is_finite() && m > 0.0) {
                problems.push(format!("general.margin_scale must be positive, got {m}"));
                self.general.margin_scale = None;
            }
        }
        if let Some(g) = self.modules.grid {
            if !(1..=ModuleMaskConfig::MAX_GRID).contains(&g) {
                problems.push(format!("modules.grid must be 1-256, got {g}"));
                self.modules.grid = None;
            }
        }
        for (name, slot) in [
            ("modules.skin_ratio_min", &mut self.modules.skin_ratio_min),
            ("modules.skin_ratio_max", &mut self.modules.skin_ratio_max),
            ("modules.min_kept_ratio", &mut self.modules.min_kept_ratio),
        ] {
            if let Some(v) = *slot {
                if !unit(v) {
                    problems.push(format!("{name} must be 0.0-1.0, got {v}"));
                    *slot = None;
                }
            }
        }
        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                problems.push(format!("output.format must be 'json' or 'jsonl', got '{f}'"));
                self.output.format = None;
            }
        }

        problems
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // General
        self.general.recursive = other.general.recursive.or(self.general.recursive);
        self.general.language = other.general.language.or_else(|| self.general.language.take());
        self.general.margin_scale = other.general.margin_scale.or(self.general.margin_scale);
        self.general.goals = other.general.goals.or_else(|| self.general.goals.take());

        // Quality gate
        self.quality = other.quality.or(self.quality);

        // Thresholds merge per issue and region
        for (issue, regions) in other.thresholds {
            self.thresholds.entry(issue).or_default().extend(regions);
        }

        // Calibration
        self.calibration.path = other.calibration.path.or_else(|| self.calibration.path.take());

        // Modules
        let m = other.modules;
        self.modules.enabled = m.enabled.or(self.modules.enabled);
        self.modules.grid = m.grid.or(self.modules.grid);
        self.modules.skin_ratio_min = m.skin_ratio_min.or(self.modules.skin_ratio_min);
        self.modules.skin_ratio_max = m.skin_ratio_max.or(self.modules.skin_ratio_max);
        self.modules.min_kept_pixels = m.min_kept_pixels.or(self.modules.min_kept_pixels);
        self.modules.min_kept_ratio = m.min_kept_ratio.or(self.modules.min_kept_ratio);
        self.modules.face_oval = m.face_oval.or(self.modules.face_oval);
        self.modules.shrink = m.shrink.or(self.modules.shrink);
        self.modules.boxes.extend(m.boxes);

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }

    /// Module mask settings with config values laid over the defaults.
    ///
    /// Box overrides for unknown module ids are skipped with a warning.
    pub fn module_mask_config(&self) -> ModuleMaskConfig {
        let defaults = ModuleMaskConfig::default();
        let m = &self.modules;
        let mut module_boxes = BTreeMap::new();
        for (name, [x, y, w, h]) in &m.boxes {
            match ModuleId::from_name(name) {
                Some(id) => {
                    module_boxes.insert(id, NormBox::new(*x, *y, *w, *h));
                }
                None => warn!(module = %name, "ignoring box override for unknown module"),
            }
        }
        ModuleMaskConfig {
            grid: m.grid.unwrap_or(defaults.grid),
            shrink: m.shrink.unwrap_or(defaults.shrink),
            skin_ratio_min: m.skin_ratio_min.unwrap_or(defaults.skin_ratio_min),
            skin_ratio_max: m.skin_ratio_max.unwrap_or(defaults.skin_ratio_max),
            min_kept_pixels: m.min_kept_pixels.unwrap_or(defaults.min_kept_pixels),
            min_kept_ratio: m.min_kept_ratio.unwrap_or(defaults.min_kept_ratio),
            face_oval: if m.face_oval.unwrap_or(true) {
                defaults.face_oval
            } else {
                None
            },
            module_boxes,
        }
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("skin-diag").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.skin-diag.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".skin-diag.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.general.language.is_none());
        assert!(config.quality.is_none());
        assert!(config.thresholds.is_empty());
        assert!(config.modules.enabled.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[general]
recursive = true
language = 'cn'
margin_scale = 1.3
goals = ['minimize pores']

[quality.fail]
min_coverage = 0.1

[thresholds.pores]
nose = [0.3, 0.5, 0.7]

[calibration]
path = 'cal.json'

[modules]
enabled = true
grid = 32
face_oval = false
boxes = { nose = [0.4, 0.3, 0.2, 0.3] }

[modules.shrink]
chin = 0.7

[output]
format = 'json'
pretty = true
progress = false
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.general.recursive, Some(true));
        assert_eq!(config.general.language.as_deref(), Some("cn"));
        assert_eq!(config.general.margin_scale, Some(1.3));
        let quality = config.quality.unwrap();
        assert_eq!(quality.fail.min_coverage, 0.1);
        assert_eq!(quality.fail.min_blur_factor, 0.2);
        assert_eq!(config.thresholds["pores"]["nose"], vec![0.3, 0.5, 0.7]);
        assert_eq!(config.calibration.path, Some(PathBuf::from("cal.json")));
        assert_eq!(config.modules.grid, Some(32));
        let shrink = config.modules.shrink.unwrap();
        assert_eq!(shrink.chin, 0.7);
        assert_eq!(shrink.forehead, 0.88);
        assert_eq!(config.output.format, Some("json".to_string()));
    }

    // === Config Merge Priority Tests ===

    #[test]
    fn test_merge_preserves_base_when_override_is_none() {
        let mut base: AppConfig = toml::from_str(
            r"
[general]
language = 'cn'

[modules]
grid = 48
min_kept_pixels = 10
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[modules]
grid = 32
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.modules.grid, Some(32));
        assert_eq!(base.modules.min_kept_pixels, Some(10));
        assert_eq!(base.general.language.as_deref(), Some("cn"));
    }

    #[test]
    fn test_merge_thresholds_per_region() {
        let mut base: AppConfig = toml::from_str(
            r"
[thresholds.pores]
nose = [0.3, 0.5, 0.7]
cheeks = [0.2, 0.4, 0.6]
",
        )
        .expect("parse base");
        let override_config: AppConfig = toml::from_str(
            r"
[thresholds.pores]
nose = [0.4, 0.6, 0.8]

[thresholds.acne]
all = [0.1, 0.2, 0.3]
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.thresholds["pores"]["nose"], vec![0.4, 0.6, 0.8]);
        assert_eq!(base.thresholds["pores"]["cheeks"], vec![0.2, 0.4, 0.6]);
        assert_eq!(base.thresholds["acne"]["all"], vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str(
            r"
[output]
format = 'json'
",
        )
        .expect("parse base");

        base.merge(AppConfig::default());

        assert_eq!(base.output.format, Some("json".to_string()));
    }

    // === Invalid TOML Graceful Fallback ===

    #[test]
    fn test_invalid_toml_syntax_handled() {
        let toml = r"
[modules
grid = 32
";
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "invalid TOML should return error");
    }

    #[test]
    fn test_invalid_field_type_handled() {
        let toml = r#"
[modules]
grid = "wide"
"#;
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "type mismatch should return error");
    }

    // === Sanitizing ===

    #[test]
    fn test_sanitize_drops_out_of_range_values() {
        let mut config: AppConfig = toml::from_str(
            r"
[general]
language = 'fr'
margin_scale = -1.0

[modules]
grid = 0
skin_ratio_min = 1.5
min_kept_ratio = 0.5

[output]
format = 'xml'
",
        )
        .expect("parse config");

        let problems = config.sanitize();

        assert_eq!(problems.len(), 5);
        assert!(problems.iter().any(|p| p.contains("general.language")));
        assert!(problems.iter().any(|p| p.contains("modules.grid")));
        assert!(problems.iter().any(|p| p.contains("output.format")));
        assert!(config.general.language.is_none());
        assert!(config.modules.grid.is_none());
        assert!(config.modules.skin_ratio_min.is_none());
        assert_eq!(config.modules.min_kept_ratio, Some(0.5));
    }

    #[test]
    fn test_sanitize_valid_config_is_silent() {
        let mut config: AppConfig = toml::from_str(
            r"
[general]
language = 'EN'

[modules]
grid = 64
",
        )
        .expect("parse config");
        assert!(config.sanitize().is_empty());
    }

    // === Module mask config ===

    #[test]
    fn test_module_mask_config_layers_over_defaults() {
        let config: AppConfig = toml::from_str(
            r"
[modules]
grid = 32
face_oval = false
boxes = { nose = [0.4, 0.3, 0.2, 0.3], ear = [0.0, 0.0, 0.1, 0.1] }
",
        )
        .expect("parse config");

        let cfg = config.module_mask_config();
        assert_eq!(cfg.grid, 32);
        assert!(cfg.face_oval.is_none());
        assert_eq!(cfg.min_kept_pixels, 24);
        assert_eq!(cfg.module_boxes.len(), 1);
        assert_eq!(
            cfg.module_boxes[&ModuleId::Nose],
            NormBox::new(0.4, 0.3, 0.2, 0.3)
        );
    }

    #[test]
    fn test_find_config_in_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(".skin-diag.toml"), "").unwrap();

        let found = find_config_in_parents(&nested).unwrap();
        assert_eq!(found, dir.path().join(".skin-diag.toml"));
    }
}
