//! Analyze command - diagnose skin photos.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Deserialize;
use skin_diag_adapters::{load_calibration, FsPhotoSource};
use skin_diag_core::calibration::CalibrationTable;
use skin_diag_core::domain::{PhotoReport, ProfileSummary, RecentLog, DEFAULT_MARGIN_SCALE};
use skin_diag_core::{
    AnalysisOptions, Language, PhotoSource, ProgressEvent, ProgressSink, ResultOutput,
    SkinAnalyzer,
};
use tracing::{debug, info, warn};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Language of generated text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LanguageArg {
    /// English
    #[default]
    En,
    /// Simplified Chinese
    Cn,
}

impl LanguageArg {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en" => Some(Self::En),
            "cn" => Some(Self::Cn),
            _ => None,
        }
    }
}

impl From<LanguageArg> for Language {
    fn from(value: LanguageArg) -> Self {
        match value {
            LanguageArg::En => Self::En,
            LanguageArg::Cn => Self::Cn,
        }
    }
}

/// Parse and validate a positive margin scale.
fn parse_margin_scale(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not a positive number"))
    }
}

/// Caller context read from `--context`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CallerContext {
    /// User goals.
    pub profile: ProfileSummary,
    /// Self-reported logs, most recent first.
    pub recent_logs: Vec<RecentLog>,
}

/// Shared arguments for photo analysis.
#[derive(Args, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct AnalyzeArgs {
    /// Photo files or directories to analyze
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Language of generated text
    #[arg(long, value_enum)]
    pub lang: Option<LanguageArg>,

    /// Also build the module card for usable photos
    #[arg(long)]
    pub module_card: bool,

    /// Confidence calibration table (JSON)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Caller context with profile goals and recent logs (JSON)
    #[arg(long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Margin around the skin region used for the face crop
    #[arg(long, value_parser = parse_margin_scale)]
    pub margin_scale: Option<f64>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl AnalyzeArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }

        if args.lang.is_none() {
            args.lang = config
                .general
                .language
                .as_deref()
                .and_then(LanguageArg::parse);
        }

        if !args.module_card {
            args.module_card = config.modules.enabled.unwrap_or(false);
        }

        if args.calibration.is_none() {
            args.calibration.clone_from(&config.calibration.path);
        }

        args.margin_scale = args.margin_scale.or(config.general.margin_scale);

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }

        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        args.config = Some(config.clone());

        args
    }

    /// Get language with fallback to English.
    fn language(&self) -> Language {
        self.lang.unwrap_or_default().into()
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Jsonl)
    }

    /// Builds analyzer options from the merged arguments and config.
    ///
    /// A calibration file that cannot be loaded is reported and replaced by
    /// the identity table; a bad context file is an error.
    fn analysis_options(&self) -> Result<AnalysisOptions> {
        let config = self.config.clone().unwrap_or_default();

        let calibration = match &self.calibration {
            Some(path) => load_calibration(path).unwrap_or_else(|e| {
                warn!("{e:#}");
                eprintln!("warning: {e:#}; using identity calibration");
                CalibrationTable::identity()
            }),
            None => CalibrationTable::identity(),
        };

        let mut context = match &self.context {
            Some(path) => load_context(path)?,
            None => CallerContext::default(),
        };
        if context.profile.goals.is_empty() {
            if let Some(goals) = &config.general.goals {
                context.profile.goals.clone_from(goals);
            }
        }

        Ok(AnalysisOptions {
            language: self.language(),
            profile: context.profile,
            recent_logs: context.recent_logs,
            quality_gate: config.quality.unwrap_or_default(),
            threshold_overrides: config.thresholds.clone(),
            calibration,
            margin_scale: self.margin_scale.unwrap_or(DEFAULT_MARGIN_SCALE),
            modules: config.module_mask_config(),
        })
    }
}

/// Reads the caller context JSON file.
fn load_context(path: &Path) -> Result<CallerContext> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read context file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid context file: {}", path.display()))
}

/// Result of running the analyze command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct AnalyzeResult {
    /// Number of photos that produced a diagnosis.
    pub processed: usize,
    /// Number of photos that were unreadable or failed closed.
    pub skipped: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the analyze command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &AnalyzeArgs) -> Result<AnalyzeResult> {
    info!("Running analyze command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    let analyzer = SkinAnalyzer::new(args.analysis_options()?);

    let source = FsPhotoSource::new(args.paths.clone(), args.recursive);
    let total = source.count_hint();

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress_bar = ProgressBar::new(total.map(|t| t as u64), args.quiet, show_progress);

    let output = match args.format() {
        OutputFormat::Jsonl => JsonOutput::stdout_lines(),
        OutputFormat::Json => JsonOutput::stdout_array(args.pretty),
    };

    process_photos(&source, &analyzer, &output, &progress_bar, args.module_card)
}

/// Analyzes every photo from `source` and writes a report for each readable one.
///
/// Photos that fail closed still get a report, carrying the reason code.
/// Unreadable photos only produce a `Skipped` event.
fn process_photos(
    source: &dyn PhotoSource,
    analyzer: &SkinAnalyzer,
    output: &dyn ResultOutput,
    progress: &dyn ProgressSink,
    module_card: bool,
) -> Result<AnalyzeResult> {
    let total = source.count_hint();
    let mut processed = 0usize;
    let mut skipped = 0usize;

    for (index, photo_result) in source.photos().enumerate() {
        let photo = match photo_result {
            Ok(photo) => photo,
            Err(e) => {
                // The message carries the path via anyhow context
                progress.on_event(ProgressEvent::Skipped {
                    path: format!("photo {index}"),
                    reason: None,
                    message: format!("{e:#}"),
                });
                skipped += 1;
                continue;
            }
        };

        progress.on_event(ProgressEvent::Started {
            path: photo.path.clone(),
            index,
            total,
        });

        let report = match analyzer.analyze(&photo.bytes) {
            Ok(analysis) => {
                let card = if module_card {
                    analyzer.module_card(&analysis)
                } else {
                    None
                };
                let report = PhotoReport::success(&photo.path, iso_timestamp(), analysis, card);
                progress.on_event(ProgressEvent::Completed {
                    report: Box::new(report.clone()),
                });
                processed += 1;
                report
            }
            Err(e) => {
                debug!(path = %photo.path, reason = %e.reason(), "analysis failed closed");
                let report = PhotoReport::failure(&photo.path, iso_timestamp(), &e);
                progress.on_event(ProgressEvent::Skipped {
                    path: photo.path.clone(),
                    reason: Some(e.reason()),
                    message: report.error.clone().unwrap_or_default(),
                });
                skipped += 1;
                report
            }
        };

        output.write(&report)?;
    }

    output.flush()?;

    progress.on_event(ProgressEvent::Finished { processed, skipped });

    let exit_code = if skipped > 0 {
        ExitCode::PhotosFailed
    } else {
        ExitCode::Success
    };

    Ok(AnalyzeResult {
        processed,
        skipped,
        exit_code,
    })
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
