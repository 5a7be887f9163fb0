//! Progress reporting on stderr using indicatif.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use skin_diag_core::{PhotoReport, ProgressEvent, ProgressSink, QualityGrade};

/// Progress bar, or per-photo status lines when no bar is shown.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl ProgressBar {
    /// Creates the reporter.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of photos, if known
    /// * `quiet` - Suppress all output
    /// * `show_bar` - Draw a bar; otherwise only notable photos get a line
    #[must_use]
    pub fn new(total: Option<u64>, quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = show_bar.then(|| {
            let bar = total.map_or_else(IndicatifBar::new_spinner, IndicatifBar::new);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });

        Self { bar, quiet }
    }
}

/// Grade of a report's diagnosis when the photo was not a clean pass.
fn notable_grade(report: &PhotoReport) -> Option<QualityGrade> {
    report
        .diagnosis
        .as_ref()
        .map(|d| d.quality.grade)
        .filter(|grade| *grade != QualityGrade::Pass)
}

impl ProgressSink for ProgressBar {
    #[allow(clippy::cast_possible_truncation)]
    fn on_event(&self, event: ProgressEvent) {
        if self.quiet {
            return;
        }

        match event {
            ProgressEvent::Started { path, index, total } => {
                if let Some(bar) = &self.bar {
                    if let Some(t) = total {
                        bar.set_length(t as u64);
                    }
                    bar.set_position(index as u64);
                    bar.set_message(path);
                }
            }
            ProgressEvent::Completed { report } => {
                let grade = notable_grade(&report);
                match (&self.bar, grade) {
                    (Some(bar), Some(grade)) => {
                        bar.println(format!("{}: photo quality {grade}", report.path));
                        bar.inc(1);
                    }
                    (Some(bar), None) => bar.inc(1),
                    (None, Some(grade)) => eprintln!("{}: photo quality {grade}", report.path),
                    (None, None) => {}
                }
            }
            ProgressEvent::Skipped {
                path,
                reason,
                message,
            } => {
                let line = match reason {
                    Some(code) => format!("WARN: {path} failed ({code}): {message}"),
                    None => format!("WARN: Skipping {path}: {message}"),
                };
                match &self.bar {
                    Some(bar) => {
                        bar.println(line);
                        bar.inc(1);
                    }
                    None => eprintln!("{line}"),
                }
            }
            ProgressEvent::Finished { processed, skipped } => {
                if let Some(bar) = &self.bar {
                    bar.finish_with_message(format!("{processed} diagnosed, {skipped} skipped"));
                }
            }
        }
    }
}
