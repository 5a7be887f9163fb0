//! JSON output adapter.

use anyhow::{anyhow, Result};
use skin_diag_core::{PhotoReport, ResultOutput};
use std::io::{self, Write};
use std::sync::Mutex;

/// Writes photo reports as JSON Lines or as one JSON array.
///
/// In array mode reports are held back until [`ResultOutput::flush`], which
/// writes everything received so far as a single array. Flush once, after
/// the last report.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    array: Option<PendingArray>,
}

struct PendingArray {
    pretty: bool,
    reports: Mutex<Vec<PhotoReport>>,
}

impl JsonOutput {
    /// One JSON object per line on stdout.
    #[must_use]
    pub fn stdout_lines() -> Self {
        Self::lines(Box::new(io::stdout()))
    }

    /// A single JSON array on stdout.
    #[must_use]
    pub fn stdout_array(pretty: bool) -> Self {
        Self::array(Box::new(io::stdout()), pretty)
    }

    /// One JSON object per line on `writer`.
    #[must_use]
    pub fn lines(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            array: None,
        }
    }

    /// A single JSON array on `writer`, written at flush.
    #[must_use]
    pub fn array(writer: Box<dyn Write + Send>, pretty: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            array: Some(PendingArray {
                pretty,
                reports: Mutex::new(Vec::new()),
            }),
        }
    }

    #[allow(clippy::significant_drop_tightening)]
    fn write_line(&self, json: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

impl ResultOutput for JsonOutput {
    fn write(&self, report: &PhotoReport) -> Result<()> {
        match &self.array {
            Some(pending) => {
                pending
                    .reports
                    .lock()
                    .map_err(|e| anyhow!("Lock poisoned: {e}"))?
                    .push(report.clone());
                Ok(())
            }
            None => self.write_line(&serde_json::to_string(report)?),
        }
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        if let Some(pending) = &self.array {
            let reports = std::mem::take(
                &mut *pending
                    .reports
                    .lock()
                    .map_err(|e| anyhow!("Lock poisoned: {e}"))?,
            );
            let json = if pending.pretty {
                serde_json::to_string_pretty(&reports)?
            } else {
                serde_json::to_string(&reports)?
            };
            self.write_line(&json)?;
        }
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use skin_diag_core::domain::SegmentError;
    use skin_diag_core::AnalysisError;
    use std::sync::Arc;

    /// A writer whose bytes stay readable after the output takes ownership.
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn report(path: &str) -> PhotoReport {
        let err = AnalysisError::from(SegmentError::NotFound);
        PhotoReport::failure(path, "2024-01-01T00:00:00Z", &err)
    }

    #[test]
    fn test_jsonl_one_object_per_line() {
        let buf = Shared::default();
        let output = JsonOutput::lines(Box::new(buf.clone()));
        output.write(&report("a.png")).unwrap();
        output.write(&report("b.png")).unwrap();
        output.flush().unwrap();

        let text = buf.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["path"], "a.png");
        assert_eq!(first["reason"], "skin_roi_not_found");
    }

    #[test]
    fn test_array_is_written_at_flush() {
        let buf = Shared::default();
        let output = JsonOutput::array(Box::new(buf.clone()), true);
        output.write(&report("a.png")).unwrap();
        output.write(&report("b.png")).unwrap();
        assert!(buf.text().is_empty());

        output.flush().unwrap();
        let text = buf.text();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert!(text.contains("\n  "));
    }

    #[test]
    fn test_empty_array_still_prints_brackets() {
        let buf = Shared::default();
        let output = JsonOutput::array(Box::new(buf.clone()), false);
        output.flush().unwrap();
        assert_eq!(buf.text().trim(), "[]");
    }
}
