//! Calibration-table loader.

use anyhow::{Context, Result};
use skin_diag_core::calibration::CalibrationTable;
use skin_diag_core::IssueType;
use std::path::Path;
use tracing::{info, warn};

/// Reads a calibration table from a JSON file.
///
/// The file has the shape `{"issues": {"<issue>": {"method": ...}}}`.
/// Entries for unknown issue names are kept but logged, since they can
/// never apply.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid table.
pub fn load_calibration(path: &Path) -> Result<CalibrationTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read calibration file: {}", path.display()))?;
    let table = parse_calibration(&text)
        .with_context(|| format!("Invalid calibration file: {}", path.display()))?;
    info!(path = %path.display(), issues = table.issues.len(), "loaded calibration table");
    Ok(table)
}

/// Parses a calibration table from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not a valid table.
pub fn parse_calibration(text: &str) -> Result<CalibrationTable> {
    let table: CalibrationTable = serde_json::from_str(text)?;
    for name in table.issues.keys() {
        if IssueType::from_name(name).is_none() {
            warn!(issue = %name, "calibration entry for unknown issue type");
        }
    }
    Ok(table)
}
