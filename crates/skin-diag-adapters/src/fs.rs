//! Filesystem adapter for reading photos.

use anyhow::{Context, Result};
use skin_diag_core::{PhotoSource, SourcePhoto};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions the decoder understands.
const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "webp", "bmp", "gif"];

/// Filesystem photo source adapter.
///
/// Yields raw bytes; decoding belongs to the analyzer so that unreadable
/// images fail closed with a reason code instead of being skipped here.
pub struct FsPhotoSource {
    paths: Vec<PathBuf>,
    recursive: bool,
}

impl FsPhotoSource {
    /// Creates a new filesystem photo source.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self { paths, recursive }
    }

    /// Collects all photo files from the configured paths, directories in
    /// name order.
    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if is_supported_photo(path) {
                    files.push(path.clone());
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                self.collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
        paths.sort();
        for path in paths {
            if path.is_file() && is_supported_photo(&path) {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }
}

impl PhotoSource for FsPhotoSource {
    fn photos(&self) -> Box<dyn Iterator<Item = Result<SourcePhoto>> + Send + '_> {
        let files = self.collect_files();
        debug!("Found {} photo files", files.len());

        Box::new(files.into_iter().map(|path| read_photo(&path)))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.collect_files().len())
    }
}

/// Checks if a path has a supported photo extension.
fn is_supported_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| PHOTO_EXTENSIONS.contains(&e.as_str()))
}

/// Reads a photo's bytes from the filesystem.
fn read_photo(path: &Path) -> Result<SourcePhoto> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read photo: {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "read photo");

    Ok(SourcePhoto {
        path: path.to_string_lossy().into_owned(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_photo() {
        assert!(is_supported_photo(Path::new("face.jpg")));
        assert!(is_supported_photo(Path::new("face.JPEG")));
        assert!(is_supported_photo(Path::new("face.png")));
        assert!(is_supported_photo(Path::new("face.WebP")));
        assert!(!is_supported_photo(Path::new("face.cr2")));
        assert!(!is_supported_photo(Path::new("notes.txt")));
        assert!(!is_supported_photo(Path::new("face")));
    }

    #[test]
    fn test_missing_path_yields_nothing() {
        let source = FsPhotoSource::new(vec![PathBuf::from("/definitely/not/here.png")], false);
        assert_eq!(source.count_hint(), Some(0));
        assert_eq!(source.photos().count(), 0);
    }
}
