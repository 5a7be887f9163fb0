//! Photo source port for reading raw photo bytes.

/// An undecoded photo and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePhoto {
    /// Path or other identifier shown in reports.
    pub path: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// Port for enumerating photos to analyse.
pub trait PhotoSource: Send + Sync {
    /// Returns an iterator over photos from this source.
    ///
    /// # Errors
    ///
    /// Individual items may be errors if a photo cannot be read.
    fn photos(&self) -> Box<dyn Iterator<Item = anyhow::Result<SourcePhoto>> + Send + '_>;

    /// Returns the total number of photos, if known.
    fn count_hint(&self) -> Option<usize>;
}
