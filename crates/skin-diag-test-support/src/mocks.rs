//! Mock implementations of core port traits.

use std::sync::{Arc, Mutex, PoisonError};

use skin_diag_core::domain::{FailureReason, PhotoReport, QualityGrade};
use skin_diag_core::ports::{PhotoSource, ProgressEvent, ProgressSink, ResultOutput, SourcePhoto};

/// Mock implementation of `PhotoSource` for testing.
///
/// Yields pre-encoded photos, optionally interleaved with read errors, and
/// tracks iteration for assertions.
pub struct MockPhotoSource {
    photos: Vec<Result<SourcePhoto, String>>,
    iteration_count: Arc<Mutex<usize>>,
}

impl MockPhotoSource {
    /// Creates a new mock source with the given photos.
    #[must_use]
    pub fn new(photos: Vec<SourcePhoto>) -> Self {
        Self {
            photos: photos.into_iter().map(Ok).collect(),
            iteration_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an empty mock source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Appends an entry that fails to read with `message`.
    #[must_use]
    pub fn with_read_error(mut self, message: impl Into<String>) -> Self {
        self.photos.push(Err(message.into()));
        self
    }

    /// Returns the number of times the source has been iterated.
    #[must_use]
    pub fn iteration_count(&self) -> usize {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PhotoSource for MockPhotoSource {
    fn photos(&self) -> Box<dyn Iterator<Item = anyhow::Result<SourcePhoto>> + Send + '_> {
        let count = Arc::clone(&self.iteration_count);
        if let Ok(mut c) = count.lock() {
            *c += 1;
        }
        Box::new(self.photos.iter().map(|entry| match entry {
            Ok(photo) => Ok(photo.clone()),
            Err(message) => Err(anyhow::anyhow!("{message}")),
        }))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.photos.len())
    }
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures reports for later assertions.
pub struct MockResultOutput {
    results: Arc<Mutex<Vec<PhotoReport>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns all captured reports.
    #[must_use]
    pub fn results(&self) -> Vec<PhotoReport> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockResultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, report: &PhotoReport) -> anyhow::Result<()> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Ok(mut c) = self.flush_count.lock() {
            *c += 1;
        }
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Paths of `Started` events, in order.
    #[must_use]
    pub fn started_paths(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Started { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    /// Paths of the reports carried by `Completed` events, in order.
    #[must_use]
    pub fn completed_paths(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Completed { report } => Some(report.path),
                _ => None,
            })
            .collect()
    }

    /// Quality grades of the diagnoses carried by `Completed` events.
    #[must_use]
    pub fn completed_grades(&self) -> Vec<QualityGrade> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Completed { report } => report.diagnosis.map(|d| d.quality.grade),
                _ => None,
            })
            .collect()
    }

    /// Returns the reasons carried by `Skipped` events, in order.
    #[must_use]
    pub fn skip_reasons(&self) -> Vec<Option<FailureReason>> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Skipped { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect()
    }

    /// Returns the final counts from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { processed, skipped } => Some((*processed, *skipped)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::SyntheticSkinBuilder;
    use skin_diag_core::domain::{AnalysisError, SegmentError};

    #[test]
    fn test_mock_photo_source_empty() {
        let source = MockPhotoSource::empty();
        assert_eq!(source.count_hint(), Some(0));
        assert_eq!(source.photos().count(), 0);
        assert_eq!(source.iteration_count(), 1);
    }

    #[test]
    fn test_mock_photo_source_with_photos_and_errors() {
        let photo = SyntheticSkinBuilder::new(8, 8).photo("face.png");
        let source = MockPhotoSource::new(vec![photo]).with_read_error("unreadable");

        assert_eq!(source.count_hint(), Some(2));
        let items: Vec<_> = source.photos().collect();
        assert_eq!(items[0].as_ref().unwrap().path, "face.png");
        assert_eq!(items[1].as_ref().unwrap_err().to_string(), "unreadable");
    }

    #[test]
    fn test_mock_result_output() {
        let output = MockResultOutput::new();
        let err = AnalysisError::from(SegmentError::NotFound);
        let report = PhotoReport::failure("test.png", "2024-01-01T00:00:00Z", &err);

        output.write(&report).unwrap();
        output.flush().unwrap();

        assert_eq!(output.results().len(), 1);
        assert_eq!(output.results()[0].path, "test.png");
        assert_eq!(output.flush_count(), 1);
    }

    #[test]
    fn test_mock_progress_sink() {
        let sink = MockProgressSink::new();

        sink.on_event(ProgressEvent::Started {
            path: "test.png".into(),
            index: 0,
            total: Some(1),
        });
        sink.on_event(ProgressEvent::Skipped {
            path: "test.png".into(),
            reason: Some(FailureReason::DecodeFailed),
            message: "failed to decode image".into(),
        });
        sink.on_event(ProgressEvent::Finished {
            processed: 0,
            skipped: 1,
        });

        assert_eq!(sink.started_paths(), vec!["test.png".to_string()]);
        assert!(sink.completed_paths().is_empty());
        assert!(sink.completed_grades().is_empty());
        assert_eq!(sink.skip_reasons(), vec![Some(FailureReason::DecodeFailed)]);
        assert_eq!(sink.finished_counts(), Some((0, 1)));
    }
}
