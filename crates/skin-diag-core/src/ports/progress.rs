//! Progress reporting port for UI integration.

use crate::domain::{FailureReason, PhotoReport};

/// Events emitted while a batch of photos is analysed.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Analysis started for a photo.
    Started {
        /// Path to the photo.
        path: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Total photos in batch, if known.
        total: Option<usize>,
    },
    /// Analysis produced a diagnosis.
    Completed {
        /// The report.
        report: Box<PhotoReport>,
    },
    /// A photo could not be read, or its analysis failed closed.
    Skipped {
        /// Path to the photo.
        path: String,
        /// Fail-closed reason, when analysis ran.
        reason: Option<FailureReason>,
        /// Human-readable message.
        message: String,
    },
    /// All photos have been processed.
    Finished {
        /// Photos that produced a diagnosis.
        processed: usize,
        /// Photos that failed.
        skipped: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
