//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the analysis core and external adapters.

mod photo_source;
mod progress;
mod result_output;

pub use photo_source::{PhotoSource, SourcePhoto};
pub use progress::{ProgressEvent, ProgressSink};
pub use result_output::ResultOutput;
