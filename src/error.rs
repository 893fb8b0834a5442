//! Error types for stream construction, collection, and stage failures.

use thiserror::Error;

/// Boxed cause carried by a failing stage.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by streams and collectors.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The value handed to [`stream`](crate::stream) cannot act as a source.
    #[error("invalid source: {0}")]
    InvalidSource(String),

    /// A collector was handed an iterator it cannot drive.
    #[error("collector cannot drive iterator: {0}")]
    CollectorType(String),

    /// A stage rejected an element and the collector propagated the failure.
    #[error("stage {stage} ({name}) failed on element {index}: {source}")]
    Stage {
        stage: usize,
        name: &'static str,
        index: usize,
        #[source]
        source: BoxError,
    },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
