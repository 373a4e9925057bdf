use std::time::Duration;

use imagehandler_core::InvalidParameter;
use thiserror::Error;

/// Errors raised while building or running a transform pipeline.
///
/// The orchestrator recovers from every one of these by serving the fallback
/// image.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameter),

    #[error("Invalid transform options: {0}")]
    InvalidOptions(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Font unavailable: {0}")]
    Font(String),

    #[error("Barcode encoding failed: {0}")]
    Barcode(String),

    #[error("Remote fetch failed: {0}")]
    RemoteFetch(String),

    #[error("Page capture failed: {0}")]
    Capture(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Processing task failed: {0}")]
    TaskFailed(String),
}

impl From<reqwest::Error> for ProcessingError {
    fn from(err: reqwest::Error) -> Self {
        ProcessingError::RemoteFetch(err.to_string())
    }
}

/// Result type for processing operations
pub type ProcessingResult<T> = Result<T, ProcessingError>;
