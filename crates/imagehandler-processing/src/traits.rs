//! Core traits for image transforms
//!
//! This module defines the contract every pipeline step implements.

use async_trait::async_trait;
use image::DynamicImage;

use crate::error::{ProcessingError, ProcessingResult};

/// One step of a transform pipeline.
///
/// A step is immutable once built. It consumes the image it is given and
/// returns a new one, and it never touches state shared with other steps.
#[async_trait]
pub trait TransformStep: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Stable description of everything that affects the output.
    ///
    /// Two steps with equal fragments must produce identical images for the
    /// same input. The fragment feeds the request fingerprint.
    fn fragment(&self) -> String;

    /// Apply the step. On error the pipeline stops and no partial image is kept.
    async fn apply(&self, image: DynamicImage) -> ProcessingResult<DynamicImage>;
}

/// Run CPU-bound raster work on the blocking pool.
pub(crate) async fn offload<F>(work: F) -> ProcessingResult<DynamicImage>
where
    F: FnOnce() -> ProcessingResult<DynamicImage> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ProcessingError::TaskFailed(e.to_string()))?
}
