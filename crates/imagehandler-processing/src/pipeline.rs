//! Transform pipeline for chaining image operations

use std::sync::Arc;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};

use crate::error::ProcessingResult;
use crate::traits::TransformStep;

/// Ordered list of transform steps.
///
/// Order matters twice: for the pixels that come out and for the request
/// fingerprint built from [`Pipeline::fragments`].
#[derive(Clone)]
pub struct Pipeline {
    steps: Vec<Arc<dyn TransformStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step
    pub fn push(&mut self, step: impl TransformStep + 'static) {
        self.steps.push(Arc::new(step));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Fingerprint fragments in pipeline order
    pub fn fragments(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.fragment()).collect()
    }

    /// Fold every step over `image`, stopping at the first failure.
    pub async fn execute(&self, mut image: DynamicImage) -> ProcessingResult<DynamicImage> {
        for (index, step) in self.steps.iter().enumerate() {
            let start = Instant::now();
            image = match step.apply(image).await {
                Ok(next) => next,
                Err(e) => {
                    tracing::warn!(
                        step = step.name(),
                        index,
                        error = %e,
                        "Transform step failed, aborting pipeline"
                    );
                    return Err(e);
                }
            };
            let (width, height) = image.dimensions();
            tracing::debug!(
                step = step.name(),
                index,
                width,
                height,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Transform step applied"
            );
        }

        Ok(image)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
