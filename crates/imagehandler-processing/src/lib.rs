//! Image Handler Processing Library
//!
//! This crate provides the transform pipeline: the [`TransformStep`] contract,
//! the [`Pipeline`] executor that folds steps over an image, the output codec
//! and every concrete transform the handler can schedule.

pub mod capture;
pub mod codec;
pub mod color;
pub mod error;
pub mod fonts;
pub mod pipeline;
pub(crate) mod text;
pub mod traits;
pub mod transforms;

// Re-export commonly used types
pub use capture::{HttpPageCapture, PageCapture, UnavailableCapture};
pub use codec::OutputFormat;
pub use error::{ProcessingError, ProcessingResult};
pub use fonts::FontLibrary;
pub use pipeline::Pipeline;
pub use traits::TransformStep;
