//! Image Handler Services Library
//!
//! This crate ties the pieces together: it resolves a request's source,
//! builds its transform pipeline, fingerprints it and serves it from the
//! server cache or by rendering. [`ImageHandler`] is the entry point the HTTP
//! layer calls.

pub mod orchestrator;
pub mod registry;
pub mod source;

// Re-export commonly used types
pub use orchestrator::{ClientCache, ConditionalHeaders, ImageHandler, ImageReply, ReplyStatus};
pub use registry::TransformRegistry;
pub use source::resolve_source;
