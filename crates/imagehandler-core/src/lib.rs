//! Image Handler Core Library
//!
//! This crate provides the settings surface, error taxonomy, request parameter
//! model and the request fingerprint that are shared across all image handler
//! components.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod params;

// Re-export commonly used types
pub use config::{Config, ConfigError, HandlerSettings, Interpolation, LockGranularity, MAX_DIMENSION};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use fingerprint::{CacheId, Fingerprint};
pub use params::{InvalidParameter, RequestParams};
