//! Image Handler API Library
//!
//! This crate provides the HTTP surface: the `/image` handler that maps
//! requests onto the orchestrator, response header mapping, and application
//! setup.

mod handlers;
mod telemetry;

pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
