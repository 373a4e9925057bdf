//! Image cache abstraction
//!
//! This module defines the ImageStore trait the request orchestrator talks to.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use imagehandler_core::CacheId;
use thiserror::Error;

/// Cache store errors
///
/// These never reach a client: the store logs them and degrades to a miss or
/// a skipped write.
#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

/// Result type for cache store operations
pub type CacheStoreResult<T> = Result<T, CacheStoreError>;

/// How the freshness of a stored entry is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryBinding {
    /// Fresh until the given instant.
    Expires(DateTime<Utc>),
    /// Fresh while the entry is newer than the source file it was rendered from.
    Source,
}

/// A cache hit.
#[derive(Debug, Clone)]
pub struct CachedImage {
    pub bytes: Bytes,
    /// When the entry was written.
    pub last_modified: DateTime<Utc>,
}

/// Server-side image cache
///
/// Both operations are infallible from the caller's point of view: failures
/// are logged and surface as a miss or as a write that did not happen.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Return the cached bytes for `id` if a fresh entry exists.
    ///
    /// With `source`, only a source-bound entry newer than the source counts.
    /// Without it, only a TTL-bound entry whose expiry is after `now` counts.
    /// Stale entries are deleted.
    async fn try_serve(
        &self,
        id: &CacheId,
        source: Option<&Path>,
        now: DateTime<Utc>,
    ) -> Option<CachedImage>;

    /// Persist `bytes` as the single entry for `id`.
    async fn store(&self, id: &CacheId, bytes: Bytes, binding: EntryBinding);
}
