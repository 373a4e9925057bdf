//! Image Handler Storage Library
//!
//! This crate provides the server-side image cache: the [`ImageStore`] trait
//! and its disk implementation.
//!
//! # Entry naming
//!
//! Every entry lives directly in the cache root and is named after the
//! request's cache identifier:
//!
//! - **TTL-bound**: `{id}_{expiry}.tmp`, where `expiry` is unix epoch milliseconds
//! - **Source-bound**: `{id}.tmp`, fresh while newer than the source file
//!
//! Writes go to a `.writing-*` temporary file first and are renamed into place,
//! so a reader never observes a partial entry.

pub mod disk;
pub(crate) mod entry;
pub mod locks;
pub mod traits;

// Re-export commonly used types
pub use disk::DiskImageStore;
pub use locks::LockTable;
pub use traits::{CacheStoreError, CacheStoreResult, CachedImage, EntryBinding, ImageStore};
