//! Per-identifier locking for the disk cache.
//!
//! Identifiers hash onto a fixed table of async mutexes. Requests for
//! different identifiers usually land on different stripes and proceed in
//! parallel; requests for the same identifier always share one. A table with
//! a single stripe is the global lock.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use imagehandler_core::{CacheId, LockGranularity};
use tokio::sync::{Mutex, MutexGuard};

pub struct LockTable {
    stripes: Vec<Mutex<()>>,
}

impl LockTable {
    pub fn new(granularity: LockGranularity) -> Self {
        let stripes = (0..granularity.stripes()).map(|_| Mutex::new(())).collect();
        LockTable { stripes }
    }

    /// Wait for exclusive access to `id`.
    pub async fn lock(&self, id: &CacheId) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe_of(id)].lock().await
    }

    fn stripe_of(&self, id: &CacheId) -> usize {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }
}
