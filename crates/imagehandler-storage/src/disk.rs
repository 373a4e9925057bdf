use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use imagehandler_core::{CacheId, LockGranularity};
use tokio::fs;

use crate::entry::{self, EntryKind};
use crate::locks::LockTable;
use crate::traits::{CacheStoreError, CacheStoreResult, CachedImage, EntryBinding, ImageStore};

const WRITING_PREFIX: &str = ".writing-";

/// Disk-backed image cache
pub struct DiskImageStore {
    root: PathBuf,
    locks: LockTable,
}

impl DiskImageStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>, locking: LockGranularity) -> CacheStoreResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            CacheStoreError::ConfigError(format!(
                "Failed to create cache directory {}: {}",
                root.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %root.display(),
            stripes = locking.stripes(),
            "Disk image cache ready"
        );

        Ok(DiskImageStore {
            root,
            locks: LockTable::new(locking),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entries belonging to `id`, sorted by file name.
    async fn entries_for(&self, id: &CacheId) -> CacheStoreResult<Vec<(String, EntryKind)>> {
        let mut dir = fs::read_dir(&self.root).await?;
        let mut found = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(kind) = entry::classify(id, name) {
                found.push((name.to_string(), kind));
            }
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    async fn serve_entry(
        &self,
        id: &CacheId,
        source: Option<&Path>,
        now: DateTime<Utc>,
    ) -> CacheStoreResult<Option<CachedImage>> {
        let _guard = self.locks.lock(id).await;

        let entries = self.entries_for(id).await?;
        if entries.len() > 1 {
            tracing::warn!(
                id = %id,
                count = entries.len(),
                "Duplicate cache entries, using the first"
            );
        }
        let Some((name, kind)) = entries.into_iter().next() else {
            tracing::debug!(id = %id, "Cache miss");
            return Ok(None);
        };

        let path = self.root.join(&name);
        let entry_modified = fs::metadata(&path).await?.modified()?;

        let fresh = match (source, kind) {
            (None, EntryKind::Expires(expires)) => now < expires,
            (Some(source), EntryKind::Source) => {
                let source_modified = fs::metadata(source).await?.modified()?;
                entry_modified > source_modified
            }
            _ => false,
        };

        if !fresh {
            fs::remove_file(&path).await?;
            tracing::info!(id = %id, path = %path.display(), "Removed stale cache entry");
            return Ok(None);
        }

        let start = Instant::now();
        let bytes = fs::read(&path).await?;
        tracing::debug!(
            id = %id,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cache hit"
        );

        Ok(Some(CachedImage {
            bytes: Bytes::from(bytes),
            last_modified: DateTime::<Utc>::from(entry_modified),
        }))
    }

    async fn write_entry(
        &self,
        id: &CacheId,
        bytes: Bytes,
        binding: EntryBinding,
    ) -> CacheStoreResult<PathBuf> {
        let _guard = self.locks.lock(id).await;

        let name = entry::file_name(id, &binding);
        for (existing, _) in self.entries_for(id).await? {
            if existing != name {
                match fs::remove_file(self.root.join(&existing)).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        let root = self.root.clone();
        let target = self.root.join(&name);
        let target_for_task = target.clone();
        tokio::task::spawn_blocking(move || -> CacheStoreResult<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(WRITING_PREFIX)
                .tempfile_in(&root)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target_for_task).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| CacheStoreError::TaskFailed(e.to_string()))??;

        Ok(target)
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn try_serve(
        &self,
        id: &CacheId,
        source: Option<&Path>,
        now: DateTime<Utc>,
    ) -> Option<CachedImage> {
        match self.serve_entry(id, source, now).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn store(&self, id: &CacheId, bytes: Bytes, binding: EntryBinding) {
        let size = bytes.len();
        let start = Instant::now();
        match self.write_entry(id, bytes, binding).await {
            Ok(path) => tracing::info!(
                id = %id,
                path = %path.display(),
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Cache entry stored"
            ),
            Err(e) => tracing::warn!(id = %id, error = %e, "Cache store failed, skipping"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use imagehandler_core::{Fingerprint, RequestParams};
    use std::sync::Arc;
    use std::time::SystemTime;
    use tempfile::tempdir;

    fn id(name: &str) -> CacheId {
        Fingerprint::compute("disk-tests", &RequestParams::from_pairs([("n", name)]), ["x"])
    }

    fn files_in(root: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn set_mtime(path: &Path, at: SystemTime) {
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(at)
            .unwrap();
    }

    #[tokio::test]
    async fn test_new_creates_root() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("nested").join("cache");
        let store = DiskImageStore::new(&root, LockGranularity::default()).await.unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[tokio::test]
    async fn test_store_then_serve_is_byte_identical() {
        let temp = tempdir().unwrap();
        let store = DiskImageStore::new(temp.path(), LockGranularity::default()).await.unwrap();
        let id = id("a");
        let now = Utc::now();
        let payload = Bytes::from_static(b"\x89PNG not really");

        store
            .store(&id, payload.clone(), EntryBinding::Expires(now + Duration::minutes(20)))
            .await;

        let hit = store.try_serve(&id, None, now).await.unwrap();
        assert_eq!(hit.bytes, payload);
    }

    #[tokio::test]
    async fn test_ttl_expiry_boundary() {
        let temp = tempdir().unwrap();
        let store = DiskImageStore::new(temp.path(), LockGranularity::default()).await.unwrap();
        let id = id("ttl");
        let now = Utc::now();
        let expires = now + Duration::seconds(60);

        store.store(&id, Bytes::from_static(b"ttl"), EntryBinding::Expires(expires)).await;

        let just_before = expires - Duration::milliseconds(1);
        assert!(store.try_serve(&id, None, just_before).await.is_some());

        assert!(store.try_serve(&id, None, expires).await.is_none());
        assert!(files_in(temp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_source_bound_freshness() {
        let temp = tempdir().unwrap();
        let cache_root = temp.path().join("cache");
        let store = DiskImageStore::new(&cache_root, LockGranularity::default()).await.unwrap();
        let source = temp.path().join("photo.png");
        std::fs::write(&source, b"source").unwrap();
        set_mtime(&source, SystemTime::now() - std::time::Duration::from_secs(3600));

        let id = id("src");
        store.store(&id, Bytes::from_static(b"rendered"), EntryBinding::Source).await;

        let hit = store.try_serve(&id, Some(&source), Utc::now()).await.unwrap();
        assert_eq!(hit.bytes, Bytes::from_static(b"rendered"));

        set_mtime(&source, SystemTime::now() + std::time::Duration::from_secs(3600));
        assert!(store.try_serve(&id, Some(&source), Utc::now()).await.is_none());
        assert!(files_in(&cache_root).is_empty());
    }

    #[tokio::test]
    async fn test_binding_mismatch_is_stale() {
        let temp = tempdir().unwrap();
        let store = DiskImageStore::new(temp.path(), LockGranularity::default()).await.unwrap();
        let id = id("mismatch");
        store.store(&id, Bytes::from_static(b"x"), EntryBinding::Source).await;

        assert!(store.try_serve(&id, None, Utc::now()).await.is_none());
        assert!(files_in(temp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_entry_is_miss() {
        let temp = tempdir().unwrap();
        let store = DiskImageStore::new(temp.path(), LockGranularity::Global).await.unwrap();
        assert!(store.try_serve(&id("none"), None, Utc::now()).await.is_none());
    }

    #[tokio::test]
    async fn test_duplicates_use_first_entry() {
        let temp = tempdir().unwrap();
        let store = DiskImageStore::new(temp.path(), LockGranularity::default()).await.unwrap();
        let id = id("dup");
        std::fs::write(temp.path().join(format!("{}_4102444800000.tmp", id)), b"first").unwrap();
        std::fs::write(temp.path().join(format!("{}_4102444800001.tmp", id)), b"second").unwrap();

        let hit = store.try_serve(&id, None, Utc::now()).await.unwrap();
        assert_eq!(hit.bytes, Bytes::from_static(b"first"));
        assert_eq!(files_in(temp.path()).len(), 2);
    }

    #[tokio::test]
    async fn test_store_replaces_previous_entries() {
        let temp = tempdir().unwrap();
        let store = DiskImageStore::new(temp.path(), LockGranularity::default()).await.unwrap();
        let id = id("replace");
        let now = Utc::now();

        store
            .store(&id, Bytes::from_static(b"old"), EntryBinding::Expires(now + Duration::seconds(5)))
            .await;
        store
            .store(&id, Bytes::from_static(b"new"), EntryBinding::Expires(now + Duration::seconds(50)))
            .await;

        assert_eq!(files_in(temp.path()).len(), 1);
        let hit = store.try_serve(&id, None, now).await.unwrap();
        assert_eq!(hit.bytes, Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn test_concurrent_stores_leave_one_intact_entry() {
        let temp = tempdir().unwrap();
        let store = Arc::new(
            DiskImageStore::new(temp.path(), LockGranularity::default())
                .await
                .unwrap(),
        );
        let id = id("race");
        let now = Utc::now();
        let first = Bytes::from(vec![1u8; 64 * 1024]);
        let second = Bytes::from(vec![2u8; 64 * 1024]);

        let tasks = [
            (first.clone(), now + Duration::seconds(30)),
            (second.clone(), now + Duration::seconds(31)),
        ]
        .into_iter()
        .map(|(bytes, expires)| {
            let store = store.clone();
            let id = id.clone();
            tokio::spawn(async move { store.store(&id, bytes, EntryBinding::Expires(expires)).await })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap();
        }

        let names = files_in(temp.path());
        assert_eq!(names.len(), 1, "unexpected entries: {names:?}");
        assert!(!names[0].starts_with(WRITING_PREFIX));

        let hit = store.try_serve(&id, None, now).await.unwrap();
        assert!(hit.bytes == first || hit.bytes == second);
    }

    #[tokio::test]
    async fn test_missing_root_degrades_to_miss() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("cache");
        let store = DiskImageStore::new(&root, LockGranularity::default()).await.unwrap();
        std::fs::remove_dir_all(&root).unwrap();

        let id = id("gone");
        store
            .store(&id, Bytes::from_static(b"x"), EntryBinding::Expires(Utc::now() + Duration::seconds(5)))
            .await;
        assert!(store.try_serve(&id, None, Utc::now()).await.is_none());
    }
}
