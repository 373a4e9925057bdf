//! Source image resolution.
//!
//! A request names its source either directly (`file`) or as the
//! `index`-th entry of a directory listing (`path` + `index`). Relative
//! paths that do not exist as given are retried under the application root.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use imagehandler_core::RequestParams;

/// Resolve the request's source file, if any.
pub async fn resolve_source(params: &RequestParams, app_root: &Path) -> Option<PathBuf> {
    if let Some(file) = params.get("file") {
        return resolve_file(file.trim(), app_root).await;
    }
    if let Some(dir) = params.get("path") {
        let index = params.parse_lenient::<usize>("index").unwrap_or(0);
        return resolve_indexed(dir.trim(), index, app_root).await;
    }
    None
}

pub(crate) async fn resolve_file(raw: &str, app_root: &Path) -> Option<PathBuf> {
    for candidate in candidates(raw, app_root) {
        if is_file(&candidate).await {
            return Some(candidate);
        }
    }
    tracing::debug!(file = %raw, "Source file not found");
    None
}

async fn resolve_indexed(raw: &str, index: usize, app_root: &Path) -> Option<PathBuf> {
    let mut dir = None;
    for candidate in candidates(raw, app_root) {
        if is_dir(&candidate).await {
            dir = Some(candidate);
            break;
        }
    }
    let dir = dir?;

    let mut files = Vec::new();
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "Cannot list source directory");
            return None;
        }
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if is_file(&path).await {
            files.push(path);
        }
    }
    files.sort();
    files.into_iter().nth(index)
}

/// The path as given, then relative to the application root.
fn candidates(raw: &str, app_root: &Path) -> Vec<PathBuf> {
    let given = PathBuf::from(raw);
    let rooted = app_root.join(raw.trim_start_matches(['/', '\\']));
    if given == rooted {
        vec![given]
    } else {
        vec![given, rooted]
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Last modification time of `path`.
pub async fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    metadata.modified().ok().map(DateTime::<Utc>::from)
}
