use chrono::{DateTime, Utc};
use imagehandler_core::CacheId;

use crate::traits::EntryBinding;

const ENTRY_SUFFIX: &str = ".tmp";

/// What a file name in the cache root says about an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    Expires(DateTime<Utc>),
    Source,
    /// Belongs to the identifier but the expiry cannot be read.
    Malformed,
}

pub(crate) fn file_name(id: &CacheId, binding: &EntryBinding) -> String {
    match binding {
        EntryBinding::Expires(at) => {
            format!("{}_{}{}", id, at.timestamp_millis(), ENTRY_SUFFIX)
        }
        EntryBinding::Source => format!("{}{}", id, ENTRY_SUFFIX),
    }
}

/// Classify `name` as an entry of `id`, or `None` if it belongs to something else.
pub(crate) fn classify(id: &CacheId, name: &str) -> Option<EntryKind> {
    let rest = name.strip_prefix(id.as_str())?.strip_suffix(ENTRY_SUFFIX)?;
    if rest.is_empty() {
        return Some(EntryKind::Source);
    }
    let millis = rest.strip_prefix('_')?;
    Some(
        millis
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(EntryKind::Expires)
            .unwrap_or(EntryKind::Malformed),
    )
}
