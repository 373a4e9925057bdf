//! TrueType font lookup for text-rendering transforms.
//!
//! Fonts are loaded from `<dir>/<family>.ttf` (or `.otf`) on first use and
//! kept for the lifetime of the library. A family that cannot be found falls
//! back to the default family.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use ab_glyph::FontVec;

pub struct FontLibrary {
    dir: Option<PathBuf>,
    default_family: String,
    loaded: RwLock<HashMap<String, Option<Arc<FontVec>>>>,
}

impl FontLibrary {
    pub fn new(dir: Option<PathBuf>, default_family: impl Into<String>) -> Self {
        FontLibrary {
            dir,
            default_family: default_family.into(),
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// A library without a font directory; every lookup misses.
    pub fn empty() -> Self {
        Self::new(None, "")
    }

    pub fn default_family(&self) -> &str {
        &self.default_family
    }

    /// Font for `family`, falling back to the default family.
    pub fn load(&self, family: &str) -> Option<Arc<FontVec>> {
        self.load_exact(family)
            .or_else(|| self.load_exact(&self.default_family))
    }

    pub fn default_font(&self) -> Option<Arc<FontVec>> {
        self.load_exact(&self.default_family)
    }

    fn load_exact(&self, family: &str) -> Option<Arc<FontVec>> {
        let key = family.trim().to_ascii_lowercase();
        if key.is_empty() {
            return None;
        }

        if let Some(cached) = self
            .loaded
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key)
        {
            return cached.clone();
        }

        let font = self.read_font(family.trim());
        self.loaded
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, font.clone());
        font
    }

    fn read_font(&self, family: &str) -> Option<Arc<FontVec>> {
        let dir = self.dir.as_ref()?;
        let candidates = [
            format!("{}.ttf", family),
            format!("{}.otf", family),
            format!("{}.ttf", family.to_ascii_lowercase()),
        ];
        for candidate in candidates {
            let path = dir.join(&candidate);
            let Ok(data) = std::fs::read(&path) else {
                continue;
            };
            match FontVec::try_from_vec(data) {
                Ok(font) => {
                    tracing::debug!(family = %family, path = %path.display(), "Loaded font");
                    return Some(Arc::new(font));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable font file");
                }
            }
        }
        tracing::debug!(family = %family, "Font not found");
        None
    }
}
