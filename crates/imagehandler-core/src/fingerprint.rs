//! Request fingerprint
//!
//! A cache identifier is the SHA-256 digest of the handler seed, every request
//! parameter in ascending key order (key, then value) and every transform
//! fragment in pipeline order, rendered as uppercase hex. Parts are separated
//! by a unit separator byte so that adjacent parts cannot run together.
//!
//! The identifier is the disk cache key and doubles as the HTTP entity tag.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::params::RequestParams;

const SEPARATOR: u8 = 0x1f;

/// Uppercase hex cache identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheId(String);

impl CacheId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Incremental builder for a [`CacheId`].
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn new(seed: &str) -> Self {
        let mut fingerprint = Fingerprint {
            hasher: Sha256::new(),
        };
        fingerprint.push(seed);
        fingerprint
    }

    /// Fold in all parameters, keys ascending.
    pub fn params(mut self, params: &RequestParams) -> Self {
        for (key, value) in params.iter() {
            self.push(key);
            self.push(value);
        }
        self
    }

    /// Fold in one transform fragment. Call in pipeline order.
    pub fn fragment(mut self, fragment: &str) -> Self {
        self.push(fragment);
        self
    }

    pub fn finish(self) -> CacheId {
        CacheId(hex::encode_upper(self.hasher.finalize()))
    }

    /// Identifier for a seed, a parameter set and an ordered fragment list.
    pub fn compute<I, S>(seed: &str, params: &RequestParams, fragments: I) -> CacheId
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        fragments
            .into_iter()
            .fold(Fingerprint::new(seed).params(params), |fp, f| {
                fp.fragment(f.as_ref())
            })
            .finish()
    }

    fn push(&mut self, part: &str) {
        self.hasher.update(part.as_bytes());
        self.hasher.update([SEPARATOR]);
    }
}
