//! Request parameters
//!
//! Keys are case-insensitive and stored lowercase. A key whose value is empty
//! is treated as absent by every accessor, so `?width=` behaves like no
//! `width` at all.

use std::collections::BTreeMap;
use std::str::FromStr;

/// A request parameter that is present but cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value '{value}' for parameter '{key}'")]
pub struct InvalidParameter {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    values: BTreeMap<String, String>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw query pairs. Repeated keys join their values with `,`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.insert(key, value);
        }
        params
    }

    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        let key = key.as_ref().to_ascii_lowercase();
        let value = value.into();
        match self.values.get_mut(&key) {
            Some(existing) if !existing.is_empty() && !value.is_empty() => {
                existing.push(',');
                existing.push_str(&value);
            }
            Some(existing) if existing.is_empty() => *existing = value,
            Some(_) => {}
            None => {
                self.values.insert(key, value);
            }
        }
    }

    /// Non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Parse the value for `key`; absent keys yield `Ok(None)`.
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, InvalidParameter> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| InvalidParameter {
                key: key.to_ascii_lowercase(),
                value: raw.to_string(),
            }),
        }
    }

    /// Parse the value for `key`, treating an unparsable value as absent.
    pub fn parse_lenient<T: FromStr>(&self, key: &str) -> Option<T> {
        self.parse(key).ok().flatten()
    }

    /// All pairs in ascending key order, including empty values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
