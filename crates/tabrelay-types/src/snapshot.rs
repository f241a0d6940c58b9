//! Captured store contents.
//!
//! Snapshots are transient: captured from a source context, handed to the
//! injection step, then dropped. Nothing here is persisted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The three kinds of client-side state that can be replicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    SessionStorage,
    LocalStorage,
    Cookies,
}

impl StorageKind {
    pub const ALL: [StorageKind; 3] = [
        StorageKind::SessionStorage,
        StorageKind::LocalStorage,
        StorageKind::Cookies,
    ];

    /// Key under which this kind appears in response data.
    pub fn data_key(&self) -> &'static str {
        match self {
            StorageKind::SessionStorage => "SessionStorage",
            StorageKind::LocalStorage => "LocalStorage",
            StorageKind::Cookies => "Cookies",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.data_key())
    }
}

/// Key/value contents of a session or local store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValueSnapshot(BTreeMap<String, String>);

impl KeyValueSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<BTreeMap<String, String>> for KeyValueSnapshot {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K, V> FromIterator<(K, V)> for KeyValueSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A cookie as reported by the host cookie store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    #[serde(default)]
    pub host_only: bool,
    /// Seconds since the UNIX epoch; `None` for session cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<f64>,
}

impl CookieRecord {
    /// A host-only, non-secure session cookie on path `/`.
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            secure: false,
            http_only: false,
            host_only: true,
            expiration_date: None,
        }
    }
}

/// Every cookie visible at an origin.
///
/// Keeps the full records because re-creating a cookie needs its
/// attributes, not just its name and value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookieSnapshot {
    records: Vec<CookieRecord>,
}

impl CookieSnapshot {
    pub fn from_records(records: Vec<CookieRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CookieRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Name to value mapping. A later record wins over an earlier one
    /// with the same name.
    pub fn values(&self) -> KeyValueSnapshot {
        self.records
            .iter()
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<&CookieRecord> {
        self.records.iter().find(|c| c.name == name)
    }
}
