//! Action kinds a replication request can name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReplicationError;
use crate::snapshot::StorageKind;

/// What a replication request asks to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "COPY_SESSION")]
    CopySession,
    #[serde(rename = "COPY_COOKIES")]
    CopyCookies,
    #[serde(rename = "COPY_LOCAL")]
    CopyLocal,
    #[serde(rename = "COPY_ALL")]
    CopyAll,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::CopySession,
        ActionKind::CopyCookies,
        ActionKind::CopyLocal,
        ActionKind::CopyAll,
    ];

    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::CopySession => "COPY_SESSION",
            ActionKind::CopyCookies => "COPY_COOKIES",
            ActionKind::CopyLocal => "COPY_LOCAL",
            ActionKind::CopyAll => "COPY_ALL",
        }
    }

    /// Storage kinds this action replicates.
    pub fn storage_kinds(&self) -> &'static [StorageKind] {
        match self {
            ActionKind::CopySession => &[StorageKind::SessionStorage],
            ActionKind::CopyCookies => &[StorageKind::Cookies],
            ActionKind::CopyLocal => &[StorageKind::LocalStorage],
            ActionKind::CopyAll => &StorageKind::ALL,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ReplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ReplicationError::UnknownAction(s.to_string()))
    }
}
