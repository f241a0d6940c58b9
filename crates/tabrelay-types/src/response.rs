//! Unified replication response and caller-side classification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReplicationError;
use crate::snapshot::{KeyValueSnapshot, StorageKind};

/// Data copied by a successful replication.
///
/// Only kinds that were copied are present; a partial aggregate copy is
/// still a success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationData {
    #[serde(rename = "SessionStorage", default, skip_serializing_if = "Option::is_none")]
    pub session_storage: Option<KeyValueSnapshot>,

    #[serde(rename = "LocalStorage", default, skip_serializing_if = "Option::is_none")]
    pub local_storage: Option<KeyValueSnapshot>,

    #[serde(rename = "Cookies", default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<KeyValueSnapshot>,
}

impl ReplicationData {
    /// Data holding a single kind.
    pub fn single(kind: StorageKind, snapshot: KeyValueSnapshot) -> Self {
        let mut data = Self::default();
        data.insert(kind, snapshot);
        data
    }

    pub fn insert(&mut self, kind: StorageKind, snapshot: KeyValueSnapshot) {
        *self.slot(kind) = Some(snapshot);
    }

    pub fn remove(&mut self, kind: StorageKind) -> Option<KeyValueSnapshot> {
        self.slot(kind).take()
    }

    pub fn get(&self, kind: StorageKind) -> Option<&KeyValueSnapshot> {
        match kind {
            StorageKind::SessionStorage => self.session_storage.as_ref(),
            StorageKind::LocalStorage => self.local_storage.as_ref(),
            StorageKind::Cookies => self.cookies.as_ref(),
        }
    }

    pub fn contains(&self, kind: StorageKind) -> bool {
        self.get(kind).is_some()
    }

    /// Kinds present, in declaration order.
    pub fn kinds(&self) -> Vec<StorageKind> {
        StorageKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }

    /// Indented JSON for display.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn slot(&mut self, kind: StorageKind) -> &mut Option<KeyValueSnapshot> {
        match kind {
            StorageKind::SessionStorage => &mut self.session_storage,
            StorageKind::LocalStorage => &mut self.local_storage,
            StorageKind::Cookies => &mut self.cookies,
        }
    }
}

/// The single response delivered for every request.
///
/// Serialized as `{"success":true,"data":{...}}` or
/// `{"success":false,"error":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireResponse", try_from = "WireResponse")]
pub enum ReplicationResponse {
    Success { data: ReplicationData },
    Failure { error: String },
}

impl ReplicationResponse {
    pub fn success(data: ReplicationData) -> Self {
        ReplicationResponse::Success { data }
    }

    pub fn failure(error: &ReplicationError) -> Self {
        ReplicationResponse::Failure {
            error: error.message(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ReplicationResponse::Success { .. })
    }

    pub fn data(&self) -> Option<&ReplicationData> {
        match self {
            ReplicationResponse::Success { data } => Some(data),
            ReplicationResponse::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ReplicationResponse::Success { .. } => None,
            ReplicationResponse::Failure { error } => Some(error),
        }
    }

    pub fn to_message(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "success": false, "error": e.to_string() })
        })
    }
}

impl From<Result<ReplicationData, ReplicationError>> for ReplicationResponse {
    fn from(result: Result<ReplicationData, ReplicationError>) -> Self {
        match result {
            Ok(data) => ReplicationResponse::success(data),
            Err(e) => ReplicationResponse::failure(&e),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<ReplicationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<ReplicationResponse> for WireResponse {
    fn from(response: ReplicationResponse) -> Self {
        match response {
            ReplicationResponse::Success { data } => WireResponse {
                success: Some(true),
                data: Some(data),
                error: None,
            },
            ReplicationResponse::Failure { error } => WireResponse {
                success: Some(false),
                data: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<WireResponse> for ReplicationResponse {
    type Error = String;

    fn try_from(wire: WireResponse) -> Result<Self, Self::Error> {
        if let Some(error) = wire.error {
            return Ok(ReplicationResponse::Failure { error });
        }
        match wire.success {
            Some(true) => Ok(ReplicationResponse::Success {
                data: wire.data.unwrap_or_default(),
            }),
            _ => Err("response carries neither success nor error".to_string()),
        }
    }
}

/// How a caller reads a raw response message.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseStatus {
    Succeeded(Option<Value>),
    Failed(String),
    UnrecognizedFormat,
}

impl ResponseStatus {
    /// An `error` field wins over `success`, matching how both failure
    /// shapes (`{error}` and `{success:false,error}`) are read.
    pub fn classify(response: &Value) -> Self {
        if let Some(error) = response.get("error").and_then(Value::as_str) {
            if !error.is_empty() {
                return ResponseStatus::Failed(error.to_string());
            }
        }
        if response.get("success").and_then(Value::as_bool) == Some(true) {
            return ResponseStatus::Succeeded(response.get("data").cloned());
        }
        ResponseStatus::UnrecognizedFormat
    }
}
