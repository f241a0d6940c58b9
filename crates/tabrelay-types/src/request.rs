//! Inbound replication request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::ActionKind;
use crate::error::{ReplicationError, Result};
use crate::ids::ContextId;

/// A request to copy state from one context into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationRequest {
    pub action: ActionKind,
    #[serde(rename = "sourceTabId")]
    pub source: ContextId,
    #[serde(rename = "targetTabId")]
    pub target: ContextId,
}

impl ReplicationRequest {
    pub fn new(action: ActionKind, source: ContextId, target: ContextId) -> Self {
        Self {
            action,
            source,
            target,
        }
    }

    /// Parse an inbound message.
    ///
    /// An action name outside the fixed set is reported as
    /// [`ReplicationError::UnknownAction`] rather than a shape error, so the
    /// caller learns which action was not recognized.
    pub fn from_message(message: &Value) -> Result<Self> {
        if !message.is_object() {
            return Err(ReplicationError::MalformedRequest(
                "message is not an object".to_string(),
            ));
        }

        let action = message
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| ReplicationError::MalformedRequest("missing action".to_string()))?
            .parse::<ActionKind>()?;

        Ok(Self {
            action,
            source: context_field(message, "sourceTabId")?,
            target: context_field(message, "targetTabId")?,
        })
    }

    pub fn to_message(&self) -> Value {
        serde_json::json!({
            "action": self.action.as_str(),
            "sourceTabId": self.source.get(),
            "targetTabId": self.target.get(),
        })
    }
}

fn context_field(message: &Value, field: &str) -> Result<ContextId> {
    message
        .get(field)
        .and_then(Value::as_i64)
        .map(ContextId::new)
        .ok_or_else(|| ReplicationError::MalformedRequest(format!("{field} must be an integer")))
}
