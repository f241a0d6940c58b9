//! Strongly-typed identifiers for TabRelay entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of an addressable context (a browser tab).
///
/// Serialized as the bare integer the host uses for tab ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(i64);

impl ContextId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for ContextId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab:{}", self.0)
    }
}

/// Correlates the spans and events of one replication run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplicationId(Uuid);

impl ReplicationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ReplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "replication:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_id_is_a_bare_integer_on_the_wire() {
        let id = ContextId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let parsed: ContextId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, ContextId::new(7));
        assert_eq!(id.to_string(), "tab:42");
    }

    #[test]
    fn test_replication_ids_are_unique() {
        assert_ne!(ReplicationId::generate(), ReplicationId::generate());
    }

    #[test]
    fn test_replication_id_wraps_uuid() {
        let uuid = Uuid::new_v4();
        let id = ReplicationId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
        assert_eq!(id.to_string(), format!("replication:{uuid}"));
    }
}
