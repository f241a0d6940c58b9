//! Replication events.
//!
//! Events are informational. Sending never fails a replication, whether or
//! not anyone is subscribed.

use chrono::{DateTime, Utc};
use tabrelay_types::{ActionKind, ContextId, ReplicationId, StorageKind};
use tokio::sync::broadcast;

/// Events emitted while replicating.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// Replication request accepted.
    ReplicationStarted {
        replication_id: ReplicationId,
        action: ActionKind,
        source: ContextId,
        target: ContextId,
        at: DateTime<Utc>,
    },

    /// A kind could not be read during "copy all"; the other kinds go on.
    ExtractionFailed {
        replication_id: ReplicationId,
        kind: StorageKind,
        reason: String,
    },

    /// A kind was written into the target.
    InjectionCompleted {
        replication_id: ReplicationId,
        kind: StorageKind,
    },

    /// A kind could not be written into the target.
    InjectionFailed {
        replication_id: ReplicationId,
        kind: StorageKind,
        reason: String,
    },

    /// Replication answered with success.
    ReplicationCompleted {
        replication_id: ReplicationId,
        action: ActionKind,
        kinds: Vec<StorageKind>,
        /// Kinds the action covers that were not copied.
        missing: Vec<StorageKind>,
    },

    /// Replication answered with a failure.
    ReplicationFailed {
        replication_id: ReplicationId,
        action: ActionKind,
        reason: String,
    },
}

impl RelayEvent {
    pub fn replication_id(&self) -> &ReplicationId {
        match self {
            RelayEvent::ReplicationStarted { replication_id, .. }
            | RelayEvent::ExtractionFailed { replication_id, .. }
            | RelayEvent::InjectionCompleted { replication_id, .. }
            | RelayEvent::InjectionFailed { replication_id, .. }
            | RelayEvent::ReplicationCompleted { replication_id, .. }
            | RelayEvent::ReplicationFailed { replication_id, .. } => replication_id,
        }
    }
}

/// Broadcast side of the event stream.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RelayEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RelayEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: RelayEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_without_subscribers_is_harmless() {
        let bus = EventBus::new(4);
        bus.emit(RelayEvent::InjectionCompleted {
            replication_id: ReplicationId::generate(),
            kind: StorageKind::Cookies,
        });

        let mut rx = bus.subscribe();
        let id = ReplicationId::generate();
        bus.emit(RelayEvent::InjectionFailed {
            replication_id: id.clone(),
            kind: StorageKind::LocalStorage,
            reason: "denied".into(),
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.replication_id(), &id);
    }
}
