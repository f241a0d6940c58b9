//! Single-kind handler for session and local storage.

use tabrelay_types::{
    OperationOutcome, ReplicationData, ReplicationError, ReplicationId, ReplicationRequest, Result,
};
use tracing::{debug, info, instrument};

use crate::events::{EventBus, RelayEvent};
use crate::storage::StorageReplicator;

/// Copies one storage area from source to target, strictly in sequence:
/// the target is only written once the source read succeeded.
#[derive(Clone)]
pub struct StorageCopyHandler {
    replicator: StorageReplicator,
    events: EventBus,
}

impl StorageCopyHandler {
    pub fn new(replicator: StorageReplicator, events: EventBus) -> Self {
        Self { replicator, events }
    }

    #[instrument(
        name = "copy_storage",
        skip(self, request),
        fields(
            replication_id = %replication_id,
            kind = %self.replicator.kind(),
            source = %request.source,
            target = %request.target,
        )
    )]
    pub async fn run(
        &self,
        replication_id: &ReplicationId,
        request: &ReplicationRequest,
    ) -> Result<ReplicationData> {
        let kind = self.replicator.kind();

        let snapshot = match self.replicator.extract(request.source).await? {
            OperationOutcome::Success(snapshot) => snapshot,
            OperationOutcome::Failure { message } => {
                debug!(reason = %message, "Source store could not be read");
                return Err(ReplicationError::ExtractionFailed(message));
            }
        };

        let injected = self
            .replicator
            .inject(request.target, OperationOutcome::Success(snapshot.clone()))
            .await?;
        if let OperationOutcome::Failure { message } = injected {
            self.events.emit(RelayEvent::InjectionFailed {
                replication_id: replication_id.clone(),
                kind,
                reason: message.clone(),
            });
            return Err(ReplicationError::InjectionFailed(message));
        }

        self.events.emit(RelayEvent::InjectionCompleted {
            replication_id: replication_id.clone(),
            kind,
        });
        info!(keys = snapshot.len(), "Storage copied");
        Ok(ReplicationData::single(kind, snapshot))
    }
}
