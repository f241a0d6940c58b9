//! Injection jobs shared by the cookie and "copy all" handlers.

use futures::future::join_all;
use tabrelay_types::{
    ContextId, CookieSnapshot, KeyValueSnapshot, OperationOutcome, ReplicationId, StorageKind,
};
use tracing::{debug, warn, Instrument};

use crate::config::InjectionMode;
use crate::cookies::CookieReplicator;
use crate::events::{EventBus, RelayEvent};
use crate::storage::StorageReplicator;

/// Where injections go.
#[derive(Debug, Clone)]
pub(crate) struct InjectionTarget {
    pub replication_id: ReplicationId,
    pub context: ContextId,
    /// URL of `context`, resolved once for all jobs.
    pub url: String,
}

/// A write of one kind into the target.
pub(crate) enum InjectionJob {
    Storage {
        replicator: StorageReplicator,
        snapshot: KeyValueSnapshot,
    },
    Cookies {
        replicator: CookieReplicator,
        snapshot: CookieSnapshot,
    },
}

impl InjectionJob {
    pub fn kind(&self) -> StorageKind {
        match self {
            InjectionJob::Storage { replicator, .. } => replicator.kind(),
            InjectionJob::Cookies { .. } => StorageKind::Cookies,
        }
    }

    async fn write(self, target: &InjectionTarget) -> Result<(), String> {
        match self {
            InjectionJob::Storage {
                replicator,
                snapshot,
            } => match replicator
                .inject(target.context, OperationOutcome::Success(snapshot))
                .await
            {
                Ok(OperationOutcome::Success(_)) => Ok(()),
                Ok(OperationOutcome::Failure { message }) => Err(message),
                Err(e) => Err(e.to_string()),
            },
            InjectionJob::Cookies {
                replicator,
                snapshot,
            } => {
                let report = replicator.inject_into(&target.url, &snapshot).await;
                if report.is_clean() {
                    Ok(())
                } else {
                    Err(format!(
                        "{} of {} cookies could not be set",
                        report.failed.len(),
                        report.attempted
                    ))
                }
            }
        }
    }

    /// Perform the write and report it on the event bus.
    pub async fn run(
        self,
        target: InjectionTarget,
        events: EventBus,
    ) -> (StorageKind, Result<(), String>) {
        let kind = self.kind();
        let result = self.write(&target).await;

        match &result {
            Ok(()) => {
                debug!(kind = %kind, target = %target.context, "Injection completed");
                events.emit(RelayEvent::InjectionCompleted {
                    replication_id: target.replication_id.clone(),
                    kind,
                });
            }
            Err(reason) => {
                warn!(kind = %kind, target = %target.context, reason = %reason, "Injection failed");
                events.emit(RelayEvent::InjectionFailed {
                    replication_id: target.replication_id.clone(),
                    kind,
                    reason: reason.clone(),
                });
            }
        }

        (kind, result)
    }
}

/// Run `jobs` according to `mode`.
///
/// In fire-and-forget mode the jobs are spawned and an empty list is
/// returned at once. In confirmed mode every job is awaited and its result
/// returned.
pub(crate) async fn run_injections(
    jobs: Vec<InjectionJob>,
    target: InjectionTarget,
    events: &EventBus,
    mode: InjectionMode,
) -> Vec<(StorageKind, Result<(), String>)> {
    match mode {
        InjectionMode::FireAndForget => {
            for job in jobs {
                tokio::spawn(job.run(target.clone(), events.clone()).in_current_span());
            }
            Vec::new()
        }
        InjectionMode::Confirmed => {
            join_all(
                jobs.into_iter()
                    .map(|job| job.run(target.clone(), events.clone())),
            )
            .await
        }
    }
}
