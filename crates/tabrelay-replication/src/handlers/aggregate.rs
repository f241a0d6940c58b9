//! "Copy all" handler.
//!
//! The three kinds are read from the source concurrently and every read is
//! allowed to settle before anything is written. A kind whose read failed is
//! left out of the response and never written; the others go on. The target
//! is resolved once for all writes, and a target that cannot be resolved
//! fails the whole copy.

use tabrelay_types::{
    CookieSnapshot, OperationOutcome, ReplicationData, ReplicationId, ReplicationRequest, Result,
    StorageKind,
};
use tracing::{debug, info, instrument, warn};

use crate::config::InjectionMode;
use crate::cookies::CookieReplicator;
use crate::events::{EventBus, RelayEvent};
use crate::host::HostError;
use crate::storage::StorageReplicator;

use super::injection::{run_injections, InjectionJob, InjectionTarget};

/// Turn a host error into a failure outcome so one kind cannot sink the
/// others.
fn settle<T>(result: std::result::Result<OperationOutcome<T>, HostError>) -> OperationOutcome<T> {
    result.unwrap_or_else(|e| OperationOutcome::failure(e.to_string()))
}

#[derive(Clone)]
pub struct CopyAllHandler {
    session: StorageReplicator,
    local: StorageReplicator,
    cookies: CookieReplicator,
    mode: InjectionMode,
    events: EventBus,
}

impl CopyAllHandler {
    pub fn new(
        session: StorageReplicator,
        local: StorageReplicator,
        cookies: CookieReplicator,
        mode: InjectionMode,
        events: EventBus,
    ) -> Self {
        Self {
            session,
            local,
            cookies,
            mode,
            events,
        }
    }

    #[instrument(
        name = "copy_all",
        skip(self, request),
        fields(
            replication_id = %replication_id,
            source = %request.source,
            target = %request.target,
            mode = ?self.mode,
        )
    )]
    pub async fn run(
        &self,
        replication_id: &ReplicationId,
        request: &ReplicationRequest,
    ) -> Result<ReplicationData> {
        let (session, local, cookies) = tokio::join!(
            self.session.extract(request.source),
            self.local.extract(request.source),
            async {
                self.cookies
                    .extract(request.source)
                    .await
                    .map(OperationOutcome::Success)
            },
        );

        let mut data = ReplicationData::default();
        let mut jobs = Vec::new();

        for (replicator, outcome) in [(&self.session, settle(session)), (&self.local, settle(local))] {
            match outcome {
                OperationOutcome::Success(snapshot) => {
                    data.insert(replicator.kind(), snapshot.clone());
                    jobs.push(InjectionJob::Storage {
                        replicator: replicator.clone(),
                        snapshot,
                    });
                }
                OperationOutcome::Failure { message } => {
                    self.extraction_failed(replication_id, replicator.kind(), message);
                }
            }
        }

        match settle::<CookieSnapshot>(cookies) {
            OperationOutcome::Success(snapshot) => {
                data.insert(StorageKind::Cookies, snapshot.values());
                jobs.push(InjectionJob::Cookies {
                    replicator: self.cookies.clone(),
                    snapshot,
                });
            }
            OperationOutcome::Failure { message } => {
                self.extraction_failed(replication_id, StorageKind::Cookies, message);
            }
        }

        debug!(extracted = ?data.kinds(), "Extraction settled");

        let url = self.cookies.resolve_url(request.target).await?;
        let target = InjectionTarget {
            replication_id: replication_id.clone(),
            context: request.target,
            url,
        };

        for (kind, result) in run_injections(jobs, target, &self.events, self.mode).await {
            if result.is_err() {
                data.remove(kind);
            }
        }

        info!(kinds = ?data.kinds(), "Copy all finished");
        Ok(data)
    }

    fn extraction_failed(&self, replication_id: &ReplicationId, kind: StorageKind, reason: String) {
        warn!(kind = %kind, reason = %reason, "Extraction failed, kind left out");
        self.events.emit(RelayEvent::ExtractionFailed {
            replication_id: replication_id.clone(),
            kind,
            reason,
        });
    }
}
