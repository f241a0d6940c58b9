//! Single-kind handler for cookies.

use tabrelay_types::{
    ReplicationData, ReplicationError, ReplicationId, ReplicationRequest, Result, StorageKind,
};
use tracing::{info, instrument};

use crate::config::InjectionMode;
use crate::cookies::CookieReplicator;
use crate::events::EventBus;

use super::injection::{run_injections, InjectionJob, InjectionTarget};

/// Copies every cookie visible to the source into the target's origin.
///
/// The set pass is fire-and-forget unless the handler runs in
/// [`InjectionMode::Confirmed`], in which case any refused cookie fails the
/// whole copy.
#[derive(Clone)]
pub struct CookieCopyHandler {
    replicator: CookieReplicator,
    mode: InjectionMode,
    events: EventBus,
}

impl CookieCopyHandler {
    pub fn new(replicator: CookieReplicator, mode: InjectionMode, events: EventBus) -> Self {
        Self {
            replicator,
            mode,
            events,
        }
    }

    #[instrument(
        name = "copy_cookies",
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
        let snapshot = self.replicator.extract(request.source).await?;
        let url = self.replicator.resolve_url(request.target).await?;
        let values = snapshot.values();

        let target = InjectionTarget {
            replication_id: replication_id.clone(),
            context: request.target,
            url,
        };
        let job = InjectionJob::Cookies {
            replicator: self.replicator.clone(),
            snapshot,
        };

        let results = run_injections(vec![job], target, &self.events, self.mode).await;
        if let Some((_, Err(reason))) = results.into_iter().next() {
            return Err(ReplicationError::InjectionFailed(reason));
        }

        info!(cookies = values.len(), "Cookies copied");
        Ok(ReplicationData::single(StorageKind::Cookies, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tabrelay_types::{ActionKind, ContextId, ContextInfo, CookieRecord};

    use crate::host::InMemoryHost;

    fn setup() -> Arc<InMemoryHost> {
        let host = Arc::new(InMemoryHost::new());
        host.open_tab(ContextInfo::new(1, "https://x.com/login"));
        host.open_tab(ContextInfo::new(2, "https://y.com/"));
        host.add_cookie(CookieRecord::new("sid", "42", "x.com"));
        host
    }

    fn handler(host: &Arc<InMemoryHost>, mode: InjectionMode) -> CookieCopyHandler {
        CookieCopyHandler::new(
            CookieReplicator::new(host.clone(), host.clone()),
            mode,
            EventBus::new(8),
        )
    }

    fn request() -> ReplicationRequest {
        ReplicationRequest::new(ActionKind::CopyCookies, ContextId::new(1), ContextId::new(2))
    }

    #[tokio::test]
    async fn test_fire_and_forget_reports_source_cookies() {
        let host = setup();
        let data = handler(&host, InjectionMode::FireAndForget)
            .run(&ReplicationId::generate(), &request())
            .await
            .unwrap();

        assert_eq!(
            data.get(StorageKind::Cookies).and_then(|c| c.get("sid")),
            Some("42")
        );
    }

    #[tokio::test]
    async fn test_confirmed_mode_surfaces_refused_cookies() {
        let host = setup();
        let err = handler(&host, InjectionMode::Confirmed)
            .run(&ReplicationId::generate(), &request())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ReplicationError::InjectionFailed("1 of 1 cookies could not be set".into())
        );
    }

    #[tokio::test]
    async fn test_failing_cookie_query_is_host_unavailable() {
        let host = setup();
        host.fail_cookie_queries(Some("cookies permission missing"));

        let err = handler(&host, InjectionMode::FireAndForget)
            .run(&ReplicationId::generate(), &request())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "cookies permission missing");
    }
}
