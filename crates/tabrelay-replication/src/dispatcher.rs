//! Replication Dispatcher - Entry point for replication requests.
//!
//! Maps each action kind to its handler and turns the handler's result into
//! the response sent back to the caller.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tabrelay_types::{
    ActionKind, ContextInfo, ReplicationData, ReplicationId, ReplicationRequest,
    ReplicationResponse, Result, StorageKind,
};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::config::RelayConfig;
use crate::cookies::CookieReplicator;
use crate::events::{EventBus, RelayEvent};
use crate::handlers::{CookieCopyHandler, CopyAllHandler, StorageCopyHandler};
use crate::host::{ContextExecutor, ContextRegistry, CookieStore, HostError};
use crate::storage::StorageReplicator;

/// Dispatches replication requests to their handlers.
pub struct ReplicationDispatcher {
    /// Configuration.
    config: RelayConfig,

    /// Context registry, kept for listing contexts.
    registry: Arc<dyn ContextRegistry>,

    session: StorageCopyHandler,
    local: StorageCopyHandler,
    cookies: CookieCopyHandler,
    all: CopyAllHandler,

    /// Event broadcaster.
    events: EventBus,
}

impl ReplicationDispatcher {
    /// Create a dispatcher over the given host collaborators.
    pub fn new(
        config: RelayConfig,
        registry: Arc<dyn ContextRegistry>,
        executor: Arc<dyn ContextExecutor>,
        cookie_store: Arc<dyn CookieStore>,
    ) -> Self {
        let events = EventBus::new(config.event_channel_capacity);

        let session_replicator = StorageReplicator::session(executor.clone());
        let local_replicator = StorageReplicator::local(executor);
        let cookie_replicator = CookieReplicator::new(registry.clone(), cookie_store);

        let session = StorageCopyHandler::new(session_replicator.clone(), events.clone());
        let local = StorageCopyHandler::new(local_replicator.clone(), events.clone());
        let cookies = CookieCopyHandler::new(
            cookie_replicator.clone(),
            config.injection_mode,
            events.clone(),
        );
        let all = CopyAllHandler::new(
            session_replicator,
            local_replicator,
            cookie_replicator,
            config.injection_mode,
            events.clone(),
        );

        Self {
            config,
            registry,
            session,
            local,
            cookies,
            all,
            events,
        }
    }

    /// Subscribe to replication events.
    pub fn subscribe(&self) -> broadcast::Receiver<RelayEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Every open context, for choosing a source and target.
    pub async fn contexts(&self) -> std::result::Result<Vec<ContextInfo>, HostError> {
        self.registry.query().await
    }

    /// Run one replication and produce its response. Never fails: every
    /// error becomes a failure response.
    #[instrument(
        skip(self),
        fields(action = %request.action, source = %request.source, target = %request.target)
    )]
    pub async fn dispatch(&self, request: ReplicationRequest) -> ReplicationResponse {
        let replication_id = ReplicationId::generate();
        self.events.emit(RelayEvent::ReplicationStarted {
            replication_id: replication_id.clone(),
            action: request.action,
            source: request.source,
            target: request.target,
            at: Utc::now(),
        });

        let result = self.run(&replication_id, &request).await;

        match &result {
            Ok(data) => {
                let kinds = data.kinds();
                let missing: Vec<StorageKind> = request
                    .action
                    .storage_kinds()
                    .iter()
                    .copied()
                    .filter(|kind| !kinds.contains(kind))
                    .collect();
                info!(
                    replication_id = %replication_id,
                    kinds = ?kinds,
                    missing = ?missing,
                    "Replication completed"
                );
                self.events.emit(RelayEvent::ReplicationCompleted {
                    replication_id,
                    action: request.action,
                    kinds,
                    missing,
                });
            }
            Err(e) => {
                warn!(replication_id = %replication_id, error = %e, "Replication failed");
                self.events.emit(RelayEvent::ReplicationFailed {
                    replication_id,
                    action: request.action,
                    reason: e.message(),
                });
            }
        }

        result.into()
    }

    async fn run(
        &self,
        replication_id: &ReplicationId,
        request: &ReplicationRequest,
    ) -> Result<ReplicationData> {
        match request.action {
            ActionKind::CopySession => self.session.run(replication_id, request).await,
            ActionKind::CopyLocal => self.local.run(replication_id, request).await,
            ActionKind::CopyCookies => self.cookies.run(replication_id, request).await,
            ActionKind::CopyAll => self.all.run(replication_id, request).await,
        }
    }

    /// Handle a raw request message. Malformed messages and unknown actions
    /// are answered with a failure response.
    pub async fn handle_message(&self, message: &Value) -> ReplicationResponse {
        match ReplicationRequest::from_message(message) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                warn!(error = %e, "Rejected replication message");
                ReplicationResponse::failure(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabrelay_types::ContextId;

    use crate::host::{InMemoryHost, StorageArea};

    fn dispatcher(host: &Arc<InMemoryHost>) -> ReplicationDispatcher {
        ReplicationDispatcher::new(RelayConfig::default(), host.clone(), host.clone(), host.clone())
    }

    fn setup() -> Arc<InMemoryHost> {
        let host = Arc::new(InMemoryHost::new());
        host.open_tab(ContextInfo::new(1, "https://a.test/"));
        host.open_tab(ContextInfo::new(2, "https://b.test/").active());
        host
    }

    #[tokio::test]
    async fn test_dispatch_emits_started_then_completed() {
        let host = setup();
        host.set_item(ContextId::new(1), StorageArea::Session, "k", "v");
        let dispatcher = dispatcher(&host);
        let mut rx = dispatcher.subscribe();

        let response = dispatcher
            .dispatch(ReplicationRequest::new(
                ActionKind::CopySession,
                ContextId::new(1),
                ContextId::new(2),
            ))
            .await;
        assert!(response.is_success());

        let started = rx.recv().await.unwrap();
        assert!(matches!(started, RelayEvent::ReplicationStarted { action: ActionKind::CopySession, .. }));

        let mut last = started;
        while let Ok(event) = rx.try_recv() {
            last = event;
        }
        match last {
            RelayEvent::ReplicationCompleted { kinds, missing, .. } => {
                assert_eq!(kinds, vec![StorageKind::SessionStorage]);
                assert!(missing.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_message_rejects_unknown_action() {
        let host = setup();
        let response = dispatcher(&host)
            .handle_message(&json!({"action": "COPY_HISTORY", "sourceTabId": 1, "targetTabId": 2}))
            .await;

        assert_eq!(
            response.to_message(),
            json!({"success": false, "error": "unknown action: COPY_HISTORY"})
        );
    }

    #[tokio::test]
    async fn test_contexts_lists_open_tabs() {
        let host = setup();
        let contexts = dispatcher(&host).contexts().await.unwrap();
        assert_eq!(contexts.len(), 2);
        assert!(contexts[1].active);
    }
}
