//! Message router.
//!
//! Receives raw request messages over a channel and answers each on its own
//! reply channel. Every message runs on its own task, so a slow replication
//! never holds up the next one, and every message gets a reply even if its
//! handler panics.

use std::sync::Arc;

use serde_json::Value;
use tabrelay_types::{ReplicationError, ReplicationRequest, ReplicationResponse};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::dispatcher::ReplicationDispatcher;

/// A request message together with the channel its response goes to.
#[derive(Debug)]
pub struct InboundMessage {
    pub payload: Value,
    pub reply: oneshot::Sender<Value>,
}

impl InboundMessage {
    /// Wrap `payload`, returning the message and the receiving end of its
    /// reply channel.
    pub fn new(payload: Value) -> (Self, oneshot::Receiver<Value>) {
        let (reply, rx) = oneshot::channel();
        (Self { payload, reply }, rx)
    }
}

/// Routes inbound messages to the dispatcher.
#[derive(Clone)]
pub struct MessageRouter {
    dispatcher: Arc<ReplicationDispatcher>,
}

impl MessageRouter {
    pub fn new(dispatcher: Arc<ReplicationDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Route messages until every sender is dropped.
    pub async fn serve(self, mut inbox: mpsc::Receiver<InboundMessage>) {
        info!("Message router started");
        while let Some(message) = inbox.recv().await {
            self.route(message);
        }
        info!("Message router stopped");
    }

    /// Handle one message on its own task.
    pub fn route(&self, message: InboundMessage) -> JoinHandle<()> {
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            let InboundMessage { payload, reply } = message;

            let handler = tokio::spawn(async move { dispatcher.handle_message(&payload).await });
            let response = match handler.await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, "Replication handler aborted");
                    ReplicationResponse::failure(&ReplicationError::Internal(String::new()))
                }
            };

            if reply.send(response.to_message()).is_err() {
                debug!("Caller went away before the response was ready");
            }
        })
    }
}

/// Errors seen by a caller of the router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("message router is not running")]
    Closed,

    #[error("message router dropped the request without replying")]
    NoReply,
}

/// Caller side of the router channel.
#[derive(Debug, Clone)]
pub struct RelaySender {
    tx: mpsc::Sender<InboundMessage>,
}

impl RelaySender {
    pub fn new(tx: mpsc::Sender<InboundMessage>) -> Self {
        Self { tx }
    }

    /// Send a raw message and wait for the raw reply.
    pub async fn send_message(&self, payload: Value) -> Result<Value, RouterError> {
        let (message, reply) = InboundMessage::new(payload);
        self.tx.send(message).await.map_err(|_| RouterError::Closed)?;
        reply.await.map_err(|_| RouterError::NoReply)
    }

    /// Send a request and wait for its response.
    pub async fn send(&self, request: &ReplicationRequest) -> Result<Value, RouterError> {
        self.send_message(request.to_message()).await
    }
}

/// Start a router on a new task and return the caller side of its channel.
pub fn spawn_router(dispatcher: Arc<ReplicationDispatcher>, buffer: usize) -> RelaySender {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    tokio::spawn(MessageRouter::new(dispatcher).serve(rx));
    RelaySender::new(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabrelay_types::{ActionKind, ContextId, ContextInfo};

    use crate::config::RelayConfig;
    use crate::host::{InMemoryHost, StorageArea};

    fn dispatcher(host: &Arc<InMemoryHost>) -> Arc<ReplicationDispatcher> {
        Arc::new(ReplicationDispatcher::new(
            RelayConfig::default(),
            host.clone(),
            host.clone(),
            host.clone(),
        ))
    }

    #[tokio::test]
    async fn test_router_replies_on_the_message_channel() {
        let host = Arc::new(InMemoryHost::new());
        host.open_tab(ContextInfo::new(1, "https://a.test/"));
        host.open_tab(ContextInfo::new(2, "https://b.test/"));
        host.set_item(ContextId::new(1), StorageArea::Session, "theme", "dark");

        let sender = spawn_router(dispatcher(&host), 4);
        let reply = sender
            .send(&ReplicationRequest::new(
                ActionKind::CopySession,
                ContextId::new(1),
                ContextId::new(2),
            ))
            .await
            .unwrap();

        assert_eq!(
            reply,
            json!({"success": true, "data": {"SessionStorage": {"theme": "dark"}}})
        );
    }

    #[tokio::test]
    async fn test_malformed_message_gets_failure_reply() {
        let host = Arc::new(InMemoryHost::new());
        let router = MessageRouter::new(dispatcher(&host));

        let (message, reply) = InboundMessage::new(json!("COPY_ALL"));
        router.route(message).await.unwrap();

        let reply = reply.await.unwrap();
        assert_eq!(reply["success"], json!(false));
        assert!(reply["error"].as_str().unwrap().starts_with("malformed request"));
    }

    #[tokio::test]
    async fn test_closed_router_is_reported() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = RelaySender::new(tx);

        let err = sender.send_message(json!({})).await.unwrap_err();
        assert_eq!(err, RouterError::Closed);
    }
}
