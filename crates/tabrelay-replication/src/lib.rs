//! # TabRelay Replication - Copying browser state between tabs
//!
//! This crate orchestrates copying session storage, local storage and
//! cookies from a source context (a browser tab) into a target context.
//!
//! ## Overview
//!
//! - **Storage copy**: read a store inside the source, write it inside the target
//! - **Cookie copy**: re-create the source's cookies against the target's URL
//! - **Copy all**: all three kinds at once, with partial success
//!
//! ## Architectural Boundaries
//!
//! The orchestrator owns no contexts. Everything it does to a tab goes
//! through the host traits in [`host`]:
//!
//! - [`ContextRegistry`] resolves contexts to URLs
//! - [`ContextExecutor`] runs a [`PageScript`] inside a context
//! - [`CookieStore`] reads and writes the host cookie jar
//!
//! [`InMemoryHost`] implements all three for tests and development.
//!
//! ## Key Components
//!
//! - [`ReplicationDispatcher`]: maps each action to its handler
//! - [`StorageReplicator`]: in-context extract/inject for one storage area
//! - [`CookieReplicator`]: cookie extract/inject through the cookie store
//! - [`CopyAllHandler`]: concurrent "copy all" with a settle-all barrier
//! - [`MessageRouter`]: answers raw request messages on their reply channel
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tabrelay_replication::{InMemoryHost, RelayConfig, ReplicationDispatcher, StorageArea};
//! use tabrelay_types::{ActionKind, ContextId, ContextInfo, ReplicationRequest};
//!
//! # async fn example() {
//! let host = Arc::new(InMemoryHost::new());
//! host.open_tab(ContextInfo::new(1, "https://app.example.com/"));
//! host.open_tab(ContextInfo::new(2, "https://app.example.com/"));
//! host.set_item(ContextId::new(1), StorageArea::Session, "theme", "dark");
//!
//! let dispatcher = ReplicationDispatcher::new(
//!     RelayConfig::default(),
//!     host.clone(),
//!     host.clone(),
//!     host,
//! );
//!
//! let response = dispatcher
//!     .dispatch(ReplicationRequest::new(
//!         ActionKind::CopySession,
//!         ContextId::new(1),
//!         ContextId::new(2),
//!     ))
//!     .await;
//! println!("{}", response.to_message());
//! # }
//! ```
//!
//! ## Write Semantics
//!
//! - Session storage is cleared before writing; local storage is overlaid
//! - A key or cookie that fails to write is logged and skipped
//! - In the default fire-and-forget mode a kind counts as copied once its
//!   source read succeeded; [`InjectionMode::Confirmed`] waits for the writes

#![deny(unsafe_code)]

pub mod config;
pub mod cookies;
pub mod dispatcher;
pub mod events;
pub mod handlers;
pub mod host;
pub mod router;
pub mod storage;

// Re-export main types
pub use config::{InjectionMode, RelayConfig};
pub use cookies::{CookieInjectionReport, CookieReplicator};
pub use dispatcher::ReplicationDispatcher;
pub use events::{EventBus, RelayEvent};
pub use handlers::{CookieCopyHandler, CopyAllHandler, StorageCopyHandler};
pub use host::{
    ContextExecutor, ContextRegistry, CookieSpec, CookieStore, ExecutionRecord, HostError,
    InMemoryHost, PageError, PageScope, PageScript, ScriptOutput, StorageArea, WebStorage,
};
pub use router::{spawn_router, InboundMessage, MessageRouter, RelaySender, RouterError};
pub use storage::{StorageReplicator, WritePolicy};
