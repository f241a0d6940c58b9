//! TabRelay Types - Data model for browser storage replication
//!
//! TabRelay copies client-side state from one browser context (a tab) into
//! another: session storage, local storage and cookies. This crate holds the
//! types shared by the orchestrator and its callers.
//!
//! ## Key Concepts
//!
//! - **ReplicationRequest**: action kind plus source and target context
//! - **KeyValueSnapshot** / **CookieSnapshot**: captured store contents
//! - **OperationOutcome**: result of one extraction or injection step
//! - **ReplicationResponse**: the single reply delivered for a request
//!
//! ## Wire Contract
//!
//! ```text
//! request:  {"action":"COPY_SESSION","sourceTabId":1,"targetTabId":2}
//! success:  {"success":true,"data":{"SessionStorage":{"theme":"dark"}}}
//! failure:  {"success":false,"error":"No tab with id: 2."}
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod action;
pub mod context;
pub mod error;
pub mod ids;
pub mod outcome;
pub mod request;
pub mod response;
pub mod snapshot;

pub use action::ActionKind;
pub use context::{ContextInfo, ContextSelection, SelectionError};
pub use error::{ReplicationError, Result, INVALID_DATA_FORMAT, UNKNOWN_ERROR_MESSAGE};
pub use ids::{ContextId, ReplicationId};
pub use outcome::OperationOutcome;
pub use request::ReplicationRequest;
pub use response::{ReplicationData, ReplicationResponse, ResponseStatus};
pub use snapshot::{CookieRecord, CookieSnapshot, KeyValueSnapshot, StorageKind};
