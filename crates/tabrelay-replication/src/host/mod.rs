//! Host environment seams.
//!
//! Defines the collaborator traits the orchestrator calls and an in-memory
//! host implementing all of them.

pub mod memory;
pub mod traits;

pub use memory::{ExecutionRecord, InMemoryHost};
pub use traits::{
    ContextExecutor, ContextRegistry, CookieSpec, CookieStore, HostError, PageError, PageScope,
    PageScript, ScriptOutput, StorageArea, WebStorage,
};
