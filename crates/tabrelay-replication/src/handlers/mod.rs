//! Per-action replication handlers.

mod aggregate;
mod cookies;
mod injection;
mod storage;

pub use aggregate::CopyAllHandler;
pub use cookies::CookieCopyHandler;
pub use storage::StorageCopyHandler;
