//! Host collaborator traits.
//!
//! The orchestrator never owns the contexts it copies between. Everything it
//! does to them goes through these three seams: the registry (which tabs
//! exist and where they point), the executor (run a script inside a tab) and
//! the cookie store.

use std::fmt;

use async_trait::async_trait;
use tabrelay_types::{
    ContextId, ContextInfo, CookieRecord, KeyValueSnapshot, OperationOutcome, ReplicationError,
    StorageKind,
};
use thiserror::Error;

/// Error reported by a host API call. The text is the host's own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HostError(String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<HostError> for ReplicationError {
    fn from(e: HostError) -> Self {
        ReplicationError::HostUnavailable(e.0)
    }
}

/// Error raised inside a page script, such as a denied storage access or a
/// rejected write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PageError(String);

impl PageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Web storage areas reachable from a page script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageArea {
    Session,
    Local,
}

impl StorageArea {
    /// Name of the page global backing this area.
    pub fn global_name(&self) -> &'static str {
        match self {
            StorageArea::Session => "sessionStorage",
            StorageArea::Local => "localStorage",
        }
    }

    pub fn kind(&self) -> StorageKind {
        match self {
            StorageArea::Session => StorageKind::SessionStorage,
            StorageArea::Local => StorageKind::LocalStorage,
        }
    }
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.global_name())
    }
}

/// A page's key/value store as seen from inside the page.
pub trait WebStorage {
    fn entries(&self) -> Vec<(String, String)>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), PageError>;

    fn clear(&mut self);
}

/// What a page script can reach inside its context.
pub trait PageScope {
    fn storage(&mut self, area: StorageArea) -> Result<&mut dyn WebStorage, PageError>;
}

/// Value a page script hands back to the extension side.
pub type ScriptOutput = OperationOutcome<KeyValueSnapshot>;

type ScriptBody = Box<dyn FnOnce(&mut dyn PageScope) -> ScriptOutput + Send>;

/// A named function to run inside a context.
pub struct PageScript {
    name: &'static str,
    body: ScriptBody,
}

impl PageScript {
    pub fn new<F>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(&mut dyn PageScope) -> ScriptOutput + Send + 'static,
    {
        Self {
            name,
            body: Box::new(body),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the script against a page. Called by executors.
    pub fn run(self, page: &mut dyn PageScope) -> ScriptOutput {
        (self.body)(page)
    }
}

impl fmt::Debug for PageScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageScript").field("name", &self.name).finish()
    }
}

/// Runs scripts inside a context.
#[async_trait]
pub trait ContextExecutor: Send + Sync {
    /// Run `script` inside `context` and return what it returned, or a host
    /// error when the context cannot be reached.
    async fn execute(&self, context: ContextId, script: PageScript) -> Result<ScriptOutput, HostError>;
}

/// Looks up open contexts.
#[async_trait]
pub trait ContextRegistry: Send + Sync {
    async fn get(&self, context: ContextId) -> Result<ContextInfo, HostError>;

    /// Every open context.
    async fn query(&self) -> Result<Vec<ContextInfo>, HostError>;
}

/// Arguments of a cookie set call.
#[derive(Debug, Clone, PartialEq)]
pub struct CookieSpec {
    /// URL the cookie is associated with.
    pub url: String,
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub expiration_date: Option<f64>,
}

impl CookieSpec {
    /// Re-create `record` against `url`, keeping its attributes.
    pub fn from_record(url: impl Into<String>, record: &CookieRecord) -> Self {
        Self {
            url: url.into(),
            name: record.name.clone(),
            value: record.value.clone(),
            domain: Some(record.domain.clone()),
            path: Some(record.path.clone()),
            secure: record.secure,
            http_only: record.http_only,
            expiration_date: record.expiration_date,
        }
    }
}

/// Host cookie jar.
#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Every cookie visible at `url`.
    async fn get_all(&self, url: &str) -> Result<Vec<CookieRecord>, HostError>;

    async fn set(&self, spec: CookieSpec) -> Result<CookieRecord, HostError>;
}
