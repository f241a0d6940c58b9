//! Cookie replicator.
//!
//! Cookies are not read from inside the page. The replicator resolves the
//! context's URL through the registry and talks to the host cookie store
//! directly.

use std::sync::Arc;

use futures::future::join_all;
use tabrelay_types::{ContextId, CookieSnapshot};
use tracing::{debug, instrument, warn};

use crate::host::{ContextRegistry, CookieSpec, CookieStore, HostError};

/// Outcome of one cookie injection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieInjectionReport {
    /// Number of set calls issued.
    pub attempted: usize,

    /// Cookies the host refused, with the host's reason.
    pub failed: Vec<(String, String)>,
}

impl CookieInjectionReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed.len()
    }
}

/// Reads cookies visible to one context and re-creates them for another.
#[derive(Clone)]
pub struct CookieReplicator {
    registry: Arc<dyn ContextRegistry>,
    store: Arc<dyn CookieStore>,
}

impl CookieReplicator {
    pub fn new(registry: Arc<dyn ContextRegistry>, store: Arc<dyn CookieStore>) -> Self {
        Self { registry, store }
    }

    /// URL the context currently points at.
    pub async fn resolve_url(&self, context: ContextId) -> Result<String, HostError> {
        Ok(self.registry.get(context).await?.url)
    }

    /// Every cookie visible at the context's URL. An empty jar is a
    /// success.
    #[instrument(skip(self), fields(context = %context))]
    pub async fn extract(&self, context: ContextId) -> Result<CookieSnapshot, HostError> {
        let url = self.resolve_url(context).await?;
        let records = self.store.get_all(&url).await?;
        debug!(url = %url, count = records.len(), "Cookies extracted");
        Ok(CookieSnapshot::from_records(records))
    }

    /// Re-create every cookie of `snapshot` against `url`.
    ///
    /// All set calls are issued together and awaited; a refused cookie is
    /// logged and recorded in the report without stopping the others.
    #[instrument(skip(self, snapshot), fields(url = %url, count = snapshot.len()))]
    pub async fn inject_into(&self, url: &str, snapshot: &CookieSnapshot) -> CookieInjectionReport {
        let calls = snapshot.records().iter().map(|record| {
            let spec = CookieSpec::from_record(url, record);
            async move {
                let name = spec.name.clone();
                (name, self.store.set(spec).await)
            }
        });

        let mut report = CookieInjectionReport {
            attempted: snapshot.len(),
            failed: Vec::new(),
        };
        for (name, result) in join_all(calls).await {
            if let Err(e) = result {
                warn!(cookie = %name, error = %e, "Failed to set cookie");
                report.failed.push((name, e.to_string()));
            }
        }
        report
    }

    /// Resolve `context` and re-create every cookie of `snapshot` there.
    pub async fn inject(
        &self,
        context: ContextId,
        snapshot: &CookieSnapshot,
    ) -> Result<CookieInjectionReport, HostError> {
        let url = self.resolve_url(context).await?;
        Ok(self.inject_into(&url, snapshot).await)
    }
}
