//! Storage extractor/injector pair.
//!
//! Reading and writing web storage happens inside the addressed context:
//! the replicator builds a page script and hands it to the
//! [`ContextExecutor`]. One replicator exists per storage area.

use std::sync::Arc;

use tabrelay_types::{ContextId, KeyValueSnapshot, OperationOutcome, StorageKind, INVALID_DATA_FORMAT};
use tracing::{debug, instrument, warn};

use crate::host::{ContextExecutor, HostError, PageScript, ScriptOutput, StorageArea};

/// How an injection treats what is already in the destination store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Clear the store, then write every key.
    ReplaceAll,
    /// Write every key over the existing contents.
    Overlay,
}

/// Extracts from and injects into one storage area of a context.
#[derive(Clone)]
pub struct StorageReplicator {
    area: StorageArea,
    policy: WritePolicy,
    executor: Arc<dyn ContextExecutor>,
}

impl StorageReplicator {
    /// Session storage is replaced wholesale on injection.
    pub fn session(executor: Arc<dyn ContextExecutor>) -> Self {
        Self {
            area: StorageArea::Session,
            policy: WritePolicy::ReplaceAll,
            executor,
        }
    }

    /// Local storage keeps keys the snapshot does not mention.
    pub fn local(executor: Arc<dyn ContextExecutor>) -> Self {
        Self {
            area: StorageArea::Local,
            policy: WritePolicy::Overlay,
            executor,
        }
    }

    pub fn area(&self) -> StorageArea {
        self.area
    }

    pub fn kind(&self) -> StorageKind {
        self.area.kind()
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Read every entry of the store in `context`.
    ///
    /// `Err` means the host could not run the script at all; a store that
    /// could not be read inside the page comes back as a failure outcome.
    #[instrument(skip(self), fields(area = %self.area, context = %context))]
    pub async fn extract(&self, context: ContextId) -> Result<ScriptOutput, HostError> {
        let output = self.executor.execute(context, read_script(self.area)).await?;
        debug!(success = output.is_success(), "Storage extraction finished");
        Ok(output)
    }

    /// Write a previously extracted snapshot into the store in `context`.
    ///
    /// `payload` must be a success outcome; anything else is rejected with
    /// "Invalid data format" without touching the store.
    #[instrument(skip(self, payload), fields(area = %self.area, context = %context))]
    pub async fn inject(
        &self,
        context: ContextId,
        payload: OperationOutcome<KeyValueSnapshot>,
    ) -> Result<ScriptOutput, HostError> {
        let output = self
            .executor
            .execute(context, write_script(self.area, self.policy, payload))
            .await?;
        debug!(success = output.is_success(), "Storage injection finished");
        Ok(output)
    }
}

fn read_script_name(area: StorageArea) -> &'static str {
    match area {
        StorageArea::Session => "read_session_storage",
        StorageArea::Local => "read_local_storage",
    }
}

fn write_script_name(area: StorageArea) -> &'static str {
    match area {
        StorageArea::Session => "write_session_storage",
        StorageArea::Local => "write_local_storage",
    }
}

/// Script returning every entry of `area`.
pub fn read_script(area: StorageArea) -> PageScript {
    PageScript::new(read_script_name(area), move |page| match page.storage(area) {
        Ok(storage) => OperationOutcome::Success(storage.entries().into_iter().collect()),
        Err(e) => OperationOutcome::failure(e.to_string()),
    })
}

/// Script writing `payload` into `area`.
///
/// A key that fails to write is logged and skipped; the remaining keys are
/// still written.
pub fn write_script(
    area: StorageArea,
    policy: WritePolicy,
    payload: OperationOutcome<KeyValueSnapshot>,
) -> PageScript {
    PageScript::new(write_script_name(area), move |page| {
        let snapshot = match payload {
            OperationOutcome::Success(snapshot) => snapshot,
            OperationOutcome::Failure { .. } => {
                warn!(area = %area, "Refusing to write a payload without a success marker");
                return OperationOutcome::failure(INVALID_DATA_FORMAT);
            }
        };

        let storage = match page.storage(area) {
            Ok(storage) => storage,
            Err(e) => return OperationOutcome::failure(e.to_string()),
        };

        if policy == WritePolicy::ReplaceAll {
            storage.clear();
        }

        for (key, value) in snapshot.iter() {
            if let Err(e) = storage.set_item(key, value) {
                warn!(area = %area, key = %key, error = %e, "Failed to write storage item");
            }
        }

        OperationOutcome::Success(snapshot)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;
    use tabrelay_types::ContextInfo;

    const SOURCE: ContextId = ContextId::new(1);
    const TARGET: ContextId = ContextId::new(2);

    fn setup() -> Arc<InMemoryHost> {
        let host = Arc::new(InMemoryHost::new());
        host.open_tab(ContextInfo::new(1, "https://source.test/"));
        host.open_tab(ContextInfo::new(2, "https://target.test/"));
        host
    }

    fn snapshot(pairs: &[(&str, &str)]) -> KeyValueSnapshot {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_write_policy_per_area() {
        let host = setup();
        let session = StorageReplicator::session(host.clone());
        assert_eq!(session.area(), StorageArea::Session);
        assert_eq!(session.policy(), WritePolicy::ReplaceAll);

        let local = StorageReplicator::local(host);
        assert_eq!(local.area(), StorageArea::Local);
        assert_eq!(local.policy(), WritePolicy::Overlay);
        assert_eq!(local.kind(), StorageKind::LocalStorage);
    }

    #[tokio::test]
    async fn test_extract_reads_every_entry() {
        let host = setup();
        host.set_item(SOURCE, StorageArea::Session, "theme", "dark");
        host.set_item(SOURCE, StorageArea::Session, "lang", "en");

        let replicator = StorageReplicator::session(host.clone());
        let output = replicator.extract(SOURCE).await.unwrap();
        assert_eq!(
            output,
            OperationOutcome::Success(snapshot(&[("lang", "en"), ("theme", "dark")]))
        );
    }

    #[tokio::test]
    async fn test_extract_denied_store_is_failure_outcome() {
        let host = setup();
        host.deny_storage(SOURCE, StorageArea::Local);

        let replicator = StorageReplicator::local(host.clone());
        let output = replicator.extract(SOURCE).await.unwrap();
        assert_eq!(
            output.failure_message(),
            Some("Failed to read the 'localStorage' property from 'Window': Access is denied for this document.")
        );
    }

    #[tokio::test]
    async fn test_extract_closed_tab_is_host_error() {
        let host = setup();
        host.close_tab(SOURCE);
        let replicator = StorageReplicator::session(host.clone());
        assert!(replicator.extract(SOURCE).await.is_err());
    }

    #[tokio::test]
    async fn test_session_inject_replaces_existing_contents() {
        let host = setup();
        host.set_item(TARGET, StorageArea::Session, "stale", "x");

        let replicator = StorageReplicator::session(host.clone());
        let output = replicator
            .inject(TARGET, OperationOutcome::Success(snapshot(&[("theme", "dark")])))
            .await
            .unwrap();
        assert!(output.is_success());
        assert_eq!(
            host.storage(TARGET, StorageArea::Session),
            Some(snapshot(&[("theme", "dark")]))
        );
    }

    #[tokio::test]
    async fn test_local_inject_overlays_existing_contents() {
        let host = setup();
        host.set_item(TARGET, StorageArea::Local, "kept", "1");
        host.set_item(TARGET, StorageArea::Local, "token", "old");

        let replicator = StorageReplicator::local(host.clone());
        replicator
            .inject(TARGET, OperationOutcome::Success(snapshot(&[("token", "new")])))
            .await
            .unwrap();
        assert_eq!(
            host.storage(TARGET, StorageArea::Local),
            Some(snapshot(&[("kept", "1"), ("token", "new")]))
        );
    }

    #[tokio::test]
    async fn test_inject_rejects_failure_payload() {
        let host = setup();
        host.set_item(TARGET, StorageArea::Session, "untouched", "1");

        let replicator = StorageReplicator::session(host.clone());
        let output = replicator
            .inject(TARGET, OperationOutcome::failure("upstream broke"))
            .await
            .unwrap();
        assert_eq!(output.failure_message(), Some(INVALID_DATA_FORMAT));
        assert_eq!(
            host.storage(TARGET, StorageArea::Session),
            Some(snapshot(&[("untouched", "1")]))
        );
    }

    #[tokio::test]
    async fn test_rejected_key_does_not_block_the_rest() {
        let host = setup();
        host.reject_key(TARGET, StorageArea::Local, "huge");

        let replicator = StorageReplicator::local(host.clone());
        let output = replicator
            .inject(
                TARGET,
                OperationOutcome::Success(snapshot(&[("a", "1"), ("huge", "..."), ("z", "26")])),
            )
            .await
            .unwrap();
        assert!(output.is_success());
        assert_eq!(
            host.storage(TARGET, StorageArea::Local),
            Some(snapshot(&[("a", "1"), ("z", "26")]))
        );
    }
}
