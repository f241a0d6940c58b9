//! In-memory host for development and testing.
//!
//! Implements the registry, executor and cookie store over plain maps and
//! lets tests inject the failures a real browser produces: closed tabs,
//! denied storage access, rejected writes and failing cookie queries.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dashmap::DashMap;
use tabrelay_types::{ContextId, ContextInfo, CookieRecord, KeyValueSnapshot};
use url::Url;

use super::traits::{
    ContextExecutor, ContextRegistry, CookieSpec, CookieStore, HostError, PageError, PageScope,
    PageScript, ScriptOutput, StorageArea, WebStorage,
};

/// One script execution seen by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub context: ContextId,
    pub script: &'static str,
}

#[derive(Debug, Default)]
struct MemoryStorage {
    items: BTreeMap<String, String>,
    denied: bool,
    rejected_keys: HashSet<String>,
}

impl WebStorage for MemoryStorage {
    fn entries(&self) -> Vec<(String, String)> {
        self.items
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), PageError> {
        if self.rejected_keys.contains(key) {
            return Err(PageError::new(format!(
                "Failed to execute 'setItem' on 'Storage': Setting the value of '{key}' exceeded the quota."
            )));
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}

#[derive(Debug)]
struct TabState {
    info: ContextInfo,
    session: MemoryStorage,
    local: MemoryStorage,
}

impl TabState {
    fn area(&mut self, area: StorageArea) -> &mut MemoryStorage {
        match area {
            StorageArea::Session => &mut self.session,
            StorageArea::Local => &mut self.local,
        }
    }
}

impl PageScope for TabState {
    fn storage(&mut self, area: StorageArea) -> Result<&mut dyn WebStorage, PageError> {
        let store = self.area(area);
        if store.denied {
            return Err(PageError::new(format!(
                "Failed to read the '{}' property from 'Window': Access is denied for this document.",
                area.global_name()
            )));
        }
        Ok(store as &mut dyn WebStorage)
    }
}

/// In-memory browser host.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    tabs: DashMap<ContextId, TabState>,
    cookies: Mutex<Vec<CookieRecord>>,
    cookie_query_failure: Mutex<Option<String>>,
    executions: Mutex<Vec<ExecutionRecord>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn no_tab(context: ContextId) -> HostError {
    HostError::new(format!("No tab with id: {}.", context.get()))
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a tab, replacing any tab with the same id.
    pub fn open_tab(&self, info: ContextInfo) {
        self.tabs.insert(
            info.id,
            TabState {
                info,
                session: MemoryStorage::default(),
                local: MemoryStorage::default(),
            },
        );
    }

    /// Close a tab; later calls addressing it fail like a closed browser tab.
    pub fn close_tab(&self, context: ContextId) {
        self.tabs.remove(&context);
    }

    pub fn set_item(&self, context: ContextId, area: StorageArea, key: &str, value: &str) {
        if let Some(mut tab) = self.tabs.get_mut(&context) {
            tab.area(area).items.insert(key.to_string(), value.to_string());
        }
    }

    /// Make every access to `area` in `context` fail.
    pub fn deny_storage(&self, context: ContextId, area: StorageArea) {
        if let Some(mut tab) = self.tabs.get_mut(&context) {
            tab.area(area).denied = true;
        }
    }

    /// Make writes of `key` to `area` in `context` fail.
    pub fn reject_key(&self, context: ContextId, area: StorageArea, key: &str) {
        if let Some(mut tab) = self.tabs.get_mut(&context) {
            tab.area(area).rejected_keys.insert(key.to_string());
        }
    }

    /// Contents of a storage area, or `None` for an unknown tab.
    pub fn storage(&self, context: ContextId, area: StorageArea) -> Option<KeyValueSnapshot> {
        self.tabs.get_mut(&context).map(|mut tab| {
            KeyValueSnapshot::from(tab.area(area).items.clone())
        })
    }

    pub fn add_cookie(&self, record: CookieRecord) {
        upsert_cookie(&mut lock(&self.cookies), record);
    }

    /// Every cookie in the jar, in insertion order.
    pub fn cookies(&self) -> Vec<CookieRecord> {
        lock(&self.cookies).clone()
    }

    /// Make cookie queries fail with `message`, or succeed again with `None`.
    pub fn fail_cookie_queries(&self, message: Option<&str>) {
        *lock(&self.cookie_query_failure) = message.map(str::to_string);
    }

    /// Every script execution, in call order.
    pub fn executions(&self) -> Vec<ExecutionRecord> {
        lock(&self.executions).clone()
    }

    /// Executions of the named script.
    pub fn executions_of(&self, script: &str) -> Vec<ExecutionRecord> {
        self.executions()
            .into_iter()
            .filter(|record| record.script == script)
            .collect()
    }
}

#[async_trait]
impl ContextRegistry for InMemoryHost {
    async fn get(&self, context: ContextId) -> Result<ContextInfo, HostError> {
        self.tabs
            .get(&context)
            .map(|tab| tab.info.clone())
            .ok_or_else(|| no_tab(context))
    }

    async fn query(&self) -> Result<Vec<ContextInfo>, HostError> {
        let mut contexts: Vec<ContextInfo> =
            self.tabs.iter().map(|tab| tab.info.clone()).collect();
        contexts.sort_by_key(|info| info.id);
        Ok(contexts)
    }
}

#[async_trait]
impl ContextExecutor for InMemoryHost {
    async fn execute(&self, context: ContextId, script: PageScript) -> Result<ScriptOutput, HostError> {
        lock(&self.executions).push(ExecutionRecord {
            context,
            script: script.name(),
        });

        let mut tab = self.tabs.get_mut(&context).ok_or_else(|| no_tab(context))?;
        if tab.info.url.starts_with("chrome://") {
            return Err(HostError::new("Cannot access a chrome:// URL"));
        }
        Ok(script.run(&mut *tab))
    }
}

#[async_trait]
impl CookieStore for InMemoryHost {
    async fn get_all(&self, url: &str) -> Result<Vec<CookieRecord>, HostError> {
        if let Some(message) = lock(&self.cookie_query_failure).clone() {
            return Err(HostError::new(message));
        }

        let url = parse_url(url)?;
        let host = url.host_str().unwrap_or_default();
        let secure_channel = url.scheme() == "https";

        Ok(lock(&self.cookies)
            .iter()
            .filter(|cookie| domain_matches(host, &cookie.domain, cookie.host_only))
            .filter(|cookie| path_matches(url.path(), &cookie.path))
            .filter(|cookie| !cookie.secure || secure_channel)
            .cloned()
            .collect())
    }

    async fn set(&self, spec: CookieSpec) -> Result<CookieRecord, HostError> {
        let url = parse_url(&spec.url)?;
        let host = url.host_str().unwrap_or_default().to_string();
        let rejected = || HostError::new(format!("Failed to parse or set cookie named \"{}\".", spec.name));

        let (domain, host_only) = match &spec.domain {
            Some(domain) => {
                if !domain_matches(&host, domain, false) {
                    return Err(rejected());
                }
                let domain = domain.trim_start_matches('.');
                (format!(".{domain}"), false)
            }
            None => (host, true),
        };
        if spec.secure && url.scheme() != "https" {
            return Err(rejected());
        }

        let record = CookieRecord {
            name: spec.name,
            value: spec.value,
            domain,
            path: spec.path.unwrap_or_else(|| "/".to_string()),
            secure: spec.secure,
            http_only: spec.http_only,
            host_only,
            expiration_date: spec.expiration_date,
        };
        upsert_cookie(&mut lock(&self.cookies), record.clone());
        Ok(record)
    }
}

fn parse_url(url: &str) -> Result<Url, HostError> {
    Url::parse(url).map_err(|_| HostError::new(format!("Invalid url: \"{url}\".")))
}

fn upsert_cookie(jar: &mut Vec<CookieRecord>, record: CookieRecord) {
    match jar.iter_mut().find(|c| {
        c.name == record.name && c.domain == record.domain && c.path == record.path
    }) {
        Some(existing) => *existing = record,
        None => jar.push(record),
    }
}

fn domain_matches(host: &str, domain: &str, host_only: bool) -> bool {
    if host_only {
        return host == domain;
    }
    let domain = domain.trim_start_matches('.');
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if cookie_path == "/" || request_path == cookie_path {
        return true;
    }
    request_path.strip_prefix(cookie_path).is_some_and(|rest| {
        cookie_path.ends_with('/') || rest.starts_with('/')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabrelay_types::OperationOutcome;

    fn host_with_tab() -> InMemoryHost {
        let host = InMemoryHost::new();
        host.open_tab(ContextInfo::new(1, "https://app.example.com/dashboard"));
        host
    }

    #[tokio::test]
    async fn test_execute_runs_script_against_tab_storage() {
        let host = host_with_tab();
        host.set_item(ContextId::new(1), StorageArea::Session, "k", "v");

        let script = PageScript::new("probe", |page| {
            let storage = match page.storage(StorageArea::Session) {
                Ok(storage) => storage,
                Err(e) => return OperationOutcome::failure(e.to_string()),
            };
            OperationOutcome::Success(storage.entries().into_iter().collect())
        });
        let output = host.execute(ContextId::new(1), script).await.unwrap();
        assert_eq!(output.data().and_then(|d| d.get("k")), Some("v"));
        assert_eq!(host.executions_of("probe").len(), 1);
    }

    #[tokio::test]
    async fn test_closed_tab_is_a_host_error() {
        let host = host_with_tab();
        host.close_tab(ContextId::new(1));

        let script = PageScript::new("noop", |_| OperationOutcome::Success(KeyValueSnapshot::new()));
        let err = host.execute(ContextId::new(1), script).await.unwrap_err();
        assert_eq!(err.message(), "No tab with id: 1.");
        assert!(host.get(ContextId::new(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_privileged_pages_cannot_be_scripted() {
        let host = InMemoryHost::new();
        host.open_tab(ContextInfo::new(3, "chrome://settings/"));
        let script = PageScript::new("noop", |_| OperationOutcome::Success(KeyValueSnapshot::new()));
        let err = host.execute(ContextId::new(3), script).await.unwrap_err();
        assert_eq!(err.message(), "Cannot access a chrome:// URL");
    }

    #[tokio::test]
    async fn test_cookie_visibility_rules() {
        let host = InMemoryHost::new();
        let mut parent = CookieRecord::new("parent", "1", ".example.com");
        parent.host_only = false;
        let mut scoped = CookieRecord::new("scoped", "2", "app.example.com");
        scoped.path = "/admin".to_string();
        let mut secure = CookieRecord::new("secure", "3", "app.example.com");
        secure.secure = true;
        host.add_cookie(parent);
        host.add_cookie(scoped);
        host.add_cookie(secure);
        host.add_cookie(CookieRecord::new("other", "4", "other.org"));

        let names = |cookies: Vec<CookieRecord>| {
            cookies.into_iter().map(|c| c.name).collect::<Vec<_>>()
        };

        let https = host.get_all("https://app.example.com/admin/users").await.unwrap();
        assert_eq!(names(https), vec!["parent", "scoped", "secure"]);

        let http = host.get_all("http://app.example.com/").await.unwrap();
        assert_eq!(names(http), vec!["parent"]);
    }

    #[tokio::test]
    async fn test_set_rejects_foreign_domain() {
        let host = InMemoryHost::new();
        let spec = CookieSpec::from_record(
            "https://y.com/",
            &CookieRecord::new("a", "1", "x.com"),
        );
        let err = host.set(spec).await.unwrap_err();
        assert_eq!(err.message(), "Failed to parse or set cookie named \"a\".");
        assert!(host.cookies().is_empty());
    }

    #[tokio::test]
    async fn test_set_upserts_by_name_domain_and_path() {
        let host = InMemoryHost::new();
        for value in ["1", "2"] {
            let spec = CookieSpec::from_record(
                "https://x.com/",
                &CookieRecord::new("a", value, "x.com"),
            );
            host.set(spec).await.unwrap();
        }
        let cookies = host.cookies();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].value, "2");
        assert_eq!(cookies[0].domain, ".x.com");
    }

    #[tokio::test]
    async fn test_cookie_query_failure() {
        let host = InMemoryHost::new();
        host.fail_cookie_queries(Some("cookie store unavailable"));
        let err = host.get_all("https://x.com/").await.unwrap_err();
        assert_eq!(err.message(), "cookie store unavailable");

        host.fail_cookie_queries(None);
        assert!(host.get_all("https://x.com/").await.unwrap().is_empty());
    }

    #[test]
    fn test_domain_and_path_matching() {
        assert!(domain_matches("a.x.com", ".x.com", false));
        assert!(domain_matches("x.com", "x.com", false));
        assert!(!domain_matches("evilx.com", "x.com", false));
        assert!(!domain_matches("a.x.com", "x.com", true));
        assert!(path_matches("/admin/users", "/admin"));
        assert!(!path_matches("/administrator", "/admin"));
        assert!(path_matches("/anything", "/"));
    }
}
