pub mod activities;
pub mod config;
pub mod contacts;
pub mod deals;
pub mod records;
pub mod session;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use crm_backend::{BackendClient, BackendError};
use crm_core::adapter::Adapters;
use crm_core::config::Config;
use crm_core::notify::{ToastLevel, ToastQueue, ToastSettings};
use crm_core::store::RecordStore;

use self::watch::WatchedStore;

/// Everything a record command needs: adapters sharing one store, and the
/// toast queue they report into.
pub struct Context {
    pub adapters: Adapters,
    pub toasts: Arc<ToastQueue>,
    pub json: bool,
    store: Arc<WatchedStore>,
}

impl Context {
    pub fn new(config: &Config, store: Arc<dyn RecordStore>, json: bool) -> Self {
        let toasts = Arc::new(ToastQueue::new(ToastSettings::from(&config.notifications)));
        let store = Arc::new(WatchedStore::new(store));
        let adapters = Adapters::new(store.clone(), toasts.clone(), &config.records);
        Self {
            adapters,
            toasts,
            json,
            store,
        }
    }

    /// Connect to the platform named in `config`.
    pub fn connect(config: Config, json: bool) -> anyhow::Result<Self> {
        let client = BackendClient::from_config(&config.backend).map_err(friendly_error)?;
        tracing::debug!(base_url = client.base_url(), "backend client ready");
        Ok(Self::new(&config, Arc::new(client), json))
    }

    /// Print pending toasts to stderr, oldest first. Returns how many.
    pub fn flush_toasts(&self) -> usize {
        let toasts = self.toasts.drain();
        for toast in &toasts {
            eprintln!("[{}] {}", toast.level.icon(), toast.message);
        }
        toasts.len()
    }

    /// Whether any error toast is waiting.
    pub fn has_errors(&self) -> bool {
        self.toasts
            .visible()
            .iter()
            .any(|toast| toast.level == ToastLevel::Error)
    }

    /// Turn an empty read into an error when the store call behind it
    /// failed. An empty result from a healthy store passes.
    pub fn ensure_loaded(&self, empty: bool, what: &str) -> anyhow::Result<()> {
        if !empty {
            return Ok(());
        }
        if self.has_errors() {
            anyhow::bail!("could not list {what}");
        }
        if let Some(reason) = self.store.last_failure() {
            anyhow::bail!("could not list {what}: {reason}");
        }
        Ok(())
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    config.map_err(|e| anyhow::anyhow!("could not load config: {e}"))
}

/// Map backend construction errors to user-friendly messages.
pub fn friendly_error(err: BackendError) -> anyhow::Error {
    match err {
        BackendError::MissingProjectId(detail) => anyhow::anyhow!(
            "No project id configured ({detail}).\n  \
             (hint: add `project_id` under [backend] in ~/.crm/config.toml)"
        ),
        BackendError::InvalidBaseUrl(url) => anyhow::anyhow!(
            "backend.base_url {url:?} is not an http(s) URL. Check --config."
        ),
        BackendError::Http(e) => anyhow::anyhow!("Could not set up the HTTP client: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_core::notify::Notifier;
    use crm_core::MemoryStore;

    #[test]
    fn flush_drains_the_queue() {
        let ctx = Context::new(&Config::default(), Arc::new(MemoryStore::new()), false);
        ctx.toasts.error("Contact: Email is required");
        ctx.toasts.success("Contact created successfully");
        assert!(ctx.has_errors());
        assert_eq!(ctx.flush_toasts(), 2);
        assert_eq!(ctx.flush_toasts(), 0);
        assert!(!ctx.has_errors());
    }

    #[tokio::test]
    async fn unreachable_store_fails_empty_reads() {
        let store = Arc::new(MemoryStore::new());
        let ctx = Context::new(&Config::default(), store.clone(), false);
        assert!(ctx.adapters.contacts.list(None).await.is_empty());
        ctx.ensure_loaded(true, "contacts").unwrap();

        store.set_transport_failure(true);
        assert!(ctx.adapters.contacts.list(None).await.is_empty());
        assert!(!ctx.has_errors());
        let err = ctx.ensure_loaded(true, "contacts").unwrap_err();
        assert_eq!(
            err.to_string(),
            "could not list contacts: transport error: connection refused"
        );
        ctx.ensure_loaded(false, "contacts").unwrap();
    }

    #[test]
    fn missing_project_id_mentions_the_config_file() {
        let err = friendly_error(BackendError::MissingProjectId("set it".into()));
        assert!(err.to_string().contains("config.toml"));
    }
}
