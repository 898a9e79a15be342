//! Application shell: mounts the session widget once, turns its outcomes
//! into navigation, and guards every route until the first outcome lands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crm_core::config::SessionConfig;

use crate::auth_state::AuthEvent;
use crate::navigation::{
    after_sign_in, after_sign_in_failure, with_redirect, Navigator, LOGIN_PATH,
};
use crate::routes::{Location, Route};
use crate::session::SessionStore;
use crate::widget::{
    AuthCallbacks, AuthOutcome, ClientConfig, ClientHandle, SessionWidget, SetupOptions,
    WidgetError, WidgetView,
};

/// What the router shows for a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteView {
    /// The widget has not reported yet.
    Loading,
    Page(Route),
    Redirect(String),
    NotFound,
}

#[derive(Debug, Clone)]
pub struct ShellOptions {
    pub mount_target: String,
    pub view: WidgetView,
    pub default_landing: String,
    pub client: ClientConfig,
}

impl ShellOptions {
    pub fn from_config(session: &SessionConfig, client: ClientConfig) -> Result<Self, WidgetError> {
        Ok(Self {
            mount_target: session.mount_target.clone(),
            view: session.view.parse()?,
            default_landing: session.default_landing.clone(),
            client,
        })
    }
}

impl Default for ShellOptions {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            mount_target: session.mount_target,
            view: WidgetView::Both,
            default_landing: session.default_landing,
            client: ClientConfig::default(),
        }
    }
}

pub struct Shell {
    options: ShellOptions,
    widget: Arc<dyn SessionWidget>,
    navigator: Arc<dyn Navigator>,
    session: SessionStore,
    client: OnceLock<ClientHandle>,
    mounted: AtomicBool,
    outcomes_tx: flume::Sender<AuthOutcome>,
    outcomes_rx: flume::Receiver<AuthOutcome>,
}

impl Shell {
    pub fn new(
        options: ShellOptions,
        widget: Arc<dyn SessionWidget>,
        navigator: Arc<dyn Navigator>,
        session: SessionStore,
    ) -> Self {
        let (outcomes_tx, outcomes_rx) = flume::unbounded();
        Self {
            options,
            widget,
            navigator,
            session,
            client: OnceLock::new(),
            mounted: AtomicBool::new(false),
            outcomes_tx,
            outcomes_rx,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The client handle, built on first use.
    pub fn client(&self) -> &ClientHandle {
        self.client.get_or_init(|| {
            let handle = ClientHandle::new(self.options.client.clone());
            tracing::debug!(instance = %handle.instance, "client handle created");
            handle
        })
    }

    /// Hand the widget its options and callbacks. Only the first call
    /// reaches the widget.
    pub async fn mount(&self) -> Result<(), WidgetError> {
        if self.mounted.swap(true, Ordering::SeqCst) {
            tracing::debug!("session widget already mounted");
            return Ok(());
        }
        self.session.init();
        let options = SetupOptions {
            target: self.options.mount_target.clone(),
            client_id: self.options.client.project_id.clone(),
            view: self.options.view,
        };
        let callbacks = AuthCallbacks::new(self.outcomes_tx.clone());
        tracing::info!(mount = %options.target, view = options.view.as_str(), "mounting session widget");
        if let Err(e) = self.widget.setup(self.client(), &options, callbacks).await {
            self.mounted.store(false, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }

    /// Mount, wait for the first outcome, and navigate. Returns where the
    /// user was sent. Once initialized, applies whatever is pending and
    /// returns the current location instead of waiting again.
    pub async fn bootstrap(&self) -> Result<String, WidgetError> {
        if self.session.is_initialized() {
            return Ok(self
                .pump()
                .pop()
                .unwrap_or_else(|| self.navigator.current().to_string()));
        }
        self.mount().await?;
        let outcome = self
            .outcomes_rx
            .recv_async()
            .await
            .map_err(|e| WidgetError::Setup(e.to_string()))?;
        Ok(self.apply(outcome))
    }

    /// Apply outcomes that arrived since the last call, e.g. a sign-in that
    /// happened on the login page. Returns the navigation targets in order.
    pub fn pump(&self) -> Vec<String> {
        self.outcomes_rx
            .try_iter()
            .map(|outcome| self.apply(outcome))
            .collect()
    }

    /// Record the outcome in the session store and navigate.
    pub fn apply(&self, outcome: AuthOutcome) -> String {
        let current = self.navigator.current();
        let target = match outcome {
            AuthOutcome::Success(user) => {
                tracing::info!(user = %user.display_name(), "signed in");
                if let Err(e) = self.session.sign_in(user) {
                    tracing::warn!(error = %e, "unexpected sign-in");
                }
                after_sign_in(&current, &self.options.default_landing)
            }
            AuthOutcome::Failure(failure) => {
                tracing::info!(reason = %failure, "not signed in");
                if let Err(e) = self.session.sign_out(AuthEvent::SignInFailed) {
                    tracing::warn!(error = %e, "unexpected sign-in failure");
                }
                after_sign_in_failure(&current)
            }
        };
        tracing::debug!(from = %current, to = %target, "auth redirect");
        self.navigator.navigate(&target);
        target
    }

    /// Route guard.
    pub fn render(&self, location: &Location) -> RouteView {
        if !self.session.is_initialized() {
            return RouteView::Loading;
        }
        match location.route() {
            Some(Route::Root) => RouteView::Redirect(self.options.default_landing.clone()),
            Some(route) if route.is_protected() && !self.session.is_authenticated() => {
                RouteView::Redirect(with_redirect(LOGIN_PATH, &location.to_string()))
            }
            Some(route) => RouteView::Page(route),
            None => RouteView::NotFound,
        }
    }

    /// Render the navigator's current location.
    pub fn render_current(&self) -> RouteView {
        self.render(&self.navigator.current())
    }

    /// End the session. A provider-side failure is logged and the local
    /// session is cleared anyway.
    pub async fn logout(&self) {
        if let Err(e) = self.widget.logout().await {
            tracing::error!(error = %e, "logout failed");
        }
        if let Err(e) = self.session.sign_out(AuthEvent::LoggedOut) {
            tracing::debug!(error = %e, "logout without a session");
        }
        self.navigator.navigate(LOGIN_PATH);
    }
}
