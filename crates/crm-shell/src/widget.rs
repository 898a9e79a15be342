//! Contract with the hosted sign-in widget.
//!
//! The widget owns the login/signup UI and reports back through two
//! callbacks. [`AuthCallbacks`] turns those callbacks into [`AuthOutcome`]
//! messages on a flume channel so the shell reacts to them in one place.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::session::UserRecord;

// ---------------------------------------------------------------------------
// Client handle
// ---------------------------------------------------------------------------

/// Credentials the widget and the record API are constructed with.
#[derive(Clone, Default)]
pub struct ClientConfig {
    pub project_id: String,
    pub public_key: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("project_id", &self.project_id)
            .field("public_key", &self.public_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The one client instance the shell hands to the widget.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub instance: Uuid,
    pub config: ClientConfig,
}

impl ClientHandle {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            instance: Uuid::new_v4(),
            config,
        }
    }
}

// ---------------------------------------------------------------------------
// Setup options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetView {
    #[default]
    Both,
    Login,
    Signup,
}

impl WidgetView {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetView::Both => "both",
            WidgetView::Login => "login",
            WidgetView::Signup => "signup",
        }
    }
}

impl FromStr for WidgetView {
    type Err = WidgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(WidgetView::Both),
            "login" => Ok(WidgetView::Login),
            "signup" => Ok(WidgetView::Signup),
            other => Err(WidgetError::Setup(format!("unknown widget view {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupOptions {
    /// Element the widget renders into, e.g. `#authentication`.
    pub target: String,
    pub client_id: String,
    pub view: WidgetView,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why no user came back. Navigation treats both kinds alike; the kind is
/// kept for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    NoSession,
    Error(String),
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::NoSession => f.write_str("no session"),
            AuthFailure::Error(message) => write!(f, "error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Success(UserRecord),
    Failure(AuthFailure),
}

/// The success/error callbacks registered with the widget.
#[derive(Debug, Clone)]
pub struct AuthCallbacks {
    tx: flume::Sender<AuthOutcome>,
}

impl AuthCallbacks {
    pub fn new(tx: flume::Sender<AuthOutcome>) -> Self {
        Self { tx }
    }

    /// The widget's success callback. A success without a user means there
    /// is no session.
    pub fn on_success(&self, user: Option<UserRecord>) {
        let outcome = match user {
            Some(user) => AuthOutcome::Success(user),
            None => AuthOutcome::Failure(AuthFailure::NoSession),
        };
        self.send(outcome);
    }

    pub fn on_error(&self, message: impl Into<String>) {
        self.send(AuthOutcome::Failure(AuthFailure::Error(message.into())));
    }

    fn send(&self, outcome: AuthOutcome) {
        if self.tx.send(outcome).is_err() {
            tracing::warn!("auth outcome dropped: shell is gone");
        }
    }
}

// ---------------------------------------------------------------------------
// Widget trait
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    #[error("widget setup failed: {0}")]
    Setup(String),
    #[error("logout failed: {0}")]
    Logout(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait SessionWidget: Send + Sync {
    /// Mount the widget and start the session check. The outcome arrives
    /// through `callbacks`, possibly after this returns.
    async fn setup(
        &self,
        client: &ClientHandle,
        options: &SetupOptions,
        callbacks: AuthCallbacks,
    ) -> Result<(), WidgetError>;

    /// End the session on the provider side.
    async fn logout(&self) -> Result<(), WidgetError>;
}

// ---------------------------------------------------------------------------
// ScriptedWidget
// ---------------------------------------------------------------------------

/// A widget that answers from a script instead of a provider.
#[derive(Debug)]
pub struct ScriptedWidget {
    outcome: Mutex<Option<AuthOutcome>>,
    logout_error: Mutex<Option<String>>,
    setups: AtomicUsize,
    logouts: AtomicUsize,
    last_options: Mutex<Option<SetupOptions>>,
}

impl ScriptedWidget {
    /// Reports `user` (or no session) on setup.
    pub fn signed_in(user: Option<UserRecord>) -> Self {
        let outcome = match user {
            Some(user) => AuthOutcome::Success(user),
            None => AuthOutcome::Failure(AuthFailure::NoSession),
        };
        Self::with_outcome(Some(outcome))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_outcome(Some(AuthOutcome::Failure(AuthFailure::Error(
            message.to_string(),
        ))))
    }

    /// Never calls back; the shell stays on its loader.
    pub fn silent() -> Self {
        Self::with_outcome(None)
    }

    fn with_outcome(outcome: Option<AuthOutcome>) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            logout_error: Mutex::new(None),
            setups: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    pub fn reject_logout(self, message: &str) -> Self {
        *lock(&self.logout_error) = Some(message.to_string());
        self
    }

    pub fn setup_calls(&self) -> usize {
        self.setups.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<SetupOptions> {
        lock(&self.last_options).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl SessionWidget for ScriptedWidget {
    async fn setup(
        &self,
        _client: &ClientHandle,
        options: &SetupOptions,
        callbacks: AuthCallbacks,
    ) -> Result<(), WidgetError> {
        self.setups.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_options) = Some(options.clone());
        let outcome = lock(&self.outcome).clone();
        match outcome {
            Some(AuthOutcome::Success(user)) => callbacks.on_success(Some(user)),
            Some(AuthOutcome::Failure(AuthFailure::NoSession)) => callbacks.on_success(None),
            Some(AuthOutcome::Failure(AuthFailure::Error(message))) => callbacks.on_error(message),
            None => {}
        }
        Ok(())
    }

    async fn logout(&self) -> Result<(), WidgetError> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        match lock(&self.logout_error).clone() {
            Some(message) => Err(WidgetError::Logout(message)),
            None => Ok(()),
        }
    }
}
