//! The signed-in user, held for the lifetime of the shell.
//!
//! [`SessionStore`] is the single source of truth for "who is signed in".
//! It is cheap to clone and hands out flume receivers so pages can react to
//! sign-in and sign-out without polling.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth_state::{AuthEvent, AuthState, AuthStateMachine, TransitionError};

/// User identity as handed over by the session widget. Fields the CRM does
/// not read are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    /// "First Last", else the email address, else "user".
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !name.is_empty() {
            return name;
        }
        self.email_address
            .clone()
            .filter(|email| !email.is_empty())
            .unwrap_or_else(|| "user".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub is_authenticated: bool,
    pub user: Option<UserRecord>,
}

/// Published to subscribers whenever the signed-in user changes.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthChange {
    SignedIn(UserRecord),
    SignedOut,
}

#[derive(Debug, Default)]
struct Inner {
    session: Session,
    machine: AuthStateMachine,
    subscribers: Vec<flume::Sender<AuthChange>>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a signed-out, uninitialized session. Existing subscribers
    /// are kept.
    pub fn init(&self) {
        let mut inner = self.lock();
        inner.session = Session::default();
        inner.machine = AuthStateMachine::new();
        tracing::debug!("session store initialized");
    }

    /// Register for sign-in/sign-out notifications.
    pub fn on_auth_change(&self) -> flume::Receiver<AuthChange> {
        let (tx, rx) = flume::unbounded();
        self.lock().subscribers.push(tx);
        rx
    }

    /// Drop every subscriber and forget the user.
    pub fn teardown(&self) {
        let mut inner = self.lock();
        let dropped = inner.subscribers.len();
        inner.subscribers.clear();
        inner.session = Session::default();
        inner.machine = AuthStateMachine::new();
        tracing::debug!(subscribers = dropped, "session store torn down");
    }

    pub fn sign_in(&self, user: UserRecord) -> Result<AuthState, TransitionError> {
        let mut inner = self.lock();
        let state = inner.machine.transition(AuthEvent::SignedIn)?;
        inner.session = Session {
            is_authenticated: true,
            user: Some(user.clone()),
        };
        publish(&mut inner.subscribers, AuthChange::SignedIn(user));
        Ok(state)
    }

    /// Clear the user after a failed sign-in or a logout. The session is
    /// cleared even when `event` does not apply in the current state.
    pub fn sign_out(&self, event: AuthEvent) -> Result<AuthState, TransitionError> {
        let mut inner = self.lock();
        let was_signed_in = inner.session.is_authenticated;
        let result = inner.machine.transition(event);
        inner.session = Session::default();
        if was_signed_in || result.is_ok() {
            publish(&mut inner.subscribers, AuthChange::SignedOut);
        }
        result
    }

    pub fn snapshot(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn state(&self) -> AuthState {
        self.lock().machine.state()
    }

    pub fn is_initialized(&self) -> bool {
        self.state().is_initialized()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_authenticated
    }

    pub fn user(&self) -> Option<UserRecord> {
        self.lock().session.user.clone()
    }

    pub fn history(&self) -> Vec<(AuthState, AuthEvent, AuthState)> {
        self.lock().machine.history().to_vec()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Disconnected subscribers are pruned.
fn publish(subscribers: &mut Vec<flume::Sender<AuthChange>>, change: AuthChange) {
    subscribers.retain(|tx| tx.send(change.clone()).is_ok());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ada() -> UserRecord {
        serde_json::from_value(json!({
            "userId": 31,
            "emailAddress": "ada@example.com",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "accounts": [{ "companyId": 4 }]
        }))
        .unwrap()
    }

    #[test]
    fn user_record_keeps_unknown_fields() {
        let user = ada();
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert_eq!(user.extra["accounts"][0]["companyId"], 4);
        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["userId"], 31);
        assert_eq!(back["accounts"], json!([{ "companyId": 4 }]));
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user = UserRecord {
            email_address: Some("grace@example.com".into()),
            ..UserRecord::default()
        };
        assert_eq!(user.display_name(), "grace@example.com");
        assert_eq!(UserRecord::default().display_name(), "user");
    }

    #[test]
    fn sign_in_notifies_subscribers() {
        let store = SessionStore::new();
        store.init();
        let rx = store.on_auth_change();

        store.sign_in(ada()).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(rx.try_recv().unwrap(), AuthChange::SignedIn(ada()));

        store.sign_out(AuthEvent::LoggedOut).unwrap();
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        assert_eq!(rx.try_recv().unwrap(), AuthChange::SignedOut);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let store = SessionStore::new();
        let rx = store.on_auth_change();
        let _kept = store.on_auth_change();
        drop(rx);
        store.sign_in(ada()).unwrap();
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn invalid_logout_still_clears() {
        let store = SessionStore::new();
        store.sign_out(AuthEvent::SignInFailed).unwrap();
        let err = store.sign_out(AuthEvent::LoggedOut).unwrap_err();
        assert_eq!(err.state, AuthState::Unauthenticated);
        assert_eq!(store.snapshot(), Session::default());
    }

    #[test]
    fn teardown_resets_everything() {
        let store = SessionStore::new();
        let rx = store.on_auth_change();
        store.sign_in(ada()).unwrap();
        store.teardown();

        assert_eq!(store.subscriber_count(), 0);
        assert_eq!(store.state(), AuthState::Uninitialized);
        assert!(!store.is_authenticated());
        // the sign-in was delivered before teardown, then the channel closed
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
