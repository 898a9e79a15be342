use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// The widget has not reported yet; every route shows the loader.
    Uninitialized,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    pub fn is_initialized(&self) -> bool {
        !matches!(self, AuthState::Uninitialized)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuthState::Uninitialized => "Uninitialized",
            AuthState::Authenticated => "Authenticated",
            AuthState::Unauthenticated => "Unauthenticated",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// AuthEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEvent {
    SignedIn,
    SignInFailed,
    LoggedOut,
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuthEvent::SignedIn => "SignedIn",
            AuthEvent::SignInFailed => "SignInFailed",
            AuthEvent::LoggedOut => "LoggedOut",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// An auth event that does not apply in the current state. The machine
/// keeps its state when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition: cannot apply {event} in state {state}")]
pub struct TransitionError {
    pub state: AuthState,
    pub event: AuthEvent,
}

// ---------------------------------------------------------------------------
// AuthStateMachine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AuthStateMachine {
    current: AuthState,
    history: Vec<(AuthState, AuthEvent, AuthState)>,
}

impl AuthStateMachine {
    /// Create a new state machine starting in `Uninitialized`.
    pub fn new() -> Self {
        Self {
            current: AuthState::Uninitialized,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> AuthState {
        self.current
    }

    pub fn history(&self) -> &[(AuthState, AuthEvent, AuthState)] {
        &self.history
    }

    /// Valid transitions:
    /// - Uninitialized   + SignedIn     -> Authenticated
    /// - Uninitialized   + SignInFailed -> Unauthenticated
    /// - Uninitialized   + LoggedOut    -> Unauthenticated
    /// - Authenticated   + SignedIn     -> Authenticated (user refreshed)
    /// - Authenticated   + SignInFailed -> Unauthenticated
    /// - Authenticated   + LoggedOut    -> Unauthenticated
    /// - Unauthenticated + SignedIn     -> Authenticated
    /// - Unauthenticated + SignInFailed -> Unauthenticated
    pub fn transition(&mut self, event: AuthEvent) -> Result<AuthState, TransitionError> {
        let next = match (self.current, event) {
            (AuthState::Uninitialized, AuthEvent::SignedIn) => AuthState::Authenticated,
            (AuthState::Uninitialized, AuthEvent::SignInFailed) => AuthState::Unauthenticated,
            (AuthState::Uninitialized, AuthEvent::LoggedOut) => AuthState::Unauthenticated,
            (AuthState::Authenticated, AuthEvent::SignedIn) => AuthState::Authenticated,
            (AuthState::Authenticated, AuthEvent::SignInFailed) => AuthState::Unauthenticated,
            (AuthState::Authenticated, AuthEvent::LoggedOut) => AuthState::Unauthenticated,
            (AuthState::Unauthenticated, AuthEvent::SignedIn) => AuthState::Authenticated,
            (AuthState::Unauthenticated, AuthEvent::SignInFailed) => AuthState::Unauthenticated,
            _ => {
                return Err(TransitionError {
                    state: self.current,
                    event,
                });
            }
        };

        let from = self.current;
        self.current = next;
        self.history.push((from, event, next));
        tracing::debug!(from = %from, event = %event, to = %next, "auth state transition");
        Ok(next)
    }

    /// Returns `true` if the given event is valid in the current state.
    pub fn can_transition(&self, event: AuthEvent) -> bool {
        !matches!(
            (self.current, event),
            (AuthState::Unauthenticated, AuthEvent::LoggedOut)
        )
    }
}

impl Default for AuthStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uninitialized() {
        let sm = AuthStateMachine::new();
        assert_eq!(sm.state(), AuthState::Uninitialized);
        assert!(!sm.state().is_initialized());
        assert!(sm.history().is_empty());
    }

    #[test]
    fn sign_in_then_logout() {
        let mut sm = AuthStateMachine::new();
        assert_eq!(sm.transition(AuthEvent::SignedIn).unwrap(), AuthState::Authenticated);
        assert_eq!(sm.transition(AuthEvent::LoggedOut).unwrap(), AuthState::Unauthenticated);
        assert_eq!(sm.transition(AuthEvent::SignedIn).unwrap(), AuthState::Authenticated);
        assert_eq!(sm.history().len(), 3);
        assert_eq!(
            sm.history()[1],
            (AuthState::Authenticated, AuthEvent::LoggedOut, AuthState::Unauthenticated)
        );
    }

    #[test]
    fn failure_from_any_initialized_state() {
        let mut sm = AuthStateMachine::new();
        sm.transition(AuthEvent::SignInFailed).unwrap();
        assert_eq!(sm.state(), AuthState::Unauthenticated);
        sm.transition(AuthEvent::SignInFailed).unwrap();
        sm.transition(AuthEvent::SignedIn).unwrap();
        sm.transition(AuthEvent::SignInFailed).unwrap();
        assert_eq!(sm.state(), AuthState::Unauthenticated);
    }

    #[test]
    fn logout_before_first_report_settles_unauthenticated() {
        let mut sm = AuthStateMachine::new();
        assert!(sm.can_transition(AuthEvent::LoggedOut));
        assert_eq!(sm.transition(AuthEvent::LoggedOut).unwrap(), AuthState::Unauthenticated);
        assert!(sm.state().is_initialized());
        assert_eq!(
            sm.history(),
            &[(AuthState::Uninitialized, AuthEvent::LoggedOut, AuthState::Unauthenticated)]
        );
    }

    #[test]
    fn logout_twice_is_rejected() {
        let mut sm = AuthStateMachine::new();
        sm.transition(AuthEvent::SignedIn).unwrap();
        sm.transition(AuthEvent::LoggedOut).unwrap();
        assert!(!sm.can_transition(AuthEvent::LoggedOut));
        let err = sm.transition(AuthEvent::LoggedOut).unwrap_err();
        assert_eq!(err.state, AuthState::Unauthenticated);
        assert!(err.to_string().contains("LoggedOut"));
        assert_eq!(sm.state(), AuthState::Unauthenticated);
        assert_eq!(sm.history().len(), 2);
    }
}
