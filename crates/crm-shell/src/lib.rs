//! Session bootstrap and route guard for the CRM pages.
//!
//! [`Shell`] mounts the hosted sign-in widget once, records what it reports
//! in a [`SessionStore`], and decides where the user goes next.

pub mod auth_state;
pub mod navigation;
pub mod routes;
pub mod session;
pub mod shell;
pub mod widget;

pub use auth_state::{AuthEvent, AuthState, AuthStateMachine, TransitionError};
pub use navigation::{MemoryHistory, Navigator};
pub use routes::{Location, Route};
pub use session::{AuthChange, Session, SessionStore, UserRecord};
pub use shell::{RouteView, Shell, ShellOptions};
pub use widget::{
    AuthCallbacks, AuthFailure, AuthOutcome, ClientConfig, ClientHandle, ScriptedWidget,
    SessionWidget, SetupOptions, WidgetError, WidgetView,
};
