//! Where to send the user after the widget reports, and the history that
//! carries them there.

use std::sync::Mutex;

use crate::routes::{encode_query_value, Location};

pub const LOGIN_PATH: &str = "/login";
pub const SIGNUP_PATH: &str = "/signup";
pub const REDIRECT_PARAM: &str = "redirect";

/// Destination after a successful sign-in.
///
/// 1. an explicit `redirect` parameter pointing at an in-app page,
/// 2. the current location when it is not part of the auth flow,
/// 3. `landing`.
pub fn after_sign_in(current: &Location, landing: &str) -> String {
    if let Some(target) = current
        .query_param(REDIRECT_PARAM)
        .filter(|target| is_in_app_page(target))
    {
        return target;
    }
    if !current.is_auth_flow() {
        return current.to_string();
    }
    landing.to_string()
}

/// Destination after a failed or absent sign-in.
///
/// 1. outside the auth flow: the login (or signup) page, remembering where
///    the user was,
/// 2. on an auth-flow page carrying a `redirect` to an in-app page: login,
///    keeping that redirect,
/// 3. otherwise: stay where the user is.
pub fn after_sign_in_failure(current: &Location) -> String {
    if !current.is_auth_flow() {
        let here = current.to_string();
        let entry = if current.query().contains(SIGNUP_PATH) {
            SIGNUP_PATH
        } else {
            LOGIN_PATH
        };
        return with_redirect(entry, &here);
    }
    if let Some(target) = current
        .query_param(REDIRECT_PARAM)
        .filter(|target| is_in_app_page(target))
    {
        return with_redirect(LOGIN_PATH, &target);
    }
    current.to_string()
}

/// `/login?redirect=<target>` with the target escaped as one query value.
pub fn with_redirect(entry: &str, target: &str) -> String {
    format!("{entry}?{REDIRECT_PARAM}={}", encode_query_value(target))
}

/// Rooted, same-origin, and not an auth-flow page. Browsers read `/\host`
/// like `//host`, so a backslash after the leading slash is foreign too.
fn is_in_app_page(target: &str) -> bool {
    let mut chars = target.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !Location::parse(target).is_auth_flow()
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

/// The browser history as the shell sees it.
pub trait Navigator: Send + Sync {
    fn current(&self) -> Location;
    fn navigate(&self, to: &str);
}

/// In-memory history. Every navigation is kept, oldest first.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<Vec<Location>>,
}

impl MemoryHistory {
    pub fn new(start: &str) -> Self {
        Self {
            entries: Mutex::new(vec![Location::parse(start)]),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.lock().iter().map(ToString::to_string).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Location>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for MemoryHistory {
    fn current(&self) -> Location {
        self.lock().last().cloned().unwrap_or_default()
    }

    fn navigate(&self, to: &str) {
        tracing::debug!(to, "navigate");
        self.lock().push(Location::parse(to));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_in_at(at: &str) -> String {
        after_sign_in(&Location::parse(at), "/contacts")
    }

    fn failure_at(at: &str) -> String {
        after_sign_in_failure(&Location::parse(at))
    }

    #[test]
    fn sign_in_on_login_lands_on_contacts() {
        assert_eq!(sign_in_at("/login"), "/contacts");
        assert_eq!(sign_in_at("/callback"), "/contacts");
    }

    #[test]
    fn sign_in_honours_redirect_param() {
        assert_eq!(sign_in_at("/login?redirect=/deals"), "/deals");
        assert_eq!(
            sign_in_at("/login?redirect=/deals%3Fstage%3DProposal"),
            "/deals?stage=Proposal"
        );
    }

    #[test]
    fn sign_in_ignores_foreign_or_auth_redirects() {
        assert_eq!(sign_in_at("/login?redirect=https://evil.test"), "/contacts");
        assert_eq!(sign_in_at("/login?redirect=//evil.test"), "/contacts");
        assert_eq!(sign_in_at("/login?redirect=/signup"), "/contacts");
    }

    #[test]
    fn sign_in_ignores_backslash_host_redirects() {
        assert_eq!(sign_in_at("/login?redirect=/\\evil.test"), "/contacts");
        assert_eq!(sign_in_at("/login?redirect=/%5Cevil.test"), "/contacts");
        assert_eq!(
            failure_at("/callback?redirect=/%5Cevil.test"),
            "/callback?redirect=/%5Cevil.test"
        );
    }

    #[test]
    fn sign_in_stays_on_app_page() {
        assert_eq!(sign_in_at("/reports?range=30d"), "/reports?range=30d");
    }

    #[test]
    fn failure_on_app_page_goes_to_login() {
        assert_eq!(failure_at("/deals"), "/login?redirect=/deals");
        assert_eq!(
            failure_at("/contacts?q=ada&page=2"),
            "/login?redirect=/contacts?q=ada%26page=2"
        );
        assert_eq!(failure_at("/"), "/login?redirect=/");
    }

    #[test]
    fn failure_with_signup_intent_goes_to_signup() {
        assert_eq!(
            failure_at("/settings?next=/signup"),
            "/signup?redirect=/settings?next=/signup"
        );
    }

    #[test]
    fn failure_on_auth_page_keeps_redirect() {
        assert_eq!(failure_at("/callback?redirect=/deals"), "/login?redirect=/deals");
        assert_eq!(failure_at("/login?redirect=/signup"), "/login?redirect=/signup");
        assert_eq!(failure_at("/signup"), "/signup");
        assert_eq!(failure_at("/error?message=x"), "/error?message=x");
    }

    #[test]
    fn memory_history_records_navigation() {
        let history = MemoryHistory::new("/deals");
        history.navigate("/login?redirect=/deals");
        assert_eq!(history.current().path(), "/login");
        assert_eq!(history.entries(), vec!["/deals", "/login?redirect=/deals"]);
    }
}
