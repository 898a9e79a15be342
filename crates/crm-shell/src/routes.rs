use std::fmt;

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A path plus its raw query string, as the address bar would show it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    path: String,
    query: String,
}

impl Location {
    /// Parses `"/deals?stage=Proposal#top"`. Fragments are dropped and an
    /// empty or relative path is rooted at `/`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.split('#').next().unwrap_or_default();
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, query),
            None => (raw, ""),
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self {
            path,
            query: query.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// First value of `name` in the query string, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query
            .split('&')
            .filter_map(|pair| match pair.split_once('=') {
                Some((key, value)) => Some((key, value)),
                None if !pair.is_empty() => Some((pair, "")),
                None => None,
            })
            .find(|(key, _)| *key == name)
            .map(|(_, value)| decode_component(value))
    }

    pub fn route(&self) -> Option<Route> {
        Route::resolve(&self.path)
    }

    /// Auth-flow locations are decided by route, not by substring.
    pub fn is_auth_flow(&self) -> bool {
        self.route().is_some_and(|route| route.is_auth_flow())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.query.is_empty() {
            f.write_str(&self.path)
        } else {
            write!(f, "{}?{}", self.path, self.query)
        }
    }
}

impl From<&str> for Location {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Escapes a path+query so it survives as a single query value. Slashes,
/// `?` and `=` stay readable.
pub fn encode_query_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '#' => out.push_str("%23"),
            '+' => out.push_str("%2B"),
            ' ' => out.push_str("%20"),
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Callback,
    Error,
    PromptPassword {
        app_id: String,
        email_address: String,
        provider: String,
    },
    ResetPassword {
        app_id: String,
        fields: String,
    },
    Root,
    Contacts,
    Deals,
    Marketing,
    Reports,
    Settings,
}

impl Route {
    /// Matches a path against the route table. Trailing slashes are ignored;
    /// parameter segments must be non-empty.
    pub fn resolve(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Some(Route::Root);
        }
        let segments: Vec<&str> = trimmed.trim_start_matches('/').split('/').collect();
        let route = match segments.as_slice() {
            ["login"] => Route::Login,
            ["signup"] => Route::Signup,
            ["callback"] => Route::Callback,
            ["error"] => Route::Error,
            ["prompt-password", app_id, email_address, provider]
                if [app_id, email_address, provider].iter().all(|s| !s.is_empty()) =>
            {
                Route::PromptPassword {
                    app_id: decode_component(app_id),
                    email_address: decode_component(email_address),
                    provider: decode_component(provider),
                }
            }
            ["reset-password", app_id, fields] if !app_id.is_empty() && !fields.is_empty() => {
                Route::ResetPassword {
                    app_id: decode_component(app_id),
                    fields: decode_component(fields),
                }
            }
            ["contacts"] => Route::Contacts,
            ["deals"] => Route::Deals,
            ["marketing"] => Route::Marketing,
            ["reports"] => Route::Reports,
            ["settings"] => Route::Settings,
            _ => return None,
        };
        Some(route)
    }

    /// Login, signup and the widget's own flow pages.
    pub fn is_auth_flow(&self) -> bool {
        matches!(
            self,
            Route::Login
                | Route::Signup
                | Route::Callback
                | Route::Error
                | Route::PromptPassword { .. }
                | Route::ResetPassword { .. }
        )
    }

    /// Pages that need a signed-in user.
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::Contacts | Route::Deals | Route::Marketing | Route::Reports | Route::Settings
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::Signup => "signup",
            Route::Callback => "callback",
            Route::Error => "error",
            Route::PromptPassword { .. } => "prompt-password",
            Route::ResetPassword { .. } => "reset-password",
            Route::Root => "root",
            Route::Contacts => "contacts",
            Route::Deals => "deals",
            Route::Marketing => "marketing",
            Route::Reports => "reports",
            Route::Settings => "settings",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
