use std::sync::Mutex;

use async_trait::async_trait;
use crm_core::config::{BackendConfig, CredentialProvider};
use crm_shell::{AuthCallbacks, ClientHandle, SessionWidget, SetupOptions, UserRecord, WidgetError};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::client::{PROJECT_HEADER, PUBLIC_KEY_HEADER};
use crate::{normalize_base_url, Result};

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    user: Option<UserRecord>,
}

/// Session widget backed by the platform's session endpoints.
///
/// `setup` checks `GET {base_url}/auth/session` with the stored session
/// token and reports through the callbacks before returning. A missing
/// token, `401`, `403` and `404` all mean "no session".
pub struct HttpSessionWidget {
    http: reqwest::Client,
    base_url: String,
    session_token: Mutex<Option<String>>,
}

impl HttpSessionWidget {
    pub fn new(base_url: &str, session_token: Option<String>) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder()
                .user_agent(concat!("crm/", env!("CARGO_PKG_VERSION")))
                .build()?,
            base_url: normalize_base_url(base_url)?,
            session_token: Mutex::new(session_token),
        })
    }

    pub fn from_config(backend: &BackendConfig) -> Result<Self> {
        Self::new(&backend.base_url, CredentialProvider::session_token(backend))
    }

    fn token(&self) -> Option<String> {
        self.session_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn forget_token(&self) {
        *self
            .session_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    async fn check_session(
        &self,
        client: &ClientHandle,
        token: &str,
    ) -> std::result::Result<Option<UserRecord>, String> {
        let mut req = self
            .http
            .get(format!("{}/auth/session", self.base_url))
            .header(PROJECT_HEADER, &client.config.project_id)
            .bearer_auth(token);
        if let Some(key) = &client.config.public_key {
            req = req.header(PUBLIC_KEY_HEADER, key);
        }
        let resp = req.send().await.map_err(|e| e.to_string())?;
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: SessionResponse = resp.json().await.map_err(|e| e.to_string())?;
                Ok(body.user)
            }
            status => Err(format!("session check returned HTTP {}", status.as_u16())),
        }
    }
}

#[async_trait]
impl SessionWidget for HttpSessionWidget {
    async fn setup(
        &self,
        client: &ClientHandle,
        options: &SetupOptions,
        callbacks: AuthCallbacks,
    ) -> std::result::Result<(), WidgetError> {
        if options.client_id.trim().is_empty() {
            return Err(WidgetError::Setup("client id is empty".into()));
        }
        let Some(token) = self.token() else {
            tracing::debug!("no session token; signed out");
            callbacks.on_success(None);
            return Ok(());
        };
        match self.check_session(client, &token).await {
            Ok(user) => callbacks.on_success(user),
            Err(message) => {
                tracing::warn!(error = %message, "session check failed");
                callbacks.on_error(message);
            }
        }
        Ok(())
    }

    async fn logout(&self) -> std::result::Result<(), WidgetError> {
        let mut req = self.http.post(format!("{}/auth/logout", self.base_url));
        if let Some(token) = self.token() {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| WidgetError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(WidgetError::Logout(format!(
                "HTTP {}",
                resp.status().as_u16()
            )));
        }
        self.forget_token();
        Ok(())
    }
}
