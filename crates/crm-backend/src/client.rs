use async_trait::async_trait;
use crm_api_types::{ApiResponse, DeleteParams, FetchParams, WriteParams};
use crm_core::config::{BackendConfig, CredentialProvider};
use crm_core::store::{RecordStore, StoreError};
use crm_core::types::RecordId;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::{normalize_base_url, BackendError, Result};

pub(crate) const PROJECT_HEADER: &str = "X-Project-Id";
pub(crate) const PUBLIC_KEY_HEADER: &str = "X-Public-Key";

/// Collection API over HTTP.
///
/// Every operation posts the platform's own request body to
/// `{base_url}/tables/{collection}/...` and hands the envelope back as-is,
/// including `success: false` envelopes sent with an error status.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    public_key: Option<String>,
    session_token: Option<String>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("public_key", &self.public_key.as_ref().map(|_| "<redacted>"))
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl BackendClient {
    pub fn new(base_url: &str, project_id: &str, public_key: Option<String>) -> Result<Self> {
        if project_id.trim().is_empty() {
            return Err(BackendError::MissingProjectId("project id is empty".into()));
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("crm/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            project_id: project_id.to_string(),
            public_key,
            session_token: None,
        })
    }

    /// Build from config, resolving credentials from the environment.
    pub fn from_config(backend: &BackendConfig) -> Result<Self> {
        let project_id = CredentialProvider::project_id(backend)
            .ok_or_else(|| {
                BackendError::MissingProjectId(format!(
                    "set backend.project_id or ${}",
                    backend.project_id_env
                ))
            })?;
        let client = Self::new(
            &backend.base_url,
            &project_id,
            CredentialProvider::public_key(backend),
        )?;
        Ok(match CredentialProvider::session_token(backend) {
            Some(token) => client.with_session_token(token),
            None => client,
        })
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn table_url(&self, collection: &str, rest: &str) -> String {
        format!(
            "{}/tables/{}/{rest}",
            self.base_url,
            urlencoding::encode(collection)
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, url)
            .header(PROJECT_HEADER, &self.project_id);
        if let Some(key) = &self.public_key {
            req = req.header(PUBLIC_KEY_HEADER, key);
        }
        if let Some(token) = &self.session_token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn call<B, T>(
        &self,
        method: Method,
        url: String,
        body: &B,
    ) -> std::result::Result<ApiResponse<T>, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(%method, url = %url, "backend request");
        let resp = self
            .request(method, &url)
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        match serde_json::from_str::<ApiResponse<T>>(&text) {
            Ok(envelope) => {
                if !status.is_success() {
                    tracing::warn!(status = status.as_u16(), "error status with envelope");
                }
                Ok(envelope)
            }
            Err(_) if !status.is_success() => Err(StoreError::Status {
                status: status.as_u16(),
                body: text,
            }),
            Err(e) => Err(StoreError::Decode(e.to_string())),
        }
    }
}

#[async_trait]
impl RecordStore for BackendClient {
    async fn fetch_records(
        &self,
        collection: &str,
        params: &FetchParams,
    ) -> std::result::Result<ApiResponse<Vec<Value>>, StoreError> {
        let url = self.table_url(collection, "fetch");
        self.call(Method::POST, url, params).await
    }

    async fn get_record_by_id(
        &self,
        collection: &str,
        id: RecordId,
        params: &FetchParams,
    ) -> std::result::Result<ApiResponse<Value>, StoreError> {
        let url = self.table_url(collection, &format!("records/{id}"));
        self.call(Method::POST, url, params).await
    }

    async fn create_record(
        &self,
        collection: &str,
        params: &WriteParams,
    ) -> std::result::Result<ApiResponse, StoreError> {
        let url = self.table_url(collection, "records");
        self.call(Method::POST, url, params).await
    }

    async fn update_record(
        &self,
        collection: &str,
        params: &WriteParams,
    ) -> std::result::Result<ApiResponse, StoreError> {
        let url = self.table_url(collection, "records");
        self.call(Method::PUT, url, params).await
    }

    async fn delete_record(
        &self,
        collection: &str,
        params: &DeleteParams,
    ) -> std::result::Result<ApiResponse, StoreError> {
        let url = self.table_url(collection, "records");
        self.call(Method::DELETE, url, params).await
    }
}
