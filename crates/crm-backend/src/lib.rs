//! HTTP access to the hosted record platform: the collection API behind
//! [`crm_core::store::RecordStore`] and the session endpoints behind
//! [`crm_shell::SessionWidget`].

mod auth;
mod client;

pub use auth::HttpSessionWidget;
pub use client::BackendClient;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors raised while building a backend client.
///
/// Request-time failures are reported as
/// [`StoreError`](crm_core::store::StoreError) or
/// [`WidgetError`](crm_shell::WidgetError) instead, so callers of the record
/// and session traits never see this type.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No project id in the config file or its environment variable.
    #[error("missing project id: {0}")]
    MissingProjectId(String),

    /// The base URL does not start with `http://` or `https://`.
    #[error("invalid base URL {0:?}")]
    InvalidBaseUrl(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, BackendError>;

pub(crate) fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(BackendError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(trimmed.to_string())
}
