use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration loaded from `~/.crm/config.toml`.
///
/// **Security**: this struct never stores the public key or session tokens.
/// It stores the *names* of the environment variables that hold them; see
/// [`CredentialProvider`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub records: RecordsConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Load config from `~/.crm/config.toml`, falling back to defaults when
    /// the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(path)
        } else {
            let cfg = Config::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let cfg: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        self.validate()?;
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Semantic validation for settings that are not expressible via types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.general.validate()?;
        self.records.validate()?;
        self.notifications.validate()?;
        self.session.validate()?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".crm")
            .join("config.toml")
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("validation: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

impl GeneralConfig {
    /// The name logs are tagged with.
    pub fn service_name(&self) -> &str {
        self.app_name.trim()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name().is_empty() {
            return Err(ConfigError::Validation(
                "general.app_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_app_name() -> String {
    "crm".into()
}
fn default_log_level() -> String {
    "info".into()
}

/// Where the record platform lives and how to find its credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Project id; not a secret, but may also come from `project_id_env`.
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_project_id_env")]
    pub project_id_env: String,
    #[serde(default = "default_public_key_env")]
    pub public_key_env: String,
    #[serde(default = "default_session_token_env")]
    pub session_token_env: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_id: None,
            project_id_env: default_project_id_env(),
            public_key_env: default_public_key_env(),
            session_token_env: default_session_token_env(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8787".into()
}
fn default_project_id_env() -> String {
    "CRM_PROJECT_ID".into()
}
fn default_public_key_env() -> String {
    "CRM_PUBLIC_KEY".into()
}
fn default_session_token_env() -> String {
    "CRM_SESSION_TOKEN".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// Records requested per listing.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    100
}

impl RecordsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Validation(
                "records.page_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Toast behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_position")]
    pub position: String,
    #[serde(default = "default_auto_close_ms")]
    pub auto_close_ms: u64,
    #[serde(default = "default_true")]
    pub close_on_click: bool,
    #[serde(default = "default_true")]
    pub pause_on_hover: bool,
    #[serde(default = "default_true")]
    pub pause_on_focus_loss: bool,
    #[serde(default)]
    pub newest_on_top: bool,
    #[serde(default = "default_max_visible")]
    pub max_visible: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            position: default_position(),
            auto_close_ms: default_auto_close_ms(),
            close_on_click: true,
            pause_on_hover: true,
            pause_on_focus_loss: true,
            newest_on_top: false,
            max_visible: default_max_visible(),
        }
    }
}

pub const TOAST_POSITIONS: &[&str] = &[
    "top-right",
    "top-center",
    "top-left",
    "bottom-right",
    "bottom-center",
    "bottom-left",
];

fn default_position() -> String {
    "top-right".into()
}
fn default_auto_close_ms() -> u64 {
    3000
}
fn default_max_visible() -> usize {
    5
}
fn default_true() -> bool {
    true
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !TOAST_POSITIONS.contains(&self.position.as_str()) {
            return Err(ConfigError::Validation(format!(
                "notifications.position must be one of {}; got {:?}",
                TOAST_POSITIONS.join(", "),
                self.position
            )));
        }
        if self.auto_close_ms == 0 {
            return Err(ConfigError::Validation(
                "notifications.auto_close_ms must be greater than zero".into(),
            ));
        }
        if self.max_visible == 0 {
            return Err(ConfigError::Validation(
                "notifications.max_visible must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Session widget mounting and navigation defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_mount_target")]
    pub mount_target: String,
    /// Widget view: `both`, `login` or `signup`.
    #[serde(default = "default_view")]
    pub view: String,
    #[serde(default = "default_landing")]
    pub default_landing: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mount_target: default_mount_target(),
            view: default_view(),
            default_landing: default_landing(),
        }
    }
}

fn default_mount_target() -> String {
    "#authentication".into()
}
fn default_view() -> String {
    "both".into()
}
fn default_landing() -> String {
    "/contacts".into()
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_landing.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "session.default_landing must be an absolute path; got {:?}",
                self.default_landing
            )));
        }
        if !matches!(self.view.as_str(), "both" | "login" | "signup") {
            return Err(ConfigError::Validation(format!(
                "session.view must be one of both, login, signup; got {:?}",
                self.view
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CredentialProvider
// ---------------------------------------------------------------------------

/// Resolves credentials from environment variables at call time.
///
/// Config stores env var *names*; this provider turns them into values.
pub struct CredentialProvider;

impl CredentialProvider {
    /// Project id from config, else from the configured env var.
    pub fn project_id(backend: &BackendConfig) -> Option<String> {
        backend
            .project_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| Self::read_env(&backend.project_id_env))
    }

    pub fn public_key(backend: &BackendConfig) -> Option<String> {
        Self::read_env(&backend.public_key_env)
    }

    pub fn session_token(backend: &BackendConfig) -> Option<String> {
        Self::read_env(&backend.session_token_env)
    }

    fn read_env(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}
