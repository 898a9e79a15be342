use std::sync::Arc;

use crm_backend::{BackendError, HttpSessionWidget};
use crm_core::config::{Config, CredentialProvider};
use crm_shell::{ClientConfig, MemoryHistory, Navigator, SessionStore, Shell, ShellOptions};

use super::friendly_error;

fn shell(config: &Config, at: &str) -> anyhow::Result<(Shell, Arc<MemoryHistory>)> {
    let widget = HttpSessionWidget::from_config(&config.backend).map_err(friendly_error)?;
    let client = ClientConfig {
        project_id: CredentialProvider::project_id(&config.backend).unwrap_or_default(),
        public_key: CredentialProvider::public_key(&config.backend),
    };
    let options = ShellOptions::from_config(&config.session, client)?;
    let history = Arc::new(MemoryHistory::new(at));
    let shell = Shell::new(options, Arc::new(widget), history.clone(), SessionStore::new());
    Ok((shell, history))
}

/// Run the `session` subcommand: bootstrap the shell at `at` and print where
/// it navigated, followed by the signed-in user if any.
pub async fn run(config: &Config, at: &str) -> anyhow::Result<()> {
    if CredentialProvider::project_id(&config.backend).is_none() {
        return Err(friendly_error(BackendError::MissingProjectId(format!(
            "set backend.project_id or ${}",
            config.backend.project_id_env
        ))));
    }
    let (shell, _) = shell(config, at)?;
    let target = shell.bootstrap().await?;
    println!("{target}");
    match shell.session().user() {
        Some(user) => println!("signed in as {}", user.display_name()),
        None => println!("not signed in"),
    }
    Ok(())
}

/// Run the `logout` subcommand. The local session ends even when the
/// platform cannot be reached; the failure is logged.
pub async fn logout(config: &Config) -> anyhow::Result<()> {
    let (shell, history) = shell(config, "/")?;
    shell.logout().await;
    println!("{}", history.current());
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    async fn platform() -> String {
        let app = Router::new()
            .route(
                "/auth/session",
                get(|headers: HeaderMap| async move {
                    let bearer = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    if bearer == "Bearer cli-token" {
                        Json(json!({ "user": { "firstName": "Ada", "lastName": "Lovelace" } }))
                            .into_response()
                    } else {
                        StatusCode::UNAUTHORIZED.into_response()
                    }
                }),
            )
            .route("/auth/logout", post(|| async { StatusCode::BAD_GATEWAY }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn config(base_url: String, token_env: &str) -> Config {
        let mut config = Config::default();
        config.backend.base_url = base_url;
        config.backend.project_id = Some("proj-cli".into());
        config.backend.session_token_env = token_env.into();
        config
    }

    #[tokio::test]
    async fn session_signs_in_with_stored_token() {
        std::env::set_var("CRM_CLI_TEST_TOKEN_OK", "cli-token");
        let config = config(platform().await, "CRM_CLI_TEST_TOKEN_OK");
        let (shell, history) = shell(&config, "/login").unwrap();

        assert_eq!(shell.bootstrap().await.unwrap(), "/contacts");
        assert_eq!(history.current().path(), "/contacts");
        assert!(run(&config, "/login").await.is_ok());
    }

    #[tokio::test]
    async fn session_without_token_sends_to_login() {
        let config = config(platform().await, "CRM_CLI_TEST_TOKEN_UNSET");
        let (shell, _) = shell(&config, "/deals").unwrap();
        assert_eq!(shell.bootstrap().await.unwrap(), "/login?redirect=/deals");
    }

    #[tokio::test]
    async fn session_requires_project_id() {
        let mut config = config(platform().await, "CRM_CLI_TEST_TOKEN_UNSET");
        config.backend.project_id = None;
        config.backend.project_id_env = "CRM_CLI_TEST_PROJECT_UNSET".into();
        assert!(run(&config, "/").await.is_err());
    }

    #[tokio::test]
    async fn logout_succeeds_when_platform_rejects_it() {
        std::env::set_var("CRM_CLI_TEST_TOKEN_LOGOUT", "cli-token");
        let config = config(platform().await, "CRM_CLI_TEST_TOKEN_LOGOUT");
        assert!(logout(&config).await.is_ok());
    }
}
