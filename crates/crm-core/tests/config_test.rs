use crm_core::config::{Config, CredentialProvider};

#[test]
fn default_config() {
    let cfg = Config::default();
    assert_eq!(cfg.general.app_name, "crm");
    assert_eq!(cfg.general.log_level, "info");
    assert!(!cfg.general.json_logs);
    assert_eq!(cfg.backend.base_url, "http://localhost:8787");
    assert_eq!(cfg.backend.public_key_env, "CRM_PUBLIC_KEY");
    assert_eq!(cfg.records.page_size, 100);
    assert_eq!(cfg.notifications.position, "top-right");
    assert_eq!(cfg.notifications.auto_close_ms, 3000);
    assert!(cfg.notifications.close_on_click);
    assert!(cfg.notifications.pause_on_hover);
    assert!(cfg.notifications.pause_on_focus_loss);
    assert!(!cfg.notifications.newest_on_top);
    assert_eq!(cfg.session.mount_target, "#authentication");
    assert_eq!(cfg.session.view, "both");
    assert_eq!(cfg.session.default_landing, "/contacts");
    cfg.validate().expect("defaults validate");
}

#[test]
fn config_roundtrip() {
    let cfg = Config::default();
    let toml_str = cfg.to_toml().expect("serialize to toml");
    assert!(toml_str.contains("#authentication"));

    let parsed: Config = toml::from_str(&toml_str).expect("parse toml back");
    assert_eq!(parsed.backend.base_url, cfg.backend.base_url);
    assert_eq!(parsed.records.page_size, cfg.records.page_size);
    assert_eq!(parsed.notifications.max_visible, cfg.notifications.max_visible);
    parsed.validate().expect("config validates");
}

#[test]
fn config_partial_toml() {
    let partial = r#"
[backend]
base_url = "https://crm.example.test"
project_id = "proj-42"

[records]
page_size = 25
"#;
    let cfg: Config = toml::from_str(partial).expect("parse partial");
    assert_eq!(cfg.backend.base_url, "https://crm.example.test");
    assert_eq!(cfg.records.page_size, 25);
    // defaults should fill in the rest
    assert_eq!(cfg.backend.session_token_env, "CRM_SESSION_TOKEN");
    assert_eq!(cfg.notifications.auto_close_ms, 3000);
    cfg.validate().expect("config validates");
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[notifications]\nposition = \"bottom-left\"\nnewest_on_top = true\n",
    )
    .expect("write config");

    let cfg = Config::load_from(&path).expect("load config");
    assert_eq!(cfg.notifications.position, "bottom-left");
    assert!(cfg.notifications.newest_on_top);
}

#[test]
fn load_from_missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = Config::load_from(dir.path().join("absent.toml")).expect_err("should fail");
    assert!(err.to_string().starts_with("io:"));
}

#[test]
fn load_from_rejects_invalid_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[records]\npage_size = 0\n").expect("write config");
    let err = Config::load_from(&path).expect_err("validation should fail");
    assert!(err.to_string().contains("page_size"));
}

#[test]
fn invalid_toast_position_fails_validation() {
    let mut cfg = Config::default();
    cfg.notifications.position = "middle".to_string();
    let err = cfg.validate().expect_err("validation should fail");
    assert!(err.to_string().contains("notifications.position"));
}

#[test]
fn relative_landing_fails_validation() {
    let mut cfg = Config::default();
    cfg.session.default_landing = "contacts".to_string();
    let err = cfg.validate().expect_err("validation should fail");
    assert!(err.to_string().contains("default_landing"));
}

#[test]
fn unknown_widget_view_fails_validation() {
    let mut cfg = Config::default();
    cfg.session.view = "popup".to_string();
    assert!(cfg.validate().is_err());
}

#[test]
fn app_name_names_the_log_service() {
    let cfg: Config = toml::from_str("[general]\napp_name = \" crm-east \"\n").expect("parse");
    assert_eq!(cfg.general.service_name(), "crm-east");
    cfg.validate().expect("config validates");

    let mut cfg = Config::default();
    cfg.general.app_name = "   ".into();
    let err = cfg.validate().expect_err("validation should fail");
    assert!(err.to_string().contains("app_name"));
}

#[test]
fn credentials_resolve_from_env_names() {
    let mut cfg = Config::default();
    cfg.backend.public_key_env = "CRM_CONFIG_TEST_PUBLIC_KEY".into();
    cfg.backend.project_id_env = "CRM_CONFIG_TEST_PROJECT".into();
    std::env::set_var("CRM_CONFIG_TEST_PUBLIC_KEY", "pk-123");
    std::env::set_var("CRM_CONFIG_TEST_PROJECT", "from-env");

    assert_eq!(
        CredentialProvider::public_key(&cfg.backend).as_deref(),
        Some("pk-123")
    );
    assert_eq!(
        CredentialProvider::project_id(&cfg.backend).as_deref(),
        Some("from-env")
    );

    cfg.backend.project_id = Some("from-file".into());
    assert_eq!(
        CredentialProvider::project_id(&cfg.backend).as_deref(),
        Some("from-file")
    );

    cfg.backend.session_token_env = "CRM_CONFIG_TEST_UNSET".into();
    assert!(CredentialProvider::session_token(&cfg.backend).is_none());
}
