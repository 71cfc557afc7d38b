// tests/config_tests.rs
use joget_ops::config::{load_config, load_or_create, save_config, ConfigError, PlatformConfig};

#[tokio::test]
async fn test_starter_config_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");

    let mut starter = PlatformConfig::starter();
    starter.paths.backups = dir.path().join("backups");
    save_config(&path, &starter).await.unwrap();

    let loaded = load_config(&path).await.unwrap();
    assert_eq!(loaded.instance_names(), starter.instance_names());
    assert_eq!(loaded.paths.backups, dir.path().join("backups"));
    assert_eq!(loaded.get_instance("jdx3").unwrap().db_port, 3308);
    assert_eq!(
        loaded.get_instance("jdx1").unwrap().credentials.password_env.as_deref(),
        Some("JDX1_PASSWORD")
    );
    assert!(!loaded.notifications.slack.unwrap().enabled);
}

#[tokio::test]
async fn test_json_config_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    tokio::fs::write(
        &path,
        r#"{"instances": {"lab": {"name": "lab", "url": "https://lab.example", "web_port": 443, "db_port": 3306}}}"#,
    )
    .await
    .unwrap();

    let config = load_config(&path).await.unwrap();
    let lab = config.get_instance("lab").unwrap();
    assert_eq!(lab.console_url(), "https://lab.example/jw/web/console/home");
    assert_eq!(lab.credentials.username, "admin");
    assert_eq!(config.log_level, "INFO");
}

#[tokio::test]
async fn test_load_or_create_keeps_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    tokio::fs::write(
        &path,
        "instances:\n  only:\n    name: only\n    url: http://localhost:9090\n    web_port: 9090\n    db_port: 3399\n",
    )
    .await
    .unwrap();

    let config = load_or_create(&path).await.unwrap();
    assert_eq!(config.instance_names(), ["only"]);
}

#[tokio::test]
async fn test_config_without_instances_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    tokio::fs::write(&path, "log_level: DEBUG\n").await.unwrap();

    assert!(matches!(load_config(&path).await, Err(ConfigError::NoInstances)));
}
