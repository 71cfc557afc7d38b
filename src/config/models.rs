// src/config/models.rs
use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Top-level platform configuration (`~/.frs-dev/config.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub instances: BTreeMap<String, InstanceConfig>,
    pub paths: PathsConfig,
    pub notifications: NotificationsConfig,
    pub validation: ValidationConfig,
    pub workflows: WorkflowConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub name: String,
    pub url: String,
    pub web_port: u16,
    pub db_port: u16,
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default = "default_db_host")]
    pub db_host: String,
    #[serde(default = "default_db_user")]
    pub db_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_path: Option<PathBuf>,
    #[serde(default)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Name of an environment variable holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub plugin_repos: Vec<PathBuf>,
    pub utilities: Vec<PathBuf>,
    pub backups: PathBuf,
    pub exports: PathBuf,
    pub reports: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflows: Option<PathBuf>,
    pub temp: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack: Option<NotificationChannel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<NotificationChannel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<NotificationChannel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationChannel {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub config: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub require_backup: bool,
    pub require_approval_for: Vec<String>,
    pub risk_thresholds: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub default_timeout: u64,
    pub rollback_on_failure: bool,
    pub enable_dry_run: bool,
    pub max_parallel_operations: u32,
}

fn default_db_name() -> String {
    "jwdb".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_user() -> String {
    "root".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_true() -> bool {
    true
}

/// `$HOME`, falling back to the current directory when unset.
pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().join(rest),
        Err(_) => path.to_path_buf(),
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: None,
            password_env: None,
        }
    }
}

impl Credentials {
    /// Resolve the password from the direct value or the environment.
    pub fn password(&self) -> Result<String, ConfigError> {
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            return Ok(password.to_string());
        }
        if let Some(var) = &self.password_env {
            return std::env::var(var)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(var.clone()));
        }
        Err(ConfigError::NoPassword)
    }
}

impl InstanceConfig {
    /// Root of the platform's web application, used for every API call.
    pub fn base_url(&self) -> String {
        format!("{}/jw", self.url.trim_end_matches('/'))
    }

    pub fn console_url(&self) -> String {
        format!("{}/web/console/home", self.base_url())
    }

    pub(crate) fn validate(&self, key: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidInstance {
            name: key.to_string(),
            reason,
        };

        let url = Url::parse(&self.url).map_err(|e| invalid(format!("bad url '{}': {}", self.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if self.web_port == 0 || self.db_port == 0 {
            return Err(invalid("ports must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let root = home_dir().join(".frs-dev");
        Self {
            plugin_repos: Vec::new(),
            utilities: Vec::new(),
            backups: root.join("backups"),
            exports: root.join("exports"),
            reports: root.join("reports"),
            workflows: None,
            temp: root.join("temp"),
        }
    }
}

impl PathsConfig {
    pub(crate) fn expand(&mut self) {
        for path in self.plugin_repos.iter_mut().chain(self.utilities.iter_mut()) {
            *path = expand_home(path);
        }
        for path in [&mut self.backups, &mut self.exports, &mut self.reports, &mut self.temp] {
            *path = expand_home(path);
        }
        if let Some(workflows) = self.workflows.as_mut() {
            *workflows = expand_home(workflows);
        }
    }

    /// Directories the tools write into.
    pub fn working_dirs(&self) -> [&Path; 4] {
        [&self.backups, &self.exports, &self.reports, &self.temp]
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_backup: true,
            require_approval_for: vec![
                "production_deploy".to_string(),
                "data_migration".to_string(),
                "plugin_update".to_string(),
            ],
            risk_thresholds: [
                ("auto_approve", "LOW"),
                ("notify_only", "MEDIUM"),
                ("require_approval", "HIGH"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_timeout: 3600,
            rollback_on_failure: true,
            enable_dry_run: true,
            max_parallel_operations: 4,
        }
    }
}

/// `(name, web_port, db_port, version)` of the local development instances.
type LocalInstance = (&'static str, u16, u16, &'static str);

const STARTER_INSTANCES: [LocalInstance; 6] = [
    ("jdx1", 8080, 3306, "8.1.6"),
    ("jdx2", 9999, 3307, "8.1.6"),
    ("jdx3", 8888, 3308, "9.0.0"),
    ("jdx4", 7777, 3309, "9.0.0"),
    ("jdx5", 6666, 3310, "9.0.0"),
    ("jdx6", 5555, 3311, "9.0.0"),
];

/// Port table the standalone health tool assumes without a config file.
const HEALTH_CHECK_INSTANCES: [LocalInstance; 6] = [
    ("jdx1", 8080, 3306, "8.1.6"),
    ("jdx2", 9999, 3307, "8.1.6"),
    ("jdx3", 8888, 3308, "9.0.0"),
    ("jdx4", 8081, 3309, "9.0.0"),
    ("jdx5", 8082, 3310, "9.0.0"),
    ("jdx6", 8083, 3311, "9.0.0"),
];

fn local_instances(table: &[LocalInstance]) -> BTreeMap<String, InstanceConfig> {
    table
        .iter()
        .map(|&(name, web_port, db_port, version)| {
            let instance = InstanceConfig {
                name: name.to_string(),
                url: format!("http://localhost:{}", web_port),
                web_port,
                db_port,
                db_name: default_db_name(),
                db_host: default_db_host(),
                db_user: default_db_user(),
                version: Some(version.to_string()),
                installation_path: None,
                credentials: Credentials {
                    username: default_username(),
                    password: None,
                    password_env: Some(format!("{}_PASSWORD", name.to_uppercase())),
                },
            };
            (name.to_string(), instance)
        })
        .collect()
}

impl PlatformConfig {
    /// Configuration written by `frs-dev config init`: six local instances.
    pub fn starter() -> Self {
        let instances = local_instances(&STARTER_INSTANCES);

        let channel = |pairs: &[(&str, &str)]| NotificationChannel {
            enabled: false,
            config: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                .collect(),
        };

        Self {
            instances,
            paths: PathsConfig::default(),
            notifications: NotificationsConfig {
                slack: Some(channel(&[
                    ("webhook_url_env", "SLACK_WEBHOOK_URL"),
                    ("default_channel", "#frs-deployments"),
                ])),
                email: Some(channel(&[
                    ("smtp_server", "smtp.example.com"),
                    ("from_address", "frs-automation@example.com"),
                ])),
                webhook: None,
            },
            validation: ValidationConfig::default(),
            workflows: WorkflowConfig::default(),
            log_level: "INFO".to_string(),
        }
    }

    /// Starter configuration with the health tool's own port table.
    pub fn health_check_defaults() -> Self {
        Self {
            instances: local_instances(&HEALTH_CHECK_INSTANCES),
            ..Self::starter()
        }
    }

    pub fn get_instance(&self, name: &str) -> Result<&InstanceConfig, ConfigError> {
        self.instances
            .get(name)
            .ok_or_else(|| ConfigError::UnknownInstance(name.to_string()))
    }

    pub fn instance_names(&self) -> Vec<&str> {
        self.instances.keys().map(String::as_str).collect()
    }

    /// Structural checks applied on every load.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instances.is_empty() {
            return Err(ConfigError::NoInstances);
        }
        for (key, instance) in &self.instances {
            instance.validate(key)?;
        }
        Ok(())
    }

    pub fn missing_directories(&self) -> Vec<&Path> {
        self.paths
            .working_dirs()
            .into_iter()
            .filter(|dir| !dir.exists())
            .collect()
    }
}
