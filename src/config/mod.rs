// src/config/mod.rs
mod descriptor;
mod models;

pub use descriptor::{load_instance_descriptor, InstanceDescriptor};
pub use models::*;

use ::config::{Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment prefix for overrides, e.g. `FRS_DEV_LOG_LEVEL`.
pub const ENV_PREFIX: &str = "FRS_DEV";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}\nRun 'frs-dev config init' to create a default configuration.")]
    NotFound(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] ::config::ConfigError),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Instance '{0}' not found in configuration")]
    UnknownInstance(String),

    #[error("No instances configured")]
    NoInstances,

    #[error("Instance '{name}' is invalid: {reason}")]
    InvalidInstance { name: String, reason: String },

    #[error("Environment variable {0} not set")]
    MissingEnvVar(String),

    #[error("No password or password_env configured")]
    NoPassword,
}

/// `$FRS_DEV_CONFIG`, else `~/.frs-dev/config.yaml`.
pub fn default_config_path() -> PathBuf {
    std::env::var_os("FRS_DEV_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".frs-dev").join("config.yaml"))
}

fn file_format(path: &Path) -> FileFormat {
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => FileFormat::Json,
        _ => FileFormat::Yaml,
    }
}

/// Load configuration from a file (YAML or JSON), layering `FRS_DEV_*`
/// environment overrides on top.
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<PlatformConfig, ConfigError> {
    let path = path.as_ref();
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let settings = ::config::Config::builder()
        .add_source(File::from_str(&contents, file_format(path)))
        .add_source(Environment::with_prefix(ENV_PREFIX))
        .build()?;

    let mut config: PlatformConfig = settings.try_deserialize()?;
    config.paths.expand();
    if config.log_level.is_empty() {
        config.log_level = "INFO".to_string();
    }

    config.validate()?;
    debug!(
        path = %path.display(),
        instances = config.instances.len(),
        "Loaded configuration"
    );
    Ok(config)
}

/// Load the configuration, writing the starter file first when it is missing.
pub async fn load_or_create<P: AsRef<Path>>(path: P) -> Result<PlatformConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        info!("Configuration file not found at {}, creating defaults", path.display());
        save_config(path, &PlatformConfig::starter()).await?;
    }
    load_config(path).await
}

pub async fn save_config<P: AsRef<Path>>(path: P, config: &PlatformConfig) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let yaml = serde_yaml::to_string(config)?;
    tokio::fs::write(path, yaml).await.map_err(write_err)?;
    info!("Configuration saved to {}", path.display());
    Ok(())
}

/// Create the working directories (backups, exports, reports, temp).
pub async fn ensure_directories(config: &PlatformConfig) -> Result<Vec<PathBuf>, ConfigError> {
    let mut created = Vec::new();
    for dir in config.paths.working_dirs() {
        if !dir.exists() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| ConfigError::Write {
                    path: dir.to_path_buf(),
                    source,
                })?;
            debug!("Created directory: {}", dir.display());
            created.push(dir.to_path_buf());
        }
    }
    Ok(created)
}
