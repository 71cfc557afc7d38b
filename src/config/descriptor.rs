// src/config/descriptor.rs
use super::{ConfigError, Credentials, InstanceConfig};
use serde::Deserialize;
use std::path::Path;

/// Standalone description of one instance, as accepted by `joget-health --config`.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceDescriptor {
    #[serde(default = "default_instance_name", alias = "name")]
    pub instance_name: String,
    #[serde(default)]
    pub url: Option<String>,
    pub web_port: u16,
    pub db_port: u16,
    #[serde(default)]
    pub db_host: Option<String>,
    #[serde(default)]
    pub db_user: Option<String>,
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

fn default_instance_name() -> String {
    "custom".to_string()
}

impl From<InstanceDescriptor> for InstanceConfig {
    fn from(d: InstanceDescriptor) -> Self {
        InstanceConfig {
            url: d
                .url
                .unwrap_or_else(|| format!("http://localhost:{}", d.web_port)),
            name: d.instance_name,
            web_port: d.web_port,
            db_port: d.db_port,
            db_name: d.db_name.unwrap_or_else(|| "jwdb".to_string()),
            db_host: d.db_host.unwrap_or_else(|| "localhost".to_string()),
            db_user: d.db_user.unwrap_or_else(|| "root".to_string()),
            version: d.version,
            installation_path: None,
            credentials: Credentials::default(),
        }
    }
}

/// Read a descriptor file (JSON, or YAML by extension) into an instance.
pub async fn load_instance_descriptor<P: AsRef<Path>>(path: P) -> Result<InstanceConfig, ConfigError> {
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

    let format = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => ::config::FileFormat::Yaml,
        _ => ::config::FileFormat::Json,
    };
    let descriptor: InstanceDescriptor = ::config::Config::builder()
        .add_source(::config::File::from_str(&contents, format))
        .build()?
        .try_deserialize()?;

    let instance = InstanceConfig::from(descriptor);
    instance.validate(&instance.name)?;
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_descriptor_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.json");
        tokio::fs::write(&path, r#"{"web_port": 8083, "db_port": 3311, "version": "9.0.0"}"#)
            .await
            .unwrap();

        let instance = load_instance_descriptor(&path).await.unwrap();
        assert_eq!(instance.name, "custom");
        assert_eq!(instance.url, "http://localhost:8083");
        assert_eq!(instance.base_url(), "http://localhost:8083/jw");
        assert_eq!(instance.db_host, "localhost");
        assert_eq!(instance.db_user, "root");
        assert_eq!(instance.version.as_deref(), Some("9.0.0"));
    }

    #[tokio::test]
    async fn test_yaml_descriptor_with_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.yaml");
        tokio::fs::write(
            &path,
            "instance_name: staging\nurl: http://10.0.0.5:8080\nweb_port: 8080\ndb_port: 3306\ndb_host: 10.0.0.6\n",
        )
        .await
        .unwrap();

        let instance = load_instance_descriptor(&path).await.unwrap();
        assert_eq!(instance.name, "staging");
        assert_eq!(instance.db_host, "10.0.0.6");
    }

    #[tokio::test]
    async fn test_descriptor_requires_ports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.json");
        tokio::fs::write(&path, r#"{"instance_name": "x"}"#).await.unwrap();

        assert!(matches!(
            load_instance_descriptor(&path).await,
            Err(ConfigError::Parse(_))
        ));
    }
}
