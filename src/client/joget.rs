// src/client/joget.rs
use crate::config::{ConfigError, InstanceConfig};
use futures::StreamExt;
use reqwest::{multipart, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("FRS-Platform/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Composite instance health as reported by `frs-dev instance info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceHealth {
    pub reachable: bool,
    pub authenticated: bool,
    pub version: Option<String>,
    pub applications: usize,
    pub plugins: usize,
}

/// Envelope used by the list endpoints: `{"data": [...]}`.
#[derive(Debug, Deserialize)]
struct DataEnvelope {
    #[serde(default)]
    data: Vec<Value>,
}

/// REST client for a single platform instance, authenticated with HTTP Basic.
pub struct JogetClient {
    base_url: String,
    username: String,
    password: String,
    client: Client,
}

impl JogetClient {
    pub fn new(instance: &InstanceConfig) -> Result<Self, ClientError> {
        let password = instance.credentials.password()?;
        Self::with_credentials(instance.base_url(), &instance.credentials.username, &password)
    }

    pub fn with_credentials(
        base_url: impl Into<String>,
        username: &str,
        password: &str,
    ) -> Result<Self, ClientError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            base_url: base_url.into(),
            username: username.to_string(),
            password: password.to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, timeout: Duration) -> Result<reqwest::Response, ClientError> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { status, url });
        }
        Ok(response)
    }

    /// True when the root page answers 200 or 302 within `timeout`.
    pub async fn test_connection(&self, timeout: Duration) -> bool {
        let result = self
            .client
            .get(self.url("/"))
            .basic_auth(&self.username, Some(&self.password))
            .timeout(timeout)
            .send()
            .await;

        match result {
            Ok(response) => matches!(response.status(), StatusCode::OK | StatusCode::FOUND),
            Err(e) => {
                debug!("Connection test failed: {}", e);
                false
            }
        }
    }

    /// System information; an empty map when the endpoint is unavailable.
    pub async fn system_info(&self) -> Map<String, Value> {
        let result = async {
            let response = self
                .get("/web/json/monitoring/info", Duration::from_secs(10))
                .await?;
            Ok::<_, ClientError>(response.json::<Map<String, Value>>().await?)
        }
        .await;

        result.unwrap_or_else(|e| {
            warn!("Failed to get system info: {}", e);
            Map::new()
        })
    }

    pub async fn list_applications(&self) -> Result<Vec<Value>, ClientError> {
        let response = self
            .get("/web/json/apps/published/list", Duration::from_secs(30))
            .await?;
        Ok(response.json::<DataEnvelope>().await?.data)
    }

    /// Application details, `None` when the instance answers 404.
    pub async fn get_application(&self, app_id: &str) -> Result<Option<Value>, ClientError> {
        let path = format!("/web/json/console/app/{}", app_id);
        match self.get(&path, Duration::from_secs(10)).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(ClientError::Status { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Stream the application export archive into `output_path`.
    pub async fn export_application(&self, app_id: &str, output_path: &Path) -> Result<u64, ClientError> {
        let path = format!("/web/json/console/app/{}/export", app_id);
        let response = self.get(&path, Duration::from_secs(60)).await?;

        let io_err = |source| ClientError::Io {
            path: output_path.display().to_string(),
            source,
        };

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let mut file = tokio::fs::File::create(output_path).await.map_err(io_err)?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_err)?;

        info!("Exported {} to {} ({} bytes)", app_id, output_path.display(), written);
        Ok(written)
    }

    pub async fn import_application(&self, zip_path: &Path, overwrite: bool) -> Result<Value, ClientError> {
        let bytes = tokio::fs::read(zip_path).await.map_err(|source| ClientError::Io {
            path: zip_path.display().to_string(),
            source,
        })?;
        let file_name = zip_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app.zip".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/zip")?;
        let form = multipart::Form::new()
            .part("appZip", part)
            .text("overwrite", overwrite.to_string());

        let url = self.url("/web/json/console/app/import");
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .multipart(form)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { status, url });
        }
        Ok(response.json().await?)
    }

    pub async fn list_plugins(&self) -> Result<Vec<Value>, ClientError> {
        let response = self
            .get(
                "/web/json/console/setting/plugin/list/available",
                Duration::from_secs(30),
            )
            .await?;
        Ok(response.json::<DataEnvelope>().await?.data)
    }

    /// Reachability, authentication (via the app list), version and counts.
    pub async fn health_status(&self) -> InstanceHealth {
        let mut health = InstanceHealth {
            reachable: self.test_connection(Duration::from_secs(10)).await,
            ..InstanceHealth::default()
        };
        if !health.reachable {
            return health;
        }

        match self.list_applications().await {
            Ok(apps) => {
                health.authenticated = true;
                health.applications = apps.len();
            }
            Err(e) => debug!("Authentication check failed: {}", e),
        }

        health.version = self
            .system_info()
            .await
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string);

        if health.authenticated {
            match self.list_plugins().await {
                Ok(plugins) => health.plugins = plugins.len(),
                Err(e) => debug!("Plugin listing failed: {}", e),
            }
        }

        health
    }
}
