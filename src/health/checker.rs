// src/health/checker.rs
use super::probe::{ProbeError, SqlTarget, SystemProbe};
use super::status::{overall_status, CheckResult, HealthStatus};
use crate::config::InstanceConfig;
use reqwest::{redirect, Client, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const PRODUCT_NAME: &str = "joget";

/// Outcome of one evaluation run against one instance.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    #[serde(skip)]
    pub instance: String,
    pub overall_status: HealthStatus,
    pub checks: Vec<CheckResult>,
}

/// Runs the fixed check battery against one instance, one check at a time.
pub struct HealthEvaluator {
    instance: InstanceConfig,
    probe: Arc<dyn SystemProbe>,
    client: Client,
    console_client: Client,
}

impl HealthEvaluator {
    pub fn new(instance: InstanceConfig, probe: Arc<dyn SystemProbe>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(instance, probe, Duration::from_secs(10))
    }

    pub fn with_timeout(
        instance: InstanceConfig,
        probe: Arc<dyn SystemProbe>,
        http_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(http_timeout).build()?;
        let console_client = Client::builder()
            .timeout(http_timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            instance,
            probe,
            client,
            console_client,
        })
    }

    pub async fn run_all_checks(&self) -> HealthReport {
        info!(
            instance = %self.instance.name,
            web_port = self.instance.web_port,
            db_port = self.instance.db_port,
            "Running health checks"
        );

        let checks = vec![
            self.check_web_interface().await,
            self.check_database().await,
            self.check_admin_console().await,
            self.check_process().await,
            self.check_disk_space().await,
            self.check_memory_usage().await,
        ];

        for check in &checks {
            debug!(check = %check.check_name, status = %check.status, "{}", check.message);
        }

        let overall_status = overall_status(&checks);
        info!(instance = %self.instance.name, status = %overall_status, "Health checks complete");

        HealthReport {
            instance: self.instance.name.clone(),
            overall_status,
            checks,
        }
    }

    async fn check_web_interface(&self) -> CheckResult {
        const NAME: &str = "Web Interface";
        let url = self.instance.base_url();
        let start = Instant::now();

        match self.client.get(format!("{}/", url)).send().await {
            Ok(response) if response.status() == StatusCode::OK => CheckResult::new(
                NAME,
                HealthStatus::Healthy,
                format!("Web interface responding (HTTP {})", response.status().as_u16()),
            )
            .with_detail("url", url)
            .with_detail("response_time", start.elapsed().as_secs_f64()),
            Ok(response) => CheckResult::new(
                NAME,
                HealthStatus::Degraded,
                format!("Web interface returned HTTP {}", response.status().as_u16()),
            )
            .with_detail("url", url),
            Err(e) if e.is_connect() => CheckResult::new(
                NAME,
                HealthStatus::Unhealthy,
                format!("Cannot connect to web interface on port {}", self.instance.web_port),
            )
            .with_detail("url", url),
            Err(e) if e.is_timeout() => {
                CheckResult::new(NAME, HealthStatus::Degraded, "Web interface timeout (>10s)")
                    .with_detail("url", url)
            }
            Err(e) => CheckResult::new(
                NAME,
                HealthStatus::Unhealthy,
                format!("Error checking web interface: {}", e),
            )
            .with_detail("error", e.to_string()),
        }
    }

    async fn check_database(&self) -> CheckResult {
        const NAME: &str = "Database Connection";
        let port = self.instance.db_port;
        let target = SqlTarget {
            host: self.instance.db_host.clone(),
            port,
            user: self.instance.db_user.clone(),
        };

        let healthy = || {
            CheckResult::new(
                NAME,
                HealthStatus::Healthy,
                format!("Database accessible on port {}", port),
            )
            .with_detail("port", port)
        };

        let mut outcome = self.probe.sql_ping(&target, false).await;
        if matches!(outcome, Ok(false)) {
            debug!("SQL ping failed, retrying with an empty password");
            outcome = self.probe.sql_ping(&target, true).await;
        }

        match outcome {
            Ok(true) => healthy(),
            Ok(false) => CheckResult::new(
                NAME,
                HealthStatus::Degraded,
                format!("Database connection requires authentication (port {})", port),
            )
            .with_detail("port", port)
            .with_detail("note", "Unable to verify without password"),
            Err(ProbeError::Timeout { .. }) => {
                CheckResult::new(NAME, HealthStatus::Degraded, "Database connection timeout")
                    .with_detail("port", port)
            }
            Err(ProbeError::ToolMissing(_)) => CheckResult::new(
                NAME,
                HealthStatus::Unknown,
                "MySQL client not found (cannot verify database)",
            )
            .with_detail("port", port)
            .with_detail("note", "Install mysql-client to enable this check"),
            Err(e) => CheckResult::new(
                NAME,
                HealthStatus::Unknown,
                format!("Error checking database: {}", e),
            )
            .with_detail("error", e.to_string()),
        }
    }

    async fn check_admin_console(&self) -> CheckResult {
        const NAME: &str = "Admin Console";
        let url = self.instance.console_url();

        match self.console_client.get(&url).send().await {
            Ok(response)
                if matches!(
                    response.status(),
                    StatusCode::OK | StatusCode::FOUND | StatusCode::UNAUTHORIZED
                ) =>
            {
                CheckResult::new(NAME, HealthStatus::Healthy, "Admin console accessible")
                    .with_detail("url", url)
            }
            Ok(response) => CheckResult::new(
                NAME,
                HealthStatus::Degraded,
                format!("Admin console returned HTTP {}", response.status().as_u16()),
            )
            .with_detail("url", url),
            Err(e) => CheckResult::new(
                NAME,
                HealthStatus::Degraded,
                format!("Cannot access admin console: {}", e),
            )
            .with_detail("error", e.to_string()),
        }
    }

    async fn check_process(&self) -> CheckResult {
        const NAME: &str = "Process Status";
        let version = self.instance.version.clone().unwrap_or_default();

        match self.probe.process_list().await {
            Ok(listing) => {
                let count = count_matching_processes(&listing, PRODUCT_NAME, &version);
                if count > 0 {
                    CheckResult::new(
                        NAME,
                        HealthStatus::Healthy,
                        format!("Joget process running (version {})", version),
                    )
                    .with_detail("process_count", count)
                } else {
                    CheckResult::new(NAME, HealthStatus::Unhealthy, "Joget process not found")
                        .with_detail("version", version)
                }
            }
            Err(e) => CheckResult::new(
                NAME,
                HealthStatus::Unknown,
                format!("Error checking process: {}", e),
            )
            .with_detail("error", e.to_string()),
        }
    }

    async fn check_disk_space(&self) -> CheckResult {
        const NAME: &str = "Disk Space";

        match self.probe.disk_usage().await {
            Ok(usage) => {
                let status = HealthStatus::from_usage_percent(usage.used_percent);
                let message = match status {
                    HealthStatus::Healthy => format!("Disk space OK ({}% used)", usage.used_percent),
                    HealthStatus::Degraded => format!("Disk space low ({}% used)", usage.used_percent),
                    _ => format!("Disk space critical ({}% used)", usage.used_percent),
                };
                CheckResult::new(NAME, status, message)
                    .with_detail("used_percent", usage.used_percent)
                    .with_detail("available", usage.available)
                    .with_detail("total", usage.size)
            }
            Err(ProbeError::Parse { .. }) => CheckResult::new(
                NAME,
                HealthStatus::Unknown,
                "Could not parse disk space information",
            ),
            Err(e) => CheckResult::new(
                NAME,
                HealthStatus::Unknown,
                format!("Error checking disk space: {}", e),
            )
            .with_detail("error", e.to_string()),
        }
    }

    async fn check_memory_usage(&self) -> CheckResult {
        const NAME: &str = "Memory Usage";

        match self.probe.memory_usage().await {
            Ok(usage) => {
                let percent = usage.used_percent();
                let status = HealthStatus::from_usage_percent(percent);
                let message = match status {
                    HealthStatus::Healthy => format!("Memory usage OK ({}%)", percent),
                    HealthStatus::Degraded => format!("Memory usage high ({}%)", percent),
                    _ => format!("Memory usage critical ({}%)", percent),
                };
                CheckResult::new(NAME, status, message)
                    .with_detail("used_percent", percent)
                    .with_detail("used_mb", usage.used_mb)
                    .with_detail("total_mb", usage.total_mb)
            }
            Err(ProbeError::ToolMissing(_)) => CheckResult::new(
                NAME,
                HealthStatus::Unknown,
                "Memory check not available on this platform",
            ),
            Err(ProbeError::Parse { .. }) => CheckResult::new(
                NAME,
                HealthStatus::Unknown,
                "Could not parse memory information",
            ),
            Err(e) => {
                warn!("Memory probe failed: {}", e);
                CheckResult::new(
                    NAME,
                    HealthStatus::Unknown,
                    format!("Error checking memory: {}", e),
                )
                .with_detail("error", e.to_string())
            }
        }
    }
}

/// Lines mentioning the product (case-insensitive) and the exact version.
pub fn count_matching_processes(listing: &str, product: &str, version: &str) -> usize {
    let product = product.to_lowercase();
    listing
        .lines()
        .filter(|line| line.to_lowercase().contains(&product) && line.contains(version))
        .count()
}
