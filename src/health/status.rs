// src/health/status.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

/// Least to most severe. Reduction keeps the highest rank seen.
const SEVERITY: [HealthStatus; 4] = [
    HealthStatus::Healthy,
    HealthStatus::Unknown,
    HealthStatus::Degraded,
    HealthStatus::Unhealthy,
];

impl HealthStatus {
    pub fn rank(self) -> usize {
        SEVERITY
            .iter()
            .position(|s| *s == self)
            .unwrap_or(SEVERITY.len())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Degraded => "DEGRADED",
            HealthStatus::Unhealthy => "UNHEALTHY",
            HealthStatus::Unknown => "UNKNOWN",
        }
    }

    /// Terminal label with a status glyph.
    pub fn label(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "✅ HEALTHY",
            HealthStatus::Degraded => "⚠️  DEGRADED",
            HealthStatus::Unhealthy => "❌ UNHEALTHY",
            HealthStatus::Unknown => "❓ UNKNOWN",
        }
    }

    /// Three-tier usage threshold: `<80` healthy, `<90` degraded, else unhealthy.
    pub fn from_usage_percent(percent: u32) -> Self {
        match percent {
            p if p < 80 => HealthStatus::Healthy,
            p if p < 90 => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        }
    }

    /// Process exit code for a final status: 0 healthy, 2 unhealthy, else 1.
    pub fn exit_code(self) -> i32 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Unhealthy => 2,
            HealthStatus::Degraded | HealthStatus::Unknown => 1,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduce statuses to the most severe one; an empty input is healthy.
pub fn reduce<I>(statuses: I) -> HealthStatus
where
    I: IntoIterator<Item = HealthStatus>,
{
    statuses
        .into_iter()
        .max_by_key(|s| s.rank())
        .unwrap_or(HealthStatus::Healthy)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_name: String,
    pub status: HealthStatus,
    pub message: String,
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl CheckResult {
    pub fn new(check_name: &str, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            check_name: check_name.to_string(),
            status,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

pub fn overall_status(results: &[CheckResult]) -> HealthStatus {
    reduce(results.iter().map(|r| r.status))
}
