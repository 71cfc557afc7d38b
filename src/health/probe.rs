// src/health/probe.rs
// OS-level probes behind a trait so checks can run against a fake.
use async_trait::async_trait;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{0} command not found")]
    ToolMissing(String),

    #[error("{tool} timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },

    #[error("{tool} failed: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {tool} output: {reason}")]
    Parse { tool: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskUsage {
    pub used_percent: u32,
    pub size: String,
    pub available: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryUsage {
    pub total_mb: u64,
    pub used_mb: u64,
}

impl MemoryUsage {
    /// Integer percentage, truncated.
    pub fn used_percent(&self) -> u32 {
        if self.total_mb == 0 {
            return 0;
        }
        (self.used_mb.saturating_mul(100) / self.total_mb) as u32
    }
}

/// Database endpoint probed by the SQL client.
#[derive(Debug, Clone)]
pub struct SqlTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
}

#[async_trait]
pub trait SystemProbe: Send + Sync {
    /// Run `SELECT 1`; `Ok(false)` when the client ran but the query failed.
    async fn sql_ping(&self, target: &SqlTarget, empty_password: bool) -> Result<bool, ProbeError>;

    /// Raw process listing, one process per line.
    async fn process_list(&self) -> Result<String, ProbeError>;

    /// Usage of the root filesystem.
    async fn disk_usage(&self) -> Result<DiskUsage, ProbeError>;

    async fn memory_usage(&self) -> Result<MemoryUsage, ProbeError>;
}

/// Probe backed by `mysql`, `ps`, `df` and `free`.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    sql_timeout: Duration,
    tool_timeout: Duration,
}

impl Default for CommandProbe {
    fn default() -> Self {
        Self {
            sql_timeout: Duration::from_secs(10),
            tool_timeout: Duration::from_secs(5),
        }
    }
}

impl CommandProbe {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Run a command with a deadline, optionally feeding `stdin`.
pub async fn run_command(
    program: &str,
    args: &[&str],
    stdin: Option<&[u8]>,
    limit: Duration,
) -> Result<Output, ProbeError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(program, ?args, "Running command");
    let mut child = command.spawn().map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ProbeError::ToolMissing(program.to_string()),
        _ => ProbeError::Io {
            tool: program.to_string(),
            source,
        },
    })?;

    let pipe = child.stdin.take();
    let run = async move {
        if let (Some(input), Some(mut pipe)) = (stdin, pipe) {
            // A closed pipe just means the tool did not read its input.
            if let Err(e) = pipe.write_all(input).await {
                debug!(program, "stdin not consumed: {}", e);
            }
        }
        child.wait_with_output().await
    };

    match timeout(limit, run).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(ProbeError::Io {
            tool: program.to_string(),
            source,
        }),
        Err(_) => Err(ProbeError::Timeout {
            tool: program.to_string(),
            secs: limit.as_secs(),
        }),
    }
}

/// Parse `df -h /`. Wrapped rows (long device names) are joined first.
pub fn parse_df(stdout: &str) -> Result<DiskUsage, ProbeError> {
    let parse_err = |reason: &str| ProbeError::Parse {
        tool: "df".to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = stdout
        .trim()
        .lines()
        .skip(1)
        .flat_map(str::split_whitespace)
        .collect();
    if fields.len() < 5 {
        return Err(parse_err("expected Filesystem Size Used Avail Use% columns"));
    }

    let used_percent = fields[4]
        .trim_end_matches('%')
        .parse::<u32>()
        .map_err(|_| parse_err(&format!("bad Use% value '{}'", fields[4])))?;

    Ok(DiskUsage {
        used_percent,
        size: fields[1].to_string(),
        available: fields[3].to_string(),
    })
}

/// Parse `free -m`; the second line is `Mem: total used ...`.
pub fn parse_free(stdout: &str) -> Result<MemoryUsage, ProbeError> {
    let parse_err = |reason: &str| ProbeError::Parse {
        tool: "free".to_string(),
        reason: reason.to_string(),
    };

    let line = stdout
        .trim()
        .lines()
        .nth(1)
        .ok_or_else(|| parse_err("missing memory line"))?;
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(parse_err("expected total and used columns"));
    }

    let number = |s: &str| s.parse::<u64>().map_err(|_| parse_err(&format!("bad number '{}'", s)));
    let total_mb = number(parts[1])?;
    let used_mb = number(parts[2])?;
    if total_mb == 0 {
        return Err(parse_err("total memory is zero"));
    }

    Ok(MemoryUsage { total_mb, used_mb })
}

#[async_trait]
impl SystemProbe for CommandProbe {
    async fn sql_ping(&self, target: &SqlTarget, empty_password: bool) -> Result<bool, ProbeError> {
        let port = target.port.to_string();
        let args = [
            "-h",
            target.host.as_str(),
            "-P",
            port.as_str(),
            "-u",
            target.user.as_str(),
            "-e",
            "SELECT 1",
        ];
        let stdin = empty_password.then_some(b"\n".as_slice());
        let output = run_command("mysql", &args, stdin, self.sql_timeout).await?;
        Ok(output.status.success())
    }

    async fn process_list(&self) -> Result<String, ProbeError> {
        let output = run_command("ps", &["aux"], None, self.tool_timeout).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn disk_usage(&self) -> Result<DiskUsage, ProbeError> {
        let output = run_command("df", &["-h", "/"], None, self.tool_timeout).await?;
        parse_df(&String::from_utf8_lossy(&output.stdout))
    }

    async fn memory_usage(&self) -> Result<MemoryUsage, ProbeError> {
        let output = run_command("free", &["-m"], None, self.tool_timeout).await?;
        parse_free(&String::from_utf8_lossy(&output.stdout))
    }
}
