// src/logging.rs
use tracing_subscriber::EnvFilter;

/// Normalize a level name (`INFO`, `warning`, ...) to a filter directive level.
pub fn normalize_level(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        _ => "info",
    }
}

/// Crate targets: the library and each binary.
const TARGETS: [&str; 4] = ["joget_ops", "frs_dev", "joget_health", "joget_mdm"];

/// `env_var` directives when set and valid, else our targets at `level`.
fn build_filter(env_var: &str, level: &str) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(env_var) {
        return Ok(filter);
    }

    let level = normalize_level(level);
    let mut filter = EnvFilter::new("warn");
    for target in TARGETS {
        filter = filter.add_directive(format!("{}={}", target, level).parse()?);
    }
    Ok(filter.add_directive("reqwest=warn".parse()?))
}

/// Install the global subscriber. `RUST_LOG` replaces the default directives.
pub fn init(level: &str) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(EnvFilter::DEFAULT_ENV, level)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
