// src/bin/joget_health.rs
use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use joget_ops::config::{
    default_config_path, load_config, load_instance_descriptor, InstanceConfig, PlatformConfig,
};
use joget_ops::health::{report, CommandProbe, HealthEvaluator, HealthReport, SystemProbe};
use joget_ops::logging;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

#[derive(Parser, Debug)]
#[command(name = "joget-health", version, about = "Check health of Joget DX instances")]
#[command(group(ArgGroup::new("target").required(true).args(["instance", "config", "all"])))]
struct Args {
    /// Instance name to check
    #[arg(long)]
    instance: Option<String>,

    /// Path to a single-instance descriptor file (JSON or YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check all configured instances
    #[arg(long)]
    all: bool,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Platform configuration file listing the instances
    #[arg(long, env = "FRS_DEV_CONFIG")]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

async fn platform_config(settings: Option<&Path>) -> Result<PlatformConfig> {
    let path = settings
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);
    if settings.is_none() && !path.exists() {
        warn!("No configuration at {}, using built-in instances", path.display());
        return Ok(PlatformConfig::health_check_defaults());
    }
    load_config(&path)
        .await
        .with_context(|| format!("Failed to load {}", path.display()))
}

async fn targets(args: &Args) -> Result<Vec<InstanceConfig>> {
    if let Some(path) = &args.config {
        return Ok(vec![load_instance_descriptor(path).await?]);
    }

    let platform = platform_config(args.settings.as_deref()).await?;
    match &args.instance {
        Some(name) => Ok(vec![platform.get_instance(name)?.clone()]),
        None => Ok(platform.instances.into_values().collect()),
    }
}

async fn run(args: &Args) -> Result<Vec<HealthReport>> {
    let probe: Arc<dyn SystemProbe> = Arc::new(CommandProbe::new());
    let mut reports = Vec::new();

    for instance in targets(args).await? {
        let span = info_span!("health", instance = %instance.name, run_id = %uuid::Uuid::new_v4());
        let evaluator = HealthEvaluator::new(instance, Arc::clone(&probe))?;
        let report = evaluator.run_all_checks().instrument(span).await;

        if !args.json {
            print!("{}", report::render_text(&report));
        }
        reports.push(report);
    }

    Ok(reports)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = logging::init(if args.verbose { "debug" } else { "info" }) {
        eprintln!("{:#}", e);
    }

    let reports = match run(&args).await {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report::to_json(&reports)) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    let status = report::batch_status(&reports);
    info!(instances = reports.len(), status = %status, "Health run complete");
    std::process::exit(status.exit_code());
}
