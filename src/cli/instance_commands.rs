// src/cli/instance_commands.rs
use super::table::{render_pairs, Table};
use super::{Context, InstanceCommand};
use crate::client::{InstanceHealth, JogetClient};
use crate::config::InstanceConfig;
use crate::health::probe::run_command;
use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, Local};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const BACKUP_TIMEOUT: Duration = Duration::from_secs(300);

pub(super) async fn run(ctx: &Context, command: InstanceCommand) -> Result<()> {
    match command {
        InstanceCommand::List => list(ctx).await,
        InstanceCommand::Info { instance } => info(ctx, &instance).await,
        InstanceCommand::Test { instance, timeout } => test(ctx, &instance, timeout).await,
        InstanceCommand::Backup { instance, output } => backup(ctx, &instance, output).await,
        InstanceCommand::Apps { instance } => apps(ctx, &instance).await,
        InstanceCommand::Export {
            instance,
            app_id,
            output,
        } => export(ctx, &instance, &app_id, output).await,
        InstanceCommand::Import {
            instance,
            zip,
            overwrite,
        } => import(ctx, &instance, &zip, overwrite).await,
    }
}

async fn client_for(ctx: &Context, name: &str) -> Result<JogetClient> {
    let config = ctx.load().await?;
    let instance = config.get_instance(name)?;
    Ok(JogetClient::new(instance)?)
}

async fn list(ctx: &Context) -> Result<()> {
    let config = ctx.load().await?;

    let mut table = Table::new(["Name", "URL", "Web Port", "DB Port", "Version", "Status"])
        .with_title("Configured Instances");
    for (name, instance) in &config.instances {
        let status = match JogetClient::new(instance) {
            Ok(client) if client.test_connection(PROBE_TIMEOUT).await => "● Online",
            Ok(_) => "● Offline",
            Err(e) => {
                debug!(instance = %name, "Cannot build client: {}", e);
                "● Unknown"
            }
        };
        table.add_row([
            name.clone(),
            instance.url.clone(),
            instance.web_port.to_string(),
            instance.db_port.to_string(),
            instance.version.clone().unwrap_or_else(|| "-".to_string()),
            status.to_string(),
        ]);
    }

    print!("{}", table.render());
    println!("\nTotal instances: {}", config.instances.len());
    Ok(())
}

fn configuration_block(instance: &InstanceConfig) -> String {
    let mut pairs = vec![
        ("Name", instance.name.clone()),
        ("URL", instance.url.clone()),
        ("Base URL", instance.base_url()),
        ("Console URL", instance.console_url()),
        ("Web Port", instance.web_port.to_string()),
        ("Database Port", instance.db_port.to_string()),
        ("Database Name", instance.db_name.clone()),
        ("Database Host", instance.db_host.clone()),
        (
            "Version",
            instance.version.clone().unwrap_or_else(|| "unknown".to_string()),
        ),
    ];
    if let Some(path) = &instance.installation_path {
        pairs.push(("Installation Path", path.display().to_string()));
    }
    render_pairs(&pairs)
}

fn health_block(health: &InstanceHealth) -> String {
    let flag = |ok: bool| (if ok { "✓ Yes" } else { "✗ No" }).to_string();
    let mut pairs = vec![
        ("Reachable", flag(health.reachable)),
        ("Authenticated", flag(health.authenticated)),
        ("Applications", health.applications.to_string()),
        ("Plugins", health.plugins.to_string()),
    ];
    if let Some(version) = &health.version {
        pairs.push(("Detected Version", version.clone()));
    }
    render_pairs(&pairs)
}

async fn info(ctx: &Context, name: &str) -> Result<()> {
    let config = ctx.load().await?;
    let instance = config.get_instance(name)?;
    let client = JogetClient::new(instance)?;

    println!("\nInstance: {}\n", name);
    println!("Configuration");
    print!("{}", configuration_block(instance));

    println!("\nChecking health...");
    let health = client.health_status().await;
    println!("Health Status");
    print!("{}", health_block(&health));

    match (health.reachable, health.authenticated) {
        (true, true) => println!("\n✓ Instance is healthy and accessible\n"),
        (true, false) => {
            println!("\n⚠ Instance is reachable but authentication failed");
            println!("Check your credentials in configuration\n");
        }
        _ => {
            println!("\n✗ Instance is not reachable");
            println!("Check if the instance is running and ports are correct\n");
        }
    }
    Ok(())
}

async fn test(ctx: &Context, name: &str, timeout: u64) -> Result<()> {
    let client = client_for(ctx, name).await?;
    println!("Testing connectivity to {}...", name);

    if !client.test_connection(Duration::from_secs(timeout)).await {
        bail!("✗ Failed to connect to {}\nInstance may be offline or unreachable", name);
    }

    println!("\n✓ Successfully connected to {}", name);
    match client.list_applications().await {
        Ok(apps) => println!("Applications: {}", apps.len()),
        Err(e) => debug!("Could not list applications: {}", e),
    }
    Ok(())
}

/// `{dir}/{name}_backup_{YYYYmmdd_HHMMSS}.sql`
pub(crate) fn backup_file_name(name: &str, now: &DateTime<Local>) -> String {
    format!("{}_backup_{}.sql", name, now.format("%Y%m%d_%H%M%S"))
}

pub(crate) fn default_backup_dir(backups: &Path, now: &DateTime<Local>) -> PathBuf {
    backups.join(now.format("%Y%m%d").to_string())
}

fn mysqldump_args(instance: &InstanceConfig, result_file: &Path) -> Vec<String> {
    vec![
        "-P".to_string(),
        instance.db_port.to_string(),
        "-h".to_string(),
        instance.db_host.clone(),
        "-u".to_string(),
        instance.db_user.clone(),
        "--databases".to_string(),
        instance.db_name.clone(),
        "--result-file".to_string(),
        result_file.display().to_string(),
    ]
}

async fn backup(ctx: &Context, name: &str, output: Option<PathBuf>) -> Result<()> {
    let config = ctx.load().await?;
    let instance = config.get_instance(name)?;
    let now = Local::now();

    let dir = output.unwrap_or_else(|| default_backup_dir(&config.paths.backups, &now));
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let backup_file = dir.join(backup_file_name(name, &now));

    println!("Backing up {} database...", name);
    println!("Database: {} on port {}", instance.db_name, instance.db_port);
    println!("Output: {}\n", backup_file.display());

    let args = mysqldump_args(instance, &backup_file);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = run_command("mysqldump", &args, None, BACKUP_TIMEOUT).await?;
    if !output.status.success() {
        bail!("Backup failed: {}", String::from_utf8_lossy(&output.stderr).trim());
    }

    let size = tokio::fs::metadata(&backup_file)
        .await
        .with_context(|| format!("Backup file missing: {}", backup_file.display()))?
        .len();
    info!(instance = name, bytes = size, "Backup complete");

    println!("✓ Backup completed successfully\n");
    println!("File: {}", backup_file.display());
    println!("Size: {:.2} MB", size as f64 / (1024.0 * 1024.0));
    Ok(())
}

fn text_cell(app: &Value, key: &str) -> String {
    match app.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().map_or(false, |n| n != 0.0),
        _ => false,
    }
}

pub(crate) fn applications_table(name: &str, apps: &[Value]) -> Table {
    let mut table = Table::new(["App ID", "Name", "Version", "Published"])
        .with_title(format!("Applications on {}", name));
    for app in apps {
        table.add_row([
            text_cell(app, "id"),
            text_cell(app, "name"),
            text_cell(app, "version"),
            (if truthy(app.get("published")) { "Yes" } else { "No" }).to_string(),
        ]);
    }
    table
}

async fn apps(ctx: &Context, name: &str) -> Result<()> {
    let client = client_for(ctx, name).await?;
    println!("Listing applications on {}...\n", name);

    let apps = client.list_applications().await?;
    if apps.is_empty() {
        println!("No applications found");
        return Ok(());
    }

    print!("{}", applications_table(name, &apps).render());
    println!("\nTotal applications: {}", apps.len());
    Ok(())
}

async fn export(ctx: &Context, name: &str, app_id: &str, output: Option<PathBuf>) -> Result<()> {
    let config = ctx.load().await?;
    let client = JogetClient::new(config.get_instance(name)?)?;
    let output = output.unwrap_or_else(|| config.paths.exports.join(format!("{}.zip", app_id)));

    println!("Exporting {} from {}...", app_id, name);
    let bytes = client.export_application(app_id, &output).await?;

    println!("✓ Exported to {} ({:.2} MB)", output.display(), bytes as f64 / (1024.0 * 1024.0));
    Ok(())
}

async fn import(ctx: &Context, name: &str, zip: &Path, overwrite: bool) -> Result<()> {
    if !zip.exists() {
        bail!("Application archive not found: {}", zip.display());
    }
    let client = client_for(ctx, name).await?;

    println!("Importing {} into {}...", zip.display(), name);
    let response = client.import_application(zip, overwrite).await?;
    debug!("Import response: {}", response);

    println!("✓ Import completed");
    Ok(())
}
