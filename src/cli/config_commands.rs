// src/cli/config_commands.rs
use super::table::Table;
use super::{ConfigCommand, Context, OutputFormat};
use crate::config::{ensure_directories, load_config, save_config, PlatformConfig};
use anyhow::{anyhow, bail, Context as _, Result};
use serde_json::Value;
use tracing::{info, warn};

pub(super) async fn run(ctx: &Context, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init { force } => init(ctx, force).await,
        ConfigCommand::Show { format, section } => show(ctx, format, section.as_deref()).await,
        ConfigCommand::Validate => validate(ctx).await,
        ConfigCommand::Path => {
            show_path(ctx);
            Ok(())
        }
        ConfigCommand::Edit => edit(ctx).await,
        ConfigCommand::Get { key } => get(ctx, &key).await,
        ConfigCommand::ListInstances => list_instances(ctx).await,
    }
}

async fn init(ctx: &Context, force: bool) -> Result<()> {
    let path = &ctx.config_path;
    if path.exists() && !force {
        bail!(
            "Configuration already exists at {}\nUse --force to overwrite",
            path.display()
        );
    }

    let config = PlatformConfig::starter();
    save_config(path, &config)
        .await
        .context("Failed to initialize configuration")?;
    let created = ensure_directories(&config).await?;
    info!("Created {} working directories", created.len());

    println!("✓ Configuration initialized successfully\n");
    println!("Location: {}\n", path.display());
    println!("Next steps:");
    println!("1. Set instance passwords in environment:");
    println!("   export JDX1_PASSWORD='your-password'");
    println!("2. Edit configuration: frs-dev config edit");
    println!("3. Validate: frs-dev config validate");
    Ok(())
}

/// Configuration as a JSON tree with unset optional values removed.
fn config_tree(config: &PlatformConfig) -> Result<Value> {
    let mut tree = serde_json::to_value(config)?;
    strip_nulls(&mut tree);
    Ok(tree)
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

/// Restrict the tree to a single top-level section.
fn select_section(tree: Value, section: &str) -> Result<Value> {
    let Value::Object(mut map) = tree else {
        bail!("Configuration is not a mapping");
    };
    match map.remove(section) {
        Some(value) => {
            let mut selected = serde_json::Map::new();
            selected.insert(section.to_string(), value);
            Ok(Value::Object(selected))
        }
        None => {
            let available: Vec<&str> = map.keys().map(String::as_str).collect();
            bail!(
                "Section '{}' not found\nAvailable sections: {}",
                section,
                available.join(", ")
            )
        }
    }
}

/// Walk a dotted key such as `instances.jdx1.url`.
fn lookup<'a>(tree: &'a Value, key: &str) -> Result<&'a Value> {
    let mut current = tree;
    for part in key.split('.') {
        current = match current {
            Value::Object(map) => map
                .get(part)
                .ok_or_else(|| anyhow!("Key '{}' not found", key))?,
            _ => bail!("Cannot access '{}' in non-dict value", part),
        };
    }
    Ok(current)
}

fn render(value: &Value, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    })
}

async fn show(ctx: &Context, format: OutputFormat, section: Option<&str>) -> Result<()> {
    let config = ctx.load().await?;
    let mut tree = config_tree(&config)?;
    if let Some(section) = section {
        tree = select_section(tree, section)?;
    }
    println!("{}", render(&tree, format)?);
    Ok(())
}

async fn validate(ctx: &Context) -> Result<()> {
    println!("Validating configuration: {}\n", ctx.config_path.display());

    let config = load_config(&ctx.config_path)
        .await
        .map_err(|e| anyhow!("✗ Configuration has errors: {}", e))?;

    for dir in config.missing_directories() {
        warn!("Directory does not exist: {}", dir.display());
        println!("⚠️  Missing directory: {}", dir.display());
    }

    println!("✓ Configuration is valid ({} instances)", config.instances.len());
    Ok(())
}

fn show_path(ctx: &Context) {
    println!("Configuration file: {}", ctx.config_path.display());
    if ctx.config_path.exists() {
        println!("Status: ✓ exists");
    } else {
        println!("Status: ✗ not found");
        println!("\nRun 'frs-dev config init' to create it");
    }
}

async fn edit(ctx: &Context) -> Result<()> {
    let path = &ctx.config_path;
    if !path.exists() {
        bail!("Configuration file not found\nRun 'frs-dev config init' first");
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
    println!("Opening {} in {}...", path.display(), editor);

    let status = tokio::process::Command::new(&editor)
        .arg(path)
        .status()
        .await
        .with_context(|| format!("Failed to open editor '{}'", editor))?;
    if !status.success() {
        bail!(
            "Editor exited with {}\nSet EDITOR or edit directly: {}",
            status,
            path.display()
        );
    }

    println!("\nValidating changes...");
    validate(ctx).await
}

async fn get(ctx: &Context, key: &str) -> Result<()> {
    let config = ctx.load().await?;
    let tree = serde_json::to_value(&config)?;
    match lookup(&tree, key)? {
        Value::String(s) => println!("{}", s),
        value @ (Value::Object(_) | Value::Array(_)) => {
            println!("{}", serde_json::to_string_pretty(value)?)
        }
        value => println!("{}", value),
    }
    Ok(())
}

pub(super) fn instances_table(config: &PlatformConfig) -> Table {
    let mut table = Table::new(["Name", "URL", "Web Port", "DB Port", "Version"])
        .with_title("Configured Instances");
    for (name, instance) in &config.instances {
        table.add_row([
            name.clone(),
            instance.url.clone(),
            instance.web_port.to_string(),
            instance.db_port.to_string(),
            instance.version.clone().unwrap_or_else(|| "unknown".to_string()),
        ]);
    }
    table
}

async fn list_instances(ctx: &Context) -> Result<()> {
    let config = ctx.load().await?;
    print!("{}", instances_table(&config).render());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Value {
        config_tree(&PlatformConfig::starter()).unwrap()
    }

    #[test]
    fn test_lookup_dotted_key() {
        let tree = tree();
        assert_eq!(lookup(&tree, "instances.jdx1.url").unwrap(), "http://localhost:8080");
        assert_eq!(lookup(&tree, "instances.jdx3.db_port").unwrap(), 3308);
        assert_eq!(lookup(&tree, "log_level").unwrap(), "INFO");
    }

    #[test]
    fn test_lookup_errors() {
        let tree = tree();
        let missing = lookup(&tree, "instances.jdx9").unwrap_err();
        assert_eq!(missing.to_string(), "Key 'instances.jdx9' not found");

        let scalar = lookup(&tree, "log_level.deeper").unwrap_err();
        assert_eq!(scalar.to_string(), "Cannot access 'deeper' in non-dict value");
    }

    #[test]
    fn test_select_section() {
        let selected = select_section(tree(), "workflows").unwrap();
        let map = selected.as_object().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["workflows"]["max_parallel_operations"], 4);

        let err = select_section(tree(), "nope").unwrap_err().to_string();
        assert!(err.contains("Section 'nope' not found"));
        assert!(err.contains("instances"));
    }

    #[test]
    fn test_nulls_are_stripped() {
        let tree = tree();
        assert!(tree["instances"]["jdx1"]["credentials"].get("password").is_none());
        assert!(tree["paths"].get("workflows").is_none());
    }

    #[test]
    fn test_render_yaml() {
        let rendered = render(&select_section(tree(), "log_level").unwrap(), OutputFormat::Yaml).unwrap();
        assert_eq!(rendered.trim(), "log_level: INFO");
    }

    #[test]
    fn test_instances_table() {
        let rendered = instances_table(&PlatformConfig::starter()).render();
        assert!(rendered.contains("jdx6"));
        assert!(rendered.contains("5555"));
        assert_eq!(rendered.lines().count(), 3 + 6);
    }
}
