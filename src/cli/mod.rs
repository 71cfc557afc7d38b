// src/cli/mod.rs
mod config_commands;
mod instance_commands;
pub mod table;

use crate::config::{default_config_path, load_config, PlatformConfig};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "frs-dev",
    version,
    about = "Command control center for Joget DX development",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "FRS_DEV_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Instance management
    #[command(subcommand)]
    Instance(InstanceCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    Show {
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: OutputFormat,
        /// Show specific section only
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Validate configuration file
    Validate,

    /// Show configuration file path
    Path,

    /// Open configuration file in $EDITOR
    Edit,

    /// Get a configuration value by dotted key (e.g. instances.jdx1.url)
    Get { key: String },

    /// List configured instances
    ListInstances,
}

#[derive(Subcommand, Debug)]
pub enum InstanceCommand {
    /// List all configured instances with an online probe
    List,

    /// Show configuration and health of an instance
    Info { instance: String },

    /// Test connectivity to an instance
    Test {
        instance: String,
        /// Connection timeout in seconds
        #[arg(short, long, default_value_t = 10)]
        timeout: u64,
    },

    /// Backup instance database with mysqldump
    Backup {
        instance: String,
        /// Output directory for backup
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List applications on an instance
    Apps { instance: String },

    /// Export an application archive
    Export {
        instance: String,
        app_id: String,
        /// Output file (default: {exports}/{app_id}.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import an application archive
    Import {
        instance: String,
        zip: PathBuf,
        /// Overwrite an existing application
        #[arg(long)]
        overwrite: bool,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Resolved global options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: PathBuf,
    pub verbose: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config_path: cli.config.clone().unwrap_or_else(default_config_path),
            verbose: cli.verbose,
        }
    }

    pub async fn load(&self) -> Result<PlatformConfig> {
        Ok(load_config(&self.config_path).await?)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::from_cli(&cli);
    match cli.command {
        Commands::Version => {
            println!("FRS Development Platform");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Package: {}", env!("CARGO_PKG_NAME"));
            Ok(())
        }
        Commands::Config(command) => config_commands::run(&ctx, command).await,
        Commands::Instance(command) => instance_commands::run(&ctx, command).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "frs-dev", "instance", "test", "jdx1", "--timeout", "3", "-v", "--config", "/tmp/c.yaml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yaml")));
        assert!(matches!(
            cli.command,
            Commands::Instance(InstanceCommand::Test { ref instance, timeout: 3 }) if instance == "jdx1"
        ));
    }

    #[test]
    fn test_parse_config_show() {
        let cli = Cli::try_parse_from(["frs-dev", "config", "show", "--format", "json", "-s", "paths"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommand::Show { format: OutputFormat::Json, section: Some(ref s) }) if s == "paths"
        ));
    }

    #[test]
    fn test_parse_export_and_import() {
        let cli = Cli::try_parse_from(["frs-dev", "instance", "export", "jdx2", "farmers"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Instance(InstanceCommand::Export { ref app_id, output: None, .. }) if app_id == "farmers"
        ));

        let cli = Cli::try_parse_from(["frs-dev", "instance", "import", "jdx2", "app.zip", "--overwrite"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Instance(InstanceCommand::Import { overwrite: true, .. })
        ));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["frs-dev", "config", "show", "--format", "toml"]).is_err());
    }
}
