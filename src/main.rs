// src/main.rs
use clap::Parser;
use joget_ops::{cli, logging};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        std::env::var("FRS_DEV_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    };
    if let Err(e) = logging::init(&level) {
        eprintln!("{:#}", e);
    }

    let verbose = cli.verbose;
    if let Err(e) = cli::run(cli).await {
        tracing::debug!("Command failed: {:?}", e);
        eprintln!("\nError: {:#}", e);
        if !verbose {
            eprintln!("Run with --verbose for more details");
        }
        std::process::exit(1);
    }
}
