// src/bin/joget_mdm.rs
use anyhow::Result;
use clap::Parser;
use joget_ops::{logging, mdm};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "joget-mdm",
    version,
    about = "Scan a Joget application export for master-data dependencies"
)]
struct Args {
    /// Path to the application export archive (.zip)
    #[arg(long)]
    app_export: PathBuf,

    /// Where to write the JSON analysis report
    #[arg(long)]
    output: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<mdm::AnalysisReport> {
    info!("Analyzing application export: {}", args.app_export.display());
    let report = mdm::analyze_archive(&args.app_export)?;
    mdm::write_report(&report, &args.output)?;
    Ok(report)
}

fn main() {
    let args = Args::parse();
    if let Err(e) = logging::init(if args.verbose { "debug" } else { "info" }) {
        eprintln!("{:#}", e);
    }

    match run(&args) {
        Ok(report) => print!("{}", report.summary()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
