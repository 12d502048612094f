mod evaluate;
mod metrics;
mod outcome;
mod report;
mod verification;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};

use supervisor::io::report::load_report;

#[derive(Parser)]
#[command(name = "eval", version, about = "Score finished supervisor runs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate one run report and print the result as JSON.
    Score { report: PathBuf },
    /// Aggregate every report in a directory into counters.
    Summary { dir: PathBuf },
}

fn main() -> Result<()> {
    supervisor::logging::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Score { report } => score(&report),
        Command::Summary { dir } => summary(&dir),
    }
}

fn score(path: &Path) -> Result<()> {
    let run = load_report(path)?;
    let scored = report::score_report(&run);
    let out = serde_json::to_string_pretty(&scored).context("serialize evaluation")?;
    println!("{out}");
    Ok(())
}

fn summary(dir: &Path) -> Result<()> {
    let (metrics, warnings) = report::aggregate(dir)?;
    info!(runs = metrics.get("runs"), skipped = warnings.len(), "aggregated reports");
    for warning in &warnings {
        warn!("{warning}");
    }
    let out = serde_json::to_string_pretty(&json!({
        "counters": metrics.snapshot(),
        "skipped": warnings.len(),
    }))
    .context("serialize summary")?;
    println!("{out}");
    Ok(())
}
