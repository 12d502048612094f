//! `supervisor` CLI: drive one objective to completion through the
//! configured decision and worker commands.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use supervisor::artifacts::ArtifactStore;
use supervisor::capabilities::CapabilityRegistry;
use supervisor::error::SupervisorError;
use supervisor::exit_codes;
use supervisor::io::config::load_config;
use supervisor::io::oracle::{CommandDecisionOracle, CommandWorkerOracle};
use supervisor::io::report::{RunReport, write_report};
use supervisor::logging;
use supervisor::looping::{LoopStop, run_loop};
use supervisor::tick::Supervisor;

const DEFAULT_CONFIG: &str = "supervisor.toml";

#[derive(Parser)]
#[command(
    name = "supervisor",
    version,
    about = "Decompose an objective into delegated tasks and drive them to completion"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the orchestration loop for one objective.
    Run {
        #[arg(long)]
        objective: String,
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Override `max_iterations` from the config.
        #[arg(long)]
        max_iterations: Option<u32>,
        /// Write a JSON run report here when the run stops.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// List the capabilities available to a run.
    Capabilities {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// Load and validate the configuration.
    CheckConfig {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

fn main() {
    logging::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::INVALID
            } else {
                exit_codes::OK
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn dispatch(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Run {
            objective,
            config,
            max_iterations,
            report,
        } => cmd_run(&objective, &config, max_iterations, report.as_deref()),
        Command::Capabilities { config } => cmd_capabilities(&config),
        Command::CheckConfig { config } => cmd_check_config(&config),
    }
}

/// Configuration problems are usage errors; anything else that escapes a
/// run aborted it.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SupervisorError>() {
        Some(SupervisorError::Configuration(_)) => exit_codes::INVALID,
        _ => exit_codes::ABORTED,
    }
}

fn cmd_run(
    objective: &str,
    config_path: &Path,
    max_iterations: Option<u32>,
    report_path: Option<&Path>,
) -> Result<i32> {
    let mut cfg = load_config(config_path)?;
    if let Some(max) = max_iterations {
        cfg.max_iterations = max;
    }
    cfg.validate_for_run()?;

    let store = ArtifactStore::new();
    let registry = CapabilityRegistry::standard(&store, &cfg);
    let mut supervisor = Supervisor::new(
        CommandDecisionOracle::from_config(&cfg.oracle),
        CommandWorkerOracle::from_config(&cfg.oracle, &cfg.compression),
        registry,
        store,
        &cfg,
    )?;

    let state = supervisor.start(objective);
    let outcome = run_loop(&mut supervisor, state, cfg.max_iterations, |tick, state| {
        info!(
            tick,
            todo = state.todo.len(),
            logs = state.subagent_logs.len(),
            "tick finished"
        );
    })?;

    if let Some(path) = report_path {
        write_report(path, &RunReport::from_outcome(&outcome))?;
    }

    match outcome.stop {
        LoopStop::Complete => {
            println!("{}", outcome.state.final_output.unwrap_or_default());
            Ok(exit_codes::OK)
        }
        LoopStop::IterationLimit => {
            eprintln!(
                "iteration limit reached after {} ticks without a final answer",
                outcome.ticks
            );
            Ok(exit_codes::ITERATION_LIMIT)
        }
    }
}

fn cmd_capabilities(config_path: &Path) -> Result<i32> {
    let cfg = load_config(config_path)?;
    let registry = CapabilityRegistry::standard(&ArtifactStore::new(), &cfg);
    for name in registry.list_available() {
        println!("{name}");
    }
    Ok(exit_codes::OK)
}

fn cmd_check_config(config_path: &Path) -> Result<i32> {
    let cfg = load_config(config_path)?;
    cfg.validate_for_run()?;
    println!("ok");
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_with_overrides() {
        let cli = Cli::parse_from([
            "supervisor",
            "run",
            "--objective",
            "Learn about Python",
            "--max-iterations",
            "3",
            "--report",
            "out.json",
        ]);
        match cli.command {
            Command::Run {
                objective,
                config,
                max_iterations,
                report,
            } => {
                assert_eq!(objective, "Learn about Python");
                assert_eq!(config, PathBuf::from(DEFAULT_CONFIG));
                assert_eq!(max_iterations, Some(3));
                assert_eq!(report, Some(PathBuf::from("out.json")));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_requires_objective() {
        assert!(Cli::try_parse_from(["supervisor", "run"]).is_err());
    }

    #[test]
    fn parse_check_config() {
        let cli = Cli::parse_from(["supervisor", "check-config", "--config", "x.toml"]);
        assert!(matches!(cli.command, Command::CheckConfig { config } if config == Path::new("x.toml")));
    }

    #[test]
    fn configuration_errors_map_to_invalid() {
        let err = anyhow::Error::new(SupervisorError::configuration("bad"));
        assert_eq!(exit_code_for(&err), exit_codes::INVALID);
        let err = anyhow::Error::new(SupervisorError::UnknownCapability("x".to_string()));
        assert_eq!(exit_code_for(&err), exit_codes::ABORTED);
    }
}
