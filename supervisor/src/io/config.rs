//! Supervisor configuration loaded from TOML.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::budget::{
    DEFAULT_RESPONSE_RESERVE, DEFAULT_TOOL_RESULT_RESERVE, DEFAULT_TOTAL_BUDGET,
};
use crate::error::SupervisorError;

/// Supervisor configuration (TOML).
///
/// Missing fields default to the values documented on each table. Commands
/// are argv arrays; the payload (source text, query, URL) is appended as the
/// last argument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Ceiling on ticks issued by the run driver.
    pub max_iterations: u32,
    pub budget: BudgetConfig,
    pub compression: CompressionConfig,
    pub exec: ExecConfig,
    pub oracle: OracleConfig,
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BudgetConfig {
    /// Per-dispatch allocator total; also the run's `per_subagent_limit`.
    pub total: u64,
    pub response_reserve: u64,
    pub tool_result_reserve: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            total: DEFAULT_TOTAL_BUDGET,
            response_reserve: DEFAULT_RESPONSE_RESERVE,
            tool_result_reserve: DEFAULT_TOOL_RESULT_RESERVE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CompressionConfig {
    /// Word bound applied to each history message in the decision context.
    pub message_max_words: usize,
    /// Capability results packed into each worker turn.
    pub result_max_items: usize,
    pub result_max_words: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            message_max_words: 120,
            result_max_items: 5,
            result_max_words: 80,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecConfig {
    /// Interpreter prefix for `execute_code`.
    pub command: Vec<String>,
    pub timeout_secs: u64,
    pub output_limit_bytes: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            command: vec!["python3".to_string(), "-c".to_string()],
            timeout_secs: 30,
            output_limit_bytes: 100_000,
        }
    }
}

impl ExecConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    /// Decision oracle command; required by `supervisor run`.
    pub decision_command: Vec<String>,
    /// Worker oracle command; required by `supervisor run`.
    pub worker_command: Vec<String>,
    pub timeout_secs: u64,
    pub worker_max_turns: u32,
    pub output_limit_bytes: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            decision_command: Vec::new(),
            worker_command: Vec::new(),
            timeout_secs: 600,
            worker_max_turns: 12,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WebConfig {
    /// Optional search command; the query is appended.
    pub search_command: Vec<String>,
    /// Optional scrape command; the URL is appended.
    pub scrape_command: Vec<String>,
    pub timeout_secs: u64,
    pub output_limit_bytes: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            search_command: Vec::new(),
            scrape_command: Vec::new(),
            timeout_secs: 60,
            output_limit_bytes: 200_000,
        }
    }
}

impl WebConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            budget: BudgetConfig::default(),
            compression: CompressionConfig::default(),
            exec: ExecConfig::default(),
            oracle: OracleConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl SupervisorConfig {
    pub fn validate(&self) -> Result<(), SupervisorError> {
        let invalid = |message: &str| Err(SupervisorError::configuration(message));
        if self.max_iterations == 0 {
            return invalid("max_iterations must be > 0");
        }
        if self.budget.total == 0 {
            return invalid("budget.total must be > 0");
        }
        let reserves = self
            .budget
            .response_reserve
            .saturating_add(self.budget.tool_result_reserve);
        if reserves >= self.budget.total {
            return invalid("budget.total must exceed response_reserve + tool_result_reserve");
        }
        if self.compression.result_max_items == 0 || self.compression.result_max_words == 0 {
            return invalid("compression.result_max_items and result_max_words must be > 0");
        }
        if self.compression.message_max_words == 0 {
            return invalid("compression.message_max_words must be > 0");
        }
        if !is_runnable(&self.exec.command) {
            return invalid("exec.command must be a non-empty array");
        }
        if self.exec.timeout_secs == 0 {
            return invalid("exec.timeout_secs must be > 0");
        }
        if self.exec.output_limit_bytes == 0
            || self.oracle.output_limit_bytes == 0
            || self.web.output_limit_bytes == 0
        {
            return invalid("output_limit_bytes must be > 0");
        }
        if self.oracle.timeout_secs == 0 {
            return invalid("oracle.timeout_secs must be > 0");
        }
        if self.oracle.worker_max_turns == 0 {
            return invalid("oracle.worker_max_turns must be > 0");
        }
        if self.web.timeout_secs == 0 {
            return invalid("web.timeout_secs must be > 0");
        }
        Ok(())
    }

    /// Validate the settings a live run cannot do without: both oracle
    /// commands.
    pub fn validate_for_run(&self) -> Result<(), SupervisorError> {
        self.validate()?;
        if !is_runnable(&self.oracle.decision_command) {
            return Err(SupervisorError::configuration(
                "oracle.decision_command must be a non-empty array",
            ));
        }
        if !is_runnable(&self.oracle.worker_command) {
            return Err(SupervisorError::configuration(
                "oracle.worker_command must be a non-empty array",
            ));
        }
        Ok(())
    }
}

fn is_runnable(argv: &[String]) -> bool {
    argv.first().is_some_and(|program| !program.trim().is_empty())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SupervisorConfig::default()`.
pub fn load_config(path: &Path) -> Result<SupervisorConfig> {
    if !path.exists() {
        let cfg = SupervisorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SupervisorConfig = toml::from_str(&contents).map_err(|err| {
        SupervisorError::configuration(format!("parse {}: {err}", path.display()))
    })?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, SupervisorConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("supervisor.toml");
        let cfg = SupervisorConfig {
            max_iterations: 3,
            oracle: OracleConfig {
                decision_command: vec!["./decide.sh".to_string()],
                worker_command: vec!["./work.sh".to_string()],
                ..OracleConfig::default()
            },
            ..SupervisorConfig::default()
        };
        let text = toml::to_string_pretty(&cfg).expect("serialize");
        fs::write(&path, text).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("supervisor.toml");
        fs::write(&path, "max_iterations = 4\n[budget]\ntotal = 2048\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.max_iterations, 4);
        assert_eq!(cfg.budget.total, 2048);
        assert_eq!(cfg.budget.response_reserve, 512);
        assert_eq!(cfg.exec.timeout_secs, 30);
    }

    #[test]
    fn reserves_must_fit_inside_total() {
        let cfg = SupervisorConfig {
            budget: BudgetConfig {
                total: 1024,
                ..BudgetConfig::default()
            },
            ..SupervisorConfig::default()
        };
        let err = cfg.validate().expect_err("reserves fill the budget");
        assert!(matches!(err, SupervisorError::Configuration(_)));
    }

    #[test]
    fn run_requires_oracle_commands() {
        let err = SupervisorConfig::default()
            .validate_for_run()
            .expect_err("no oracle commands");
        assert!(err.to_string().contains("decision_command"));
    }

    #[test]
    fn unparseable_file_is_a_configuration_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("supervisor.toml");
        fs::write(&path, "max_iterations = \"many\"\n").expect("write");
        let err = load_config(&path).expect_err("bad toml");
        assert!(matches!(
            err.downcast_ref::<SupervisorError>(),
            Some(SupervisorError::Configuration(_))
        ));
    }
}
