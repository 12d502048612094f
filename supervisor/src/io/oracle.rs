//! Oracle abstractions for deciding and for executing delegated work.
//!
//! [`DecisionOracle`] and [`WorkerOracle`] decouple the loop from whatever
//! policy backs it. The command implementations exchange JSON with an
//! external process over stdin/stdout; tests use scripted oracles from
//! `test_support` that never spawn processes.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::capabilities::CapabilityHandle;
use crate::core::compression::compress_results;
use crate::core::types::{Decision, DecisionContext};
use crate::io::config::{CompressionConfig, OracleConfig};
use crate::io::process::{command_from_argv, run_command_with_timeout};

/// Chooses the next actions for a run.
pub trait DecisionOracle {
    fn decide(&self, context: &DecisionContext) -> Result<Decision>;
}

/// One delegated task as the worker sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerTask {
    pub todo_id: String,
    /// Rendered worker prompt; the task description is its objective.
    pub prompt: String,
}

/// Executes a single delegated task to completion using only the handles it
/// is given. `Ok(None)` means the worker finished without producing text.
pub trait WorkerOracle {
    fn run(&self, task: &WorkerTask, capabilities: &[CapabilityHandle]) -> Result<Option<String>>;
}

/// Decision oracle backed by an external command.
#[derive(Debug, Clone)]
pub struct CommandDecisionOracle {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandDecisionOracle {
    pub fn from_config(config: &OracleConfig) -> Self {
        Self {
            command: config.decision_command.clone(),
            timeout: config.timeout(),
            output_limit_bytes: config.output_limit_bytes,
        }
    }
}

impl DecisionOracle for CommandDecisionOracle {
    #[instrument(skip_all, fields(messages = context.messages.len()))]
    fn decide(&self, context: &DecisionContext) -> Result<Decision> {
        let decision: Decision = exchange_json(
            "decision oracle",
            &self.command,
            context,
            self.timeout,
            self.output_limit_bytes,
        )?;
        debug!(actions = decision.actions.len(), "decision received");
        Ok(decision)
    }
}

/// Worker oracle backed by an external command invoked once per turn.
///
/// Each turn the command sees the task, its scoped capabilities and the
/// transcript so far, and answers with either a capability call or a final
/// result.
#[derive(Debug, Clone)]
pub struct CommandWorkerOracle {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
    max_turns: u32,
    result_max_items: usize,
    result_max_words: usize,
}

#[derive(Debug, Serialize)]
struct CapabilitySummary<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct TranscriptEntry {
    name: String,
    args: Value,
    result: String,
}

#[derive(Debug, Serialize)]
struct WorkerTurnRequest<'a> {
    task: &'a WorkerTask,
    capabilities: Vec<CapabilitySummary<'a>>,
    transcript: &'a [TranscriptEntry],
    results: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WorkerTurn {
    Invoke {
        name: String,
        #[serde(default)]
        args: Value,
    },
    Final {
        #[serde(default)]
        text: Option<String>,
    },
}

impl CommandWorkerOracle {
    pub fn from_config(oracle: &OracleConfig, compression: &CompressionConfig) -> Self {
        Self {
            command: oracle.worker_command.clone(),
            timeout: oracle.timeout(),
            output_limit_bytes: oracle.output_limit_bytes,
            max_turns: oracle.worker_max_turns,
            result_max_items: compression.result_max_items,
            result_max_words: compression.result_max_words,
        }
    }

    /// Pack the most recent results, newest last.
    fn pack_results(&self, transcript: &[TranscriptEntry]) -> String {
        let start = transcript.len().saturating_sub(self.result_max_items);
        let recent: Vec<&str> = transcript[start..]
            .iter()
            .map(|entry| entry.result.as_str())
            .collect();
        compress_results(&recent, self.result_max_items, self.result_max_words)
    }
}

impl WorkerOracle for CommandWorkerOracle {
    #[instrument(skip_all, fields(todo_id = %task.todo_id, capabilities = capabilities.len()))]
    fn run(&self, task: &WorkerTask, capabilities: &[CapabilityHandle]) -> Result<Option<String>> {
        let mut transcript: Vec<TranscriptEntry> = Vec::new();
        for turn in 1..=self.max_turns {
            let request = WorkerTurnRequest {
                task,
                capabilities: capabilities
                    .iter()
                    .map(|handle| CapabilitySummary {
                        name: handle.name(),
                        description: handle.description(),
                    })
                    .collect(),
                transcript: &transcript,
                results: self.pack_results(&transcript),
            };
            let reply: WorkerTurn = exchange_json(
                "worker oracle",
                &self.command,
                &request,
                self.timeout,
                self.output_limit_bytes,
            )
            .with_context(|| format!("worker turn {turn}"))?;

            match reply {
                WorkerTurn::Final { text } => {
                    info!(turn, "worker finished");
                    return Ok(text.filter(|text| !text.trim().is_empty()));
                }
                WorkerTurn::Invoke { name, args } => {
                    let result = match capabilities.iter().find(|handle| handle.name() == name) {
                        Some(handle) => handle.invoke(&args),
                        None => {
                            warn!(capability = %name, "worker requested unscoped capability");
                            format!("Error: capability '{name}' is not available to this worker")
                        }
                    };
                    debug!(turn, capability = %name, "worker capability call");
                    transcript.push(TranscriptEntry { name, args, result });
                }
            }
        }
        warn!(max_turns = self.max_turns, "worker exceeded turn limit");
        Ok(Some(format!(
            "Error: worker exceeded {} turns without a final result",
            self.max_turns
        )))
    }
}

/// Send `request` as JSON on stdin and parse stdout as `T`.
fn exchange_json<Req: Serialize, T: DeserializeOwned>(
    label: &str,
    argv: &[String],
    request: &Req,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<T> {
    if argv.is_empty() {
        return Err(anyhow!("{label} command is not configured"));
    }
    let payload = serde_json::to_vec(request).with_context(|| format!("serialize {label} input"))?;
    let cmd = command_from_argv(argv, &[])?;
    let output = run_command_with_timeout(cmd, Some(&payload), timeout, output_limit_bytes)
        .with_context(|| format!("run {label}"))?;
    output.ensure_success(label, timeout)?;
    if output.stdout_truncated > 0 {
        return Err(anyhow!(
            "{label} output exceeded {output_limit_bytes} bytes"
        ));
    }
    serde_json::from_slice(&output.stdout).with_context(|| format!("parse {label} output"))
}
