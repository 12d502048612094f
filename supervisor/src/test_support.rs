//! Test-only oracles and capabilities that never spawn processes.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::capabilities::{Capability, CapabilityHandle};
use crate::core::types::{Decision, DecisionContext};
use crate::io::oracle::{DecisionOracle, WorkerOracle, WorkerTask};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decision oracle that replays a fixed sequence of decisions and records
/// every context it was shown. Running past the script is an error.
#[derive(Debug, Default)]
pub struct ScriptedDecisionOracle {
    decisions: Mutex<VecDeque<Decision>>,
    seen: Mutex<Vec<DecisionContext>>,
}

impl ScriptedDecisionOracle {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Oracle that keeps acting forever; useful for iteration ceilings.
    pub fn repeating(decision: &Decision, times: usize) -> Self {
        Self::new(std::iter::repeat_n(decision.clone(), times))
    }

    pub fn contexts(&self) -> Vec<DecisionContext> {
        lock(&self.seen).clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.decisions).len()
    }
}

impl DecisionOracle for ScriptedDecisionOracle {
    fn decide(&self, context: &DecisionContext) -> Result<Decision> {
        lock(&self.seen).push(context.clone());
        lock(&self.decisions)
            .pop_front()
            .ok_or_else(|| anyhow!("scripted decision oracle exhausted"))
    }
}

/// One scripted worker behaviour.
#[derive(Debug, Clone)]
pub enum WorkerReply {
    /// Finish immediately with this text (or no output).
    Text(Option<String>),
    /// Invoke a scoped capability by name, then finish with its result.
    Relay { capability: String, args: Value },
    /// Fail the worker.
    Fail(String),
}

/// What a scripted worker was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCall {
    pub task: WorkerTask,
    pub capabilities: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ScriptedWorker {
    replies: Mutex<VecDeque<WorkerReply>>,
    calls: Mutex<Vec<WorkerCall>>,
}

impl ScriptedWorker {
    pub fn new(replies: impl IntoIterator<Item = WorkerReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Worker that answers each dispatch with the next text.
    pub fn returning<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            texts
                .into_iter()
                .map(|text| WorkerReply::Text(Some(text.into()))),
        )
    }

    pub fn calls(&self) -> Vec<WorkerCall> {
        lock(&self.calls).clone()
    }
}

impl WorkerOracle for ScriptedWorker {
    fn run(&self, task: &WorkerTask, capabilities: &[CapabilityHandle]) -> Result<Option<String>> {
        lock(&self.calls).push(WorkerCall {
            task: task.clone(),
            capabilities: capabilities.iter().map(|c| c.name().to_string()).collect(),
        });
        let reply = lock(&self.replies)
            .pop_front()
            .ok_or_else(|| anyhow!("scripted worker exhausted"))?;
        match reply {
            WorkerReply::Text(text) => Ok(text),
            WorkerReply::Relay { capability, args } => {
                let handle = capabilities
                    .iter()
                    .find(|handle| handle.name() == capability)
                    .ok_or_else(|| anyhow!("capability '{capability}' not in scope"))?;
                Ok(Some(handle.invoke(&args)))
            }
            WorkerReply::Fail(message) => Err(anyhow!(message)),
        }
    }
}

/// Capability that returns a fixed response and records its arguments.
#[derive(Debug)]
pub struct RecordingCapability {
    name: String,
    response: String,
    calls: Mutex<Vec<Value>>,
}

impl RecordingCapability {
    pub fn new(name: &str, response: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            response: response.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Value> {
        lock(&self.calls).clone()
    }
}

impl Capability for RecordingCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Test capability."
    }

    fn invoke(&self, args: &Value) -> String {
        lock(&self.calls).push(args.clone());
        self.response.clone()
    }
}
