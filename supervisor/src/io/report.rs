//! JSON report of a finished run, consumed by the `eval` binary.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::types::RunState;
use crate::looping::{LoopOutcome, LoopStop};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub objective: String,
    pub stop: LoopStop,
    pub ticks: u32,
    pub state: RunState,
}

impl RunReport {
    pub fn from_outcome(outcome: &LoopOutcome) -> Self {
        Self {
            objective: outcome.state.objective.clone(),
            stop: outcome.stop,
            ticks: outcome.ticks,
            state: outcome.state.clone(),
        }
    }
}

pub fn load_report(path: &Path) -> Result<RunReport> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Atomically write `report` as pretty JSON.
pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(report).context("serialize run report")?;
    buf.push('\n');
    crate::io::write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{SubagentLog, TodoItem, TodoStatus};

    /// Verifies write → load preserves the full run state.
    #[test]
    fn report_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("reports/run.json");

        let mut state = RunState::new("Learn about Python", 4096);
        let mut item = TodoItem::pending("t1", "search");
        item.status = TodoStatus::Done;
        item.result = Some("Python is great".to_string());
        state.todo.push(item);
        state.subagent_logs.push(SubagentLog {
            todo_id: "t1".to_string(),
            prompt: "search".to_string(),
            capabilities_used: vec!["search_internet".to_string()],
            result: "Python is great".to_string(),
            tokens_used: 4,
        });
        state.final_output = Some("All done!".to_string());

        let report = RunReport::from_outcome(&LoopOutcome {
            ticks: 2,
            stop: LoopStop::Complete,
            state,
        });
        write_report(&path, &report).expect("write");
        assert_eq!(load_report(&path).expect("load"), report);
    }

    #[test]
    fn stop_serializes_in_snake_case() {
        let value = serde_json::to_value(LoopStop::IterationLimit).expect("serialize");
        assert_eq!(value, serde_json::json!("iteration_limit"));
    }
}
