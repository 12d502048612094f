//! Shared deterministic types for a supervised run.
//!
//! These types define stable contracts between the loop, the dispatcher and
//! the oracles. They serialize to the JSON exchanged with external commands,
//! so field names and tags must remain stable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle of a todo item: `pending -> in_progress -> done`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Done,
}

/// A unit of decomposed work.
///
/// Created or replaced wholesale by plan updates; only `status` and `result`
/// are mutated afterwards, by dispatch bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub status: TodoStatus,
    #[serde(default)]
    pub result: Option<String>,
}

impl TodoItem {
    pub fn pending(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: TodoStatus::Pending,
            result: None,
        }
    }
}

/// Append-only record of one completed dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubagentLog {
    pub todo_id: String,
    pub prompt: String,
    pub capabilities_used: Vec<String>,
    pub result: String,
    pub tokens_used: u64,
}

/// Run-wide token accounting. `total_used` never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    pub total_used: u64,
    pub per_subagent_limit: u64,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            total_used: 0,
            per_subagent_limit: 4096,
        }
    }
}

/// Author of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Supervisor,
    Tool,
}

/// One entry of the ordered message/event history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Action that produced a tool message (`plan_update`, `dispatch`, or a
    /// capability name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Message {
    pub fn supervisor(content: impl Into<String>) -> Self {
        Self {
            role: Role::Supervisor,
            content: content.into(),
            source: None,
        }
    }

    pub fn tool(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            source: Some(source.into()),
        }
    }
}

/// Typed action emitted by the decision oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Replace the todo list. The payload stays raw so that a malformed plan
    /// can be dropped without rejecting the whole decision.
    PlanUpdate {
        #[serde(default)]
        items: Value,
    },
    /// Delegate a todo item to a scoped worker.
    Dispatch {
        todo_id: String,
        description: String,
        #[serde(default)]
        capabilities: Vec<String>,
        #[serde(default)]
        context: String,
    },
    /// Invoke a shared capability directly from the supervisor.
    CapabilityInvoke {
        name: String,
        #[serde(default)]
        args: Value,
    },
}

impl Action {
    pub fn kind(&self) -> &str {
        match self {
            Action::PlanUpdate { .. } => "plan_update",
            Action::Dispatch { .. } => "dispatch",
            Action::CapabilityInvoke { name, .. } => name,
        }
    }
}

/// Response of the decision oracle for one tick.
///
/// Zero actions means the run is complete and `text` is the final answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub text: String,
}

impl Decision {
    pub fn finish(text: impl Into<String>) -> Self {
        Self {
            actions: Vec::new(),
            text: text.into(),
        }
    }

    pub fn act(actions: Vec<Action>) -> Self {
        Self {
            actions,
            text: String::new(),
        }
    }
}

/// Context handed to the decision oracle on each tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionContext {
    pub objective: String,
    pub messages: Vec<Message>,
    /// Present only when the plan is non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo: Option<Vec<TodoItem>>,
}

/// Aggregate state of one run.
///
/// Terminal once `final_output` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub objective: String,
    pub todo: Vec<TodoItem>,
    pub artifacts: BTreeMap<String, String>,
    pub subagent_logs: Vec<SubagentLog>,
    pub token_usage: TokenBudget,
    pub final_output: Option<String>,
    pub messages: Vec<Message>,
}

impl RunState {
    pub fn new(objective: impl Into<String>, per_subagent_limit: u64) -> Self {
        Self {
            objective: objective.into(),
            todo: Vec::new(),
            artifacts: BTreeMap::new(),
            subagent_logs: Vec::new(),
            token_usage: TokenBudget {
                total_used: 0,
                per_subagent_limit,
            },
            final_output: None,
            messages: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.final_output.is_some()
    }

    pub fn todo_item(&self, id: &str) -> Option<&TodoItem> {
        self.todo.iter().find(|item| item.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn actions_parse_from_tagged_json() {
        let decision: Decision = serde_json::from_value(json!({
            "actions": [
                {"type": "plan_update", "items": [{"id": "t1", "description": "search"}]},
                {"type": "dispatch", "todo_id": "t1", "description": "search", "capabilities": ["search_internet"]},
                {"type": "capability_invoke", "name": "read_file", "args": {"path": "a"}}
            ],
            "text": ""
        }))
        .expect("parse decision");

        assert_eq!(decision.actions.len(), 3);
        assert_eq!(decision.actions[0].kind(), "plan_update");
        assert!(matches!(
            &decision.actions[1],
            Action::Dispatch { context, .. } if context.is_empty()
        ));
        assert_eq!(decision.actions[2].kind(), "read_file");
    }

    #[test]
    fn empty_todo_is_omitted_from_decision_context() {
        let context = DecisionContext {
            objective: "goal".to_string(),
            messages: Vec::new(),
            todo: None,
        };
        let value = serde_json::to_value(&context).expect("serialize");
        assert!(value.get("todo").is_none());
    }

    #[test]
    fn new_run_state_starts_empty_and_running() {
        let state = RunState::new("Learn about Python", 4096);
        assert!(!state.is_done());
        assert!(state.todo.is_empty());
        assert!(state.subagent_logs.is_empty());
        assert_eq!(state.token_usage.total_used, 0);
        assert_eq!(state.token_usage.per_subagent_limit, 4096);
    }
}
