//! Parsing of plan-update payloads into a todo list.
//!
//! The decision oracle may send the list inline or as a JSON-encoded string.
//! Anything that is not a valid list is reported as malformed; the caller
//! keeps the prior plan.

use anyhow::{Context, Result};
use jsonschema::{Draft, Validator};
use serde_json::Value;

use crate::core::invariants::validate_plan_invariants;
use crate::core::types::TodoItem;

const TODO_LIST_SCHEMA: &str = include_str!("../../schemas/todo_list.schema.json");

/// Compiled todo-list validator (Draft 2020-12).
pub struct PlanParser {
    validator: Validator,
}

impl std::fmt::Debug for PlanParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanParser").finish_non_exhaustive()
    }
}

impl PlanParser {
    pub fn new() -> Result<Self> {
        let schema: Value =
            serde_json::from_str(TODO_LIST_SCHEMA).context("parse todo list schema")?;
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .context("compile todo list schema")?;
        Ok(Self { validator })
    }

    /// Parse `payload` into a todo list, or describe why it is malformed.
    pub fn parse(&self, payload: &Value) -> Result<Vec<TodoItem>, String> {
        let decoded;
        let instance = match payload {
            Value::String(raw) => {
                decoded = serde_json::from_str::<Value>(raw)
                    .map_err(|err| format!("unparseable plan payload: {err}"))?;
                &decoded
            }
            other => other,
        };

        if !instance.is_array() {
            return Err("plan payload is not a list".to_string());
        }

        let messages: Vec<String> = self
            .validator
            .iter_errors(instance)
            .map(|err| err.to_string())
            .collect();
        if !messages.is_empty() {
            return Err(format!("schema validation failed: {}", messages.join("; ")));
        }

        let items: Vec<TodoItem> = serde_json::from_value(instance.clone())
            .map_err(|err| format!("invalid todo item: {err}"))?;
        let errors = validate_plan_invariants(&items);
        if !errors.is_empty() {
            return Err(format!("invariant violations: {}", errors.join("; ")));
        }
        Ok(items)
    }
}
