//! Loop-owned state transitions for a run.
//!
//! Only these functions mutate todo `status`/`result`, the subagent log and
//! the token counter, so the bookkeeping rules live in one place.

use crate::core::types::{RunState, SubagentLog, TodoStatus};

/// Mark `todo_id` as in progress. Returns `false` when the id is not planned.
pub fn mark_in_progress(state: &mut RunState, todo_id: &str) -> bool {
    match state.todo.iter_mut().find(|item| item.id == todo_id) {
        Some(item) => {
            item.status = TodoStatus::InProgress;
            true
        }
        None => false,
    }
}

/// Record a completed dispatch:
/// - the matching todo item becomes `done` with its `result` set
/// - exactly one log entry is appended
/// - `total_used` grows by exactly the entry's `tokens_used`
///
/// Fails without touching `state` when the todo id is not in the plan.
pub fn record_dispatch(state: &mut RunState, log: SubagentLog) -> Result<(), String> {
    let item = state
        .todo
        .iter_mut()
        .find(|item| item.id == log.todo_id)
        .ok_or_else(|| format!("todo '{}' not found in plan", log.todo_id))?;

    item.status = TodoStatus::Done;
    item.result = Some(log.result.clone());
    state.token_usage.total_used = state.token_usage.total_used.saturating_add(log.tokens_used);
    state.subagent_logs.push(log);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TodoItem;

    fn state_with(items: Vec<TodoItem>) -> RunState {
        let mut state = RunState::new("objective", 4096);
        state.todo = items;
        state
    }

    fn log(todo_id: &str, tokens_used: u64) -> SubagentLog {
        SubagentLog {
            todo_id: todo_id.to_string(),
            prompt: "search".to_string(),
            capabilities_used: vec!["search_internet".to_string()],
            result: "found".to_string(),
            tokens_used,
        }
    }

    #[test]
    fn record_dispatch_updates_item_log_and_tokens() {
        let mut state = state_with(vec![
            TodoItem::pending("t1", "search"),
            TodoItem::pending("t2", "write"),
        ]);
        state.token_usage.total_used = 7;

        record_dispatch(&mut state, log("t1", 12)).expect("record");

        let item = state.todo_item("t1").expect("t1");
        assert_eq!(item.status, TodoStatus::Done);
        assert_eq!(item.result.as_deref(), Some("found"));
        assert_eq!(state.todo_item("t2").expect("t2").status, TodoStatus::Pending);
        assert_eq!(state.subagent_logs.len(), 1);
        assert_eq!(state.subagent_logs[0].todo_id, "t1");
        assert_eq!(state.token_usage.total_used, 19);
    }

    #[test]
    fn record_dispatch_for_unplanned_id_leaves_state_untouched() {
        let mut state = state_with(vec![TodoItem::pending("t1", "search")]);
        let before = state.clone();

        let err = record_dispatch(&mut state, log("ghost", 5)).expect_err("missing");
        assert!(err.contains("ghost"));
        assert_eq!(state, before);
    }

    #[test]
    fn mark_in_progress_only_touches_planned_items() {
        let mut state = state_with(vec![TodoItem::pending("t1", "search")]);
        assert!(mark_in_progress(&mut state, "t1"));
        assert!(!mark_in_progress(&mut state, "t9"));
        assert_eq!(
            state.todo_item("t1").expect("t1").status,
            TodoStatus::InProgress
        );
    }
}
