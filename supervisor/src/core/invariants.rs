//! Semantic plan invariants not expressible via JSON Schema.

use std::collections::HashSet;

use crate::core::types::TodoItem;

/// Check invariants of a proposed todo list:
/// - No duplicate ids
/// - Ids are non-blank
///
/// Returns one message per violation, in list order.
pub fn validate_plan_invariants(items: &[TodoItem]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for (idx, item) in items.iter().enumerate() {
        if item.id.trim().is_empty() {
            errors.push(format!("item {idx}: id must not be blank"));
            continue;
        }
        if !seen.insert(item.id.as_str()) {
            errors.push(format!("item {idx}: duplicate id '{}'", item.id));
        }
    }
    errors
}
