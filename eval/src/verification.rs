use serde::{Deserialize, Serialize};

const MIN_WORDS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Structural checks on a run's final answer. A missing answer is treated
/// as empty.
pub fn validate_final_output(final_output: Option<&str>) -> Verification {
    let text = final_output.unwrap_or_default().trim();
    let mut errors = Vec::new();
    if text.is_empty() {
        errors.push("final_output is empty".to_string());
    }
    if text.split_whitespace().count() < MIN_WORDS {
        errors.push("final_output is too short".to_string());
    }
    Verification {
        is_valid: errors.is_empty(),
        errors,
    }
}
