use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::verification::validate_final_output;

/// Deterministic quality signals for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub valid_output: bool,
    pub validation_errors: Vec<String>,
    /// Share of objective terms (longer than 3 chars) echoed in the output.
    pub objective_coverage: f64,
    pub artifact_count: usize,
}

pub fn evaluate_run(
    objective: &str,
    final_output: Option<&str>,
    artifacts: &BTreeMap<String, String>,
) -> Evaluation {
    let verification = validate_final_output(final_output);
    let objective_terms: BTreeSet<String> = objective
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .map(str::to_lowercase)
        .collect();
    let output_terms: BTreeSet<String> = final_output
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    let overlap = objective_terms.intersection(&output_terms).count();
    let coverage = overlap as f64 / objective_terms.len().max(1) as f64;

    Evaluation {
        valid_output: verification.is_valid,
        validation_errors: verification.errors,
        objective_coverage: round3(coverage),
        artifact_count: artifacts.len(),
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
