use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use supervisor::io::report::{RunReport, load_report};

use crate::evaluate::{Evaluation, evaluate_run};
use crate::metrics::MetricCollector;
use crate::outcome::{Outcome, classify_outcome};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRun {
    pub objective: String,
    pub outcome: Outcome,
    pub ticks: u32,
    pub evaluation: Evaluation,
}

pub fn score_report(report: &RunReport) -> ScoredRun {
    let evaluation = evaluate_run(
        &report.objective,
        report.state.final_output.as_deref(),
        &report.state.artifacts,
    );
    ScoredRun {
        objective: report.objective.clone(),
        outcome: classify_outcome(report.stop, &evaluation),
        ticks: report.ticks,
        evaluation,
    }
}

/// `*.json` files directly under `dir`, sorted.
pub fn load_report_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry.context("read entry")?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Fold every report under `dir` into counters. Unreadable reports are
/// skipped and described in the returned warnings.
pub fn aggregate(dir: &Path) -> Result<(MetricCollector, Vec<String>)> {
    let mut metrics = MetricCollector::new();
    let mut warnings = Vec::new();

    for path in load_report_paths(dir)? {
        let report = match load_report(&path) {
            Ok(report) => report,
            Err(err) => {
                warnings.push(format!("skip {}: invalid report ({err:#})", path.display()));
                continue;
            }
        };
        let scored = score_report(&report);

        metrics.inc("runs", 1);
        metrics.inc(scored.outcome.as_str(), 1);
        metrics.inc("ticks", u64::from(report.ticks));
        metrics.inc("dispatches", report.state.subagent_logs.len() as u64);
        metrics.inc("tokens_used", report.state.token_usage.total_used);
        metrics.inc("artifacts", scored.evaluation.artifact_count as u64);
    }

    Ok((metrics, warnings))
}
