//! Run driver: tick until the run finishes or the iteration ceiling is hit.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::types::RunState;
use crate::io::oracle::{DecisionOracle, WorkerOracle};
use crate::tick::Supervisor;

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStop {
    /// The decision oracle returned no actions; `final_output` is set.
    Complete,
    /// `max_iterations` ticks ran without the run finishing.
    IterationLimit,
}

/// Summary of a driver invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub ticks: u32,
    pub stop: LoopStop,
    pub state: RunState,
}

/// Tick `state` until it is DONE or `max_iterations` ticks have run.
///
/// No tick is issued for a state that is already DONE. Any tick error stops
/// the loop immediately and is returned unchanged.
pub fn run_loop<D, W, F>(
    supervisor: &mut Supervisor<D, W>,
    mut state: RunState,
    max_iterations: u32,
    mut on_tick: F,
) -> Result<LoopOutcome>
where
    D: DecisionOracle,
    W: WorkerOracle,
    F: FnMut(u32, &RunState),
{
    let mut ticks = 0u32;
    loop {
        if state.is_done() {
            info!(ticks, "run complete");
            return Ok(LoopOutcome {
                ticks,
                stop: LoopStop::Complete,
                state,
            });
        }
        if ticks >= max_iterations {
            warn!(max_iterations, "iteration limit reached");
            return Ok(LoopOutcome {
                ticks,
                stop: LoopStop::IterationLimit,
                state,
            });
        }
        state = supervisor.tick(state)?;
        ticks += 1;
        on_tick(ticks, &state);
    }
}
