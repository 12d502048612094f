//! Supervised task orchestration.
//!
//! An objective is decomposed into a todo list, each item is delegated to a
//! scoped worker under a token budget, and worker results are merged back
//! into the run state until the decision oracle declares the objective done.
//!
//! - **[`core`]**: Pure, deterministic logic (data model, budget admission,
//!   compression, plan parsing, state reducers). No I/O.
//! - **[`io`]**: Side-effecting operations (configuration, child processes,
//!   prompt rendering, command-backed oracles, run reports).
//!
//! [`tick`] holds the orchestration loop, [`dispatch`] the worker
//! dispatcher and [`looping`] the run driver. [`capabilities`] and
//! [`artifacts`] provide what workers act on.

pub mod artifacts;
pub mod capabilities;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tick;
