//! Stable exit codes for supervisor CLI commands.

/// Command succeeded; for `run`, the objective completed.
pub const OK: i32 = 0;
/// Invalid configuration or command-line usage.
pub const INVALID: i32 = 1;
/// `run` hit `max_iterations` without a final answer.
pub const ITERATION_LIMIT: i32 = 2;
/// `run` aborted: unknown capability, decision oracle failure, or other errors.
pub const ABORTED: i32 = 3;
