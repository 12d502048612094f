//! Deterministic, pure logic shared by the supervisor.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod budget;
pub mod compression;
pub mod invariants;
pub mod plan;
pub mod state_update;
pub mod types;
