//! Error taxonomy for a supervised run.
//!
//! Capability handlers never surface these: their failures are folded into
//! result strings at the capability boundary. What remains here is either
//! recoverable by the caller (`BudgetExceeded`, `NotFound`) or fatal to the
//! run (`Configuration`, `UnknownCapability`).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    /// Required setup is missing or invalid. Raised before any tick runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A dispatch would need more budget units than the allocator holds.
    #[error("required {required} tokens exceeds budget of {available}")]
    BudgetExceeded { required: u64, available: u64 },

    /// A plan or dispatch named a capability the registry does not know.
    #[error("unknown capability '{0}'")]
    UnknownCapability(String),

    /// Artifact store miss.
    #[error("file '{0}' not found")]
    NotFound(String),
}

impl SupervisorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
