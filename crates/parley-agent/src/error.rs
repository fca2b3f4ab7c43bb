//! Error types for parley-agent.

use parley_core::CoreError;
use thiserror::Error;

/// Errors that can occur while running a negotiation session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    /// A strategy parameter is missing or out of range.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An outcome refers to an issue or value the opponent model does not know.
    #[error("evaluation lookup failed: {0}")]
    EvaluationLookup(String),

    /// A component was handed input it cannot work with.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// The runtime supplied an unusable negotiation time.
    #[error("invalid negotiation time: {0}")]
    InvalidTime(f64),

    /// The session has already ended in agreement or was aborted.
    #[error("negotiation session is closed")]
    SessionClosed,

    /// Domain or utility error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AgentError {
    /// Returns true if this error must end the session.
    ///
    /// Lookup failures are recovered locally by skipping the affected
    /// contribution; everything else aborts.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::EvaluationLookup(_))
    }
}
