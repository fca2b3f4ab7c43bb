//! Error types for parley-core.

use thiserror::Error;

use crate::domain::{IssueId, Value};

/// Errors that can occur when building or evaluating negotiation domains.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The domain description is malformed.
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    /// An outcome or evaluation refers to an issue the domain does not have.
    #[error("unknown issue: {0}")]
    UnknownIssue(IssueId),

    /// An outcome or evaluation refers to a value the issue does not have.
    #[error("unknown value {value} for issue {issue}")]
    UnknownValue {
        /// Issue the value was looked up in.
        issue: IssueId,
        /// The offending value.
        value: Value,
    },

    /// An outcome does not assign a value to every issue.
    #[error("outcome is missing issue {0}")]
    MissingIssue(IssueId),

    /// Utility weights or evaluations are out of range.
    #[error("invalid utility: {0}")]
    InvalidUtility(String),

    /// The outcome space is empty or too large to enumerate.
    #[error("invalid outcome space: {0}")]
    InvalidOutcomeSpace(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
