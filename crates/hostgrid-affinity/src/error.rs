//! Affinity evaluator error types.
//!
//! Only configuration problems are errors here. A host failing a constraint
//! is a routine `Reject` verdict, never an `Err` — callers treat rejects as
//! control flow and errors as bad requests. Nothing at this layer is fatal:
//! a malformed hint fails the current request's evaluation and nothing else.

use thiserror::Error;

/// Result type alias for filter evaluation.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while evaluating placement constraints.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid affinity host ip {value:?}: {reason}")]
    InvalidAffinityIp { value: String, reason: String },

    #[error("invalid cidr suffix {value:?}: {reason}")]
    InvalidCidr { value: String, reason: String },

    #[error("unknown filter name: {0}")]
    UnknownFilter(String),
}
