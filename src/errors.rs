// Core error taxonomy shared across the bus, blackboard, supervision engine,
// and router. Component APIs return `CortexResult<T>` so callers can match on
// error *kind* (per the propagation policy each component documents), while
// glue/application code is free to wrap these in `anyhow`.

use thiserror::Error;

pub type CortexResult<T> = Result<T, CortexError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CortexError {
    /// Operation attempted on a terminated bus or blackboard.
    #[error("{0} is closed")]
    Closed(&'static str),

    /// Unknown subscription, active tree, or skill.
    #[error("not found: {0}")]
    NotFound(String),

    /// Blackboard insertion that would violate a zone budget under the
    /// reject overflow policy.
    #[error("rejected: {0}")]
    Rejected(String),

    /// A guardian/expander/LLM call exceeded its deadline.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Cancellation propagated from the caller's token.
    #[error("cancelled")]
    Cancelled,

    /// A brain (local or frontier) reports it is not ready.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Empty question, malformed skill entry, or similar caller error.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Programmer error (nil/missing required input) — treated as a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CortexError {
    pub fn not_found(what: impl Into<String>) -> Self {
        CortexError::NotFound(what.into())
    }

    pub fn rejected(why: impl Into<String>) -> Self {
        CortexError::Rejected(why.into())
    }

    pub fn invalid_input(why: impl Into<String>) -> Self {
        CortexError::InvalidInput(why.into())
    }
}
