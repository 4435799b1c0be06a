//! Domain error model.

use thiserror::Error;

/// Result type used across the decision engine.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a deterministic decision failure. None of them is ever
/// raised after a partial mutation: an operation that returns an error left
/// its inputs exactly as they were.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An action targeted an approval that already reached a terminal state,
    /// or repeated an action that was already recorded.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An action targeted an approval level that is not the current one.
    #[error("out of sequence: expected level {expected}, got level {actual}")]
    OutOfSequence { expected: u32, actual: u32 },

    /// The acting principal does not hold the role the level requires.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Optimistic concurrency check failed (stale version).
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    /// A required order/rule field was missing or not well-formed.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested record was not found.
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn out_of_sequence(expected: u32, actual: u32) -> Self {
        Self::OutOfSequence { expected, actual }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn concurrent_modification(msg: impl Into<String>) -> Self {
        Self::ConcurrentModification(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Stable, machine-readable error kind (for logs and caller-side mapping).
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::InvalidState(_) => "invalid_state",
            DomainError::OutOfSequence { .. } => "out_of_sequence",
            DomainError::Unauthorized(_) => "unauthorized",
            DomainError::ConcurrentModification(_) => "concurrent_modification",
            DomainError::MalformedInput(_) => "malformed_input",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound => "not_found",
        }
    }
}
