//! Error taxonomy shared by every domain crate.

use thiserror::Error;

/// Shorthand for fallible domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic business failures: validation, illegal transitions,
/// ownership. Infrastructure failures do not belong here; in particular,
/// external accounting sync failures never surface through this type to a
/// transition caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (malformed pincode, empty item list,
    /// past delivery date, ...).
    #[error("invalid: {0}")]
    Validation(String),

    /// A transition is not legal from the order's current status, or an
    /// actor lacks the role/ownership for it. Carries the current status so
    /// callers can report what state the order is actually in.
    #[error("state conflict (current status: {current}): {message}")]
    StateConflict { current: String, message: String },

    /// An identifier failed to parse.
    #[error("bad identifier: {0}")]
    InvalidId(String),

    /// The requested record does not exist, or the caller may not see it.
    #[error("not found")]
    NotFound,

    /// Authorization failure. Deliberately carries no state information so
    /// an unauthorized actor learns nothing about the order.
    #[error("unauthorized")]
    Unauthorized,

    /// A stale write was rejected by optimistic versioning.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed persisted data or a broken internal invariant. Processing
    /// of the affected record halts rather than guessing.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn state_conflict(current: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StateConflict {
            current: current.into(),
            message: message.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
