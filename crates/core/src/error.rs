//! Errors produced by domain rules.

use thiserror::Error;

/// Result alias for fallible domain constructors and transitions.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic failure of a business rule.
///
/// Only pure rule violations surface here; storage and transport failures
/// carry their own error types closer to where they occur.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input rejected by a validation rule.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
