use thiserror::Error;

/// Store-boundary error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Unique email index violation.
    #[error("email already registered")]
    EmailTaken,

    /// The targeted document does not exist.
    #[error("record not found")]
    NotFound,

    /// Infrastructure failure (lock poisoning, backend unreachable).
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
