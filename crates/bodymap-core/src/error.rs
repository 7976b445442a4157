//! Error types shared across the core.

use crate::image_cache::ImageLoadError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors raised synchronously by session mutators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Malformed or out-of-range input.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Point index outside `[0, len)`.
    #[error("Index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Tagged error for callers that need a single type to dispatch on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Load failure: {0}")]
    LoadFailure(String),
    #[error("Save failure: {0}")]
    SaveFailure(String),
}

impl Error {
    /// Load and save failures can be retried; validation errors cannot.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::LoadFailure(_) | Error::SaveFailure(_))
    }
}

impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(msg) => Error::Validation(msg),
            SessionError::IndexOutOfRange { index, len } => Error::IndexOutOfRange { index, len },
        }
    }
}

impl From<ImageLoadError> for Error {
    fn from(err: ImageLoadError) -> Self {
        Error::LoadFailure(err.to_string())
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Rejected(msg) => Error::Validation(msg),
            other => Error::SaveFailure(other.to_string()),
        }
    }
}
