//! Error types for the storage layer.

use paylane_types::{ErrorCode, Fingerprint};
use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error while preparing the data directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Content with this fingerprint is already stored.
    #[error("Content already exists: {0}")]
    AlreadyExists(Fingerprint),

    /// Content not found in store.
    #[error("Content not found: {0}")]
    ContentNotFound(Fingerprint),

    /// Schema initialization error.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A stored row could not be decoded.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Lock poisoning error.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        StoreError::Schema(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        StoreError::InvalidData(msg.into())
    }

    /// Create a lock poisoned error.
    pub fn lock_poisoned(msg: impl Into<String>) -> Self {
        StoreError::LockPoisoned(msg.into())
    }

    /// Map to a protocol error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            StoreError::AlreadyExists(_) => ErrorCode::AlreadyRegistered,
            StoreError::ContentNotFound(_) => ErrorCode::NotFound,
            _ => ErrorCode::InternalError,
        }
    }

    /// Get a user-friendly suggestion for this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::Io(_) => Some("Check that the data directory is writable."),
            StoreError::Database(_) | StoreError::Schema(_) => {
                Some("The ledger database may be corrupt or locked by another process.")
            }
            other => other.error_code().suggestion(),
        }
    }
}
