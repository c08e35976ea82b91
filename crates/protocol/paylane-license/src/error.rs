//! Error types for the licensing engine.

use paylane_store::StoreError;
use paylane_types::{Amount, ErrorCategory, ErrorCode, Fingerprint, Identity};
use thiserror::Error;

/// Result type for licensing operations.
pub type LicenseResult<T> = std::result::Result<T, LicenseError>;

/// Errors that can occur in the licensing engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LicenseError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// Price is below the minimum.
    #[error("invalid price: {0}")]
    InvalidPrice(Amount),

    /// Locator URI is empty or too long.
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    /// Owner, holder or caller identity is empty.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// License recorded without a transfer reference.
    #[error("missing transfer reference")]
    MissingTransferRef,

    /// Fingerprint already registered.
    #[error("content already registered: {0}")]
    AlreadyRegistered(Fingerprint),

    /// Content is disabled.
    #[error("content inactive: {0}")]
    Inactive(Fingerprint),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    /// Caller does not own the content.
    #[error("{caller} is not the owner of {fingerprint}")]
    NotOwner {
        /// Content being changed.
        fingerprint: Fingerprint,
        /// Who tried.
        caller: Identity,
    },

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// Fingerprint not registered.
    #[error("content not found: {0}")]
    NotFound(Fingerprint),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Revenue or access counter would overflow.
    #[error("counter overflow on {0}")]
    Overflow(Fingerprint),

    /// Ledger lock poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// A remote licensing engine could not be reached.
    #[error("licensing engine unavailable: {0}")]
    Unavailable(String),

    /// Storage error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl LicenseError {
    /// Create an invalid uri error.
    pub fn invalid_uri(msg: impl Into<String>) -> Self {
        Self::InvalidUri(msg.into())
    }

    /// Create an invalid identity error.
    pub fn invalid_identity(msg: impl Into<String>) -> Self {
        Self::InvalidIdentity(msg.into())
    }

    /// Create a lock poisoned error.
    pub fn lock_poisoned(msg: impl Into<String>) -> Self {
        Self::LockPoisoned(msg.into())
    }

    /// Get the protocol error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidPrice(_) => ErrorCode::InvalidPrice,
            Self::InvalidUri(_) => ErrorCode::InvalidUri,
            Self::InvalidIdentity(_) | Self::MissingTransferRef => ErrorCode::InvalidIdentity,
            Self::AlreadyRegistered(_) => ErrorCode::AlreadyRegistered,
            Self::Inactive(_) => ErrorCode::ContentInactive,
            Self::NotOwner { .. } => ErrorCode::NotOwner,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Store(e) => e.error_code(),
            Self::Overflow(_) | Self::LockPoisoned(_) | Self::Unavailable(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// Taxonomy bucket for this error.
    pub fn category(&self) -> ErrorCategory {
        self.error_code().category()
    }

    /// True if the caller asked for something that does not exist.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Get a user-friendly suggestion for recovering from this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MissingTransferRef => {
                Some("Licenses are only recorded for confirmed transfers. Pass the rail reference.")
            }
            Self::Store(e) => e.suggestion(),
            other => other.error_code().suggestion(),
        }
    }
}
