//! Error types for payment orchestration.

use thiserror::Error;

use paylane_license::LicenseError;
use paylane_store::StoreError;
use paylane_types::{ErrorCode, Fingerprint};

use crate::guard::BudgetError;

/// Result type for orchestrator operations.
pub type OpsResult<T> = std::result::Result<T, OpsError>;

/// Errors that abort an orchestrator call as a whole.
///
/// Per-item failures in sequential and parallel settlement are reported in
/// the [`PurchaseResult`](crate::PurchaseResult), not here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpsError {
    /// Budget refused the request. No transfer was attempted.
    #[error("budget exceeded: {0}")]
    Budget(#[from] BudgetError),

    /// More fingerprints than one call may carry.
    #[error("too many items: {count} (max {max})")]
    TooManyItems {
        /// Distinct fingerprints requested.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Price lookup failed for a fingerprint.
    #[error("content not found: {0}")]
    ContentNotFound(Fingerprint),

    /// Content exists but is not for sale.
    #[error("content inactive: {0}")]
    ContentInactive(Fingerprint),

    /// Atomic batch rejected as a whole. Nothing was recorded.
    #[error("batch failed: {reason}")]
    BatchFailed {
        /// Rail-provided reason.
        reason: String,
        /// Code of the underlying rail failure.
        code: ErrorCode,
    },

    /// Licensing engine error outside of per-item handling.
    #[error("licensing error: {0}")]
    Licensing(#[from] LicenseError),

    /// Purchase log error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Malformed request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal lock poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl OpsError {
    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a lock poisoned error.
    pub fn lock_poisoned(msg: impl Into<String>) -> Self {
        Self::LockPoisoned(msg.into())
    }

    /// Map to a protocol error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Budget(e) => e.error_code(),
            Self::TooManyItems { .. } => ErrorCode::TooManyItems,
            Self::ContentNotFound(_) => ErrorCode::NotFound,
            Self::ContentInactive(_) => ErrorCode::ContentInactive,
            Self::BatchFailed { .. } => ErrorCode::BatchFailed,
            Self::Licensing(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::LockPoisoned(_) => ErrorCode::InternalError,
        }
    }

    /// True for budget refusals.
    pub fn is_budget(&self) -> bool {
        matches!(self, Self::Budget(_))
    }

    /// Hint for the user.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Licensing(e) => e.suggestion(),
            Self::Store(e) => e.suggestion(),
            Self::BatchFailed { .. } => {
                Some("No item was charged. Retry with --strategy sequential to isolate the failing item.")
            }
            _ => self.error_code().suggestion(),
        }
    }
}
