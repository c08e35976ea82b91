//! Error types for the payment rail.

use paylane_types::{Amount, ErrorCode};
use thiserror::Error;

/// Result type alias for rail operations.
pub type RailResult<T> = Result<T, RailError>;

/// Errors returned by a payment rail.
#[derive(Debug, Error)]
pub enum RailError {
    /// Sender balance does not cover the transfer.
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Available balance
        have: Amount,
        /// Required balance
        need: Amount,
    },

    /// The rail refused the transfer or batch.
    #[error("transfer rejected: {0}")]
    Rejected(String),

    /// Transport failure. The transfer outcome is unknown.
    #[error("network error: {0}")]
    Network(String),

    /// The rail accepted the submission but did not confirm it.
    #[error("transfer not confirmed: {0}")]
    Unconfirmed(String),

    /// Empty batch submitted.
    #[error("cannot submit empty batch")]
    EmptyBatch,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error (lock poisoning, unexpected state).
    #[error("internal error: {0}")]
    Internal(String),
}

impl RailError {
    /// Create a new InsufficientBalance error.
    pub fn insufficient_balance(have: Amount, need: Amount) -> Self {
        Self::InsufficientBalance { have, need }
    }

    /// Create a new Rejected error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Create a new Network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new Unconfirmed error.
    pub fn unconfirmed(transfer_ref: impl Into<String>) -> Self {
        Self::Unconfirmed(transfer_ref.into())
    }

    /// Create a new Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True if the failure may clear on its own.
    ///
    /// Callers must still not resubmit blindly: a network error can hide a
    /// transfer that went through.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Map to a protocol error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            Self::Network(_) | Self::Config(_) => ErrorCode::RailUnavailable,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::Rejected(_) | Self::Unconfirmed(_) | Self::EmptyBatch => {
                ErrorCode::TransferFailed
            }
        }
    }

    /// Get a user-friendly suggestion for this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        self.error_code().suggestion()
    }
}

impl From<reqwest::Error> for RailError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network(format!("request timed out: {}", e))
        } else if e.is_decode() {
            Self::Rejected(format!("unreadable rail response: {}", e))
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance() {
        let err = RailError::insufficient_balance(100, 200);
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("200"));
        assert_eq!(err.error_code(), ErrorCode::InsufficientBalance);
    }

    #[test]
    fn test_is_transient() {
        assert!(RailError::network("connection reset").is_transient());
        assert!(!RailError::rejected("bad payee").is_transient());
        assert!(!RailError::EmptyBatch.is_transient());
        assert!(!RailError::unconfirmed("0xabc").is_transient());
    }

    #[test]
    fn test_suggestions() {
        assert!(RailError::network("down").suggestion().is_some());
        assert!(RailError::internal("poisoned").suggestion().is_none());
    }
}
