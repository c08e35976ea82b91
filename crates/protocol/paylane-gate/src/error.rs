//! Error types for the access gateway.

use thiserror::Error;

use paylane_license::LicenseError;
use paylane_types::ErrorCode;

/// Result type for gateway operations.
pub type GateResult<T> = Result<T, GateError>;

/// Errors that prevent the gateway from reaching a decision.
///
/// Unknown content, missing payment and failed proofs are decisions, not
/// errors.
#[derive(Debug, Error)]
pub enum GateError {
    /// The licensing engine could not answer.
    #[error("licensing error: {0}")]
    Licensing(#[from] LicenseError),

    /// Payment instructions could not be encoded.
    #[error("cannot encode payment instructions: {reason}")]
    Encode {
        /// What went wrong
        reason: String,
    },

    /// A payment header could not be decoded.
    #[error("malformed payment header: {reason}")]
    MalformedHeader {
        /// What went wrong
        reason: String,
    },
}

impl GateError {
    /// Map to a protocol error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Licensing(e) => e.error_code(),
            Self::Encode { .. } => ErrorCode::InternalError,
            Self::MalformedHeader { .. } => ErrorCode::InvalidRequest,
        }
    }

    /// Hint for the user.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Licensing(e) => e.suggestion(),
            Self::MalformedHeader { .. } => {
                Some("The X-PAYMENT-REQUIRED value must be base64-encoded JSON")
            }
            Self::Encode { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paylane_types::Fingerprint;

    #[test]
    fn test_codes() {
        let err: GateError = LicenseError::NotFound(Fingerprint::of(b"x")).into();
        assert_eq!(err.error_code(), ErrorCode::NotFound);

        let err = GateError::MalformedHeader {
            reason: "bad base64".into(),
        };
        assert_eq!(err.error_code(), ErrorCode::InvalidRequest);
        assert!(err.suggestion().is_some());
        assert_eq!(err.to_string(), "malformed payment header: bad base64");
    }
}
