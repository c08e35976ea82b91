//! Error codes shared across Paylane crates.
//!
//! Every crate-level error enum maps onto one of these codes so callers
//! (the CLI, the access gateway, remote clients) can branch on a stable
//! numeric value instead of matching on message strings.

use serde::{Deserialize, Serialize};

/// Error taxonomy.
///
/// Each [`ErrorCode`] belongs to exactly one category; the category decides
/// how the error is surfaced (rejected input, 404-equivalent, budget refusal,
/// rail failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad or missing fields, non-positive price.
    Validation,
    /// Non-owner attempting an owner-only mutation.
    Authorization,
    /// Unknown fingerprint or missing license.
    NotFound,
    /// Per-item or daily ceiling exceeded.
    Budget,
    /// Transfer rejected, unconfirmed or unreachable.
    Rail,
    /// Storage or lock failure.
    Internal,
}

/// Protocol error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
#[non_exhaustive]
pub enum ErrorCode {
    // =========================================================================
    // Validation Errors (0x0100 - 0x01FF)
    // =========================================================================
    /// Price is zero.
    InvalidPrice = 0x0100,
    /// Locator URI missing or too long.
    InvalidUri = 0x0101,
    /// Identity missing.
    InvalidIdentity = 0x0102,
    /// Fingerprint is already registered.
    AlreadyRegistered = 0x0103,
    /// Too many items in a single purchase call.
    TooManyItems = 0x0104,
    /// Content is registered but disabled.
    ContentInactive = 0x0105,
    /// Request is empty or malformed.
    InvalidRequest = 0x0106,

    // =========================================================================
    // Authorization Errors (0x0200 - 0x02FF)
    // =========================================================================
    /// Caller is not the owner of the content entry.
    NotOwner = 0x0200,
    /// Caller proof did not verify.
    Forbidden = 0x0201,

    // =========================================================================
    // Not-Found Errors (0x0300 - 0x03FF)
    // =========================================================================
    /// Fingerprint is not registered.
    NotFound = 0x0300,
    /// Holder has no license for the fingerprint.
    LicenseNotFound = 0x0301,

    // =========================================================================
    // Budget Errors (0x0400 - 0x04FF)
    // =========================================================================
    /// A single item costs more than the per-item ceiling.
    PerItemCeilingExceeded = 0x0400,
    /// The daily ceiling would be exceeded.
    DailyCeilingExceeded = 0x0401,

    // =========================================================================
    // Rail Errors (0x0500 - 0x05FF)
    // =========================================================================
    /// A single transfer failed.
    TransferFailed = 0x0500,
    /// An atomic batch was rejected as a whole.
    BatchFailed = 0x0501,
    /// Sender balance is too low.
    InsufficientBalance = 0x0502,
    /// The rail could not be reached.
    RailUnavailable = 0x0503,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error.
    InternalError = 0xFFFF,
}

impl ErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Category of this code.
    pub fn category(&self) -> ErrorCategory {
        match self.code() {
            0x0100..=0x01FF => ErrorCategory::Validation,
            0x0200..=0x02FF => ErrorCategory::Authorization,
            0x0300..=0x03FF => ErrorCategory::NotFound,
            0x0400..=0x04FF => ErrorCategory::Budget,
            0x0500..=0x05FF => ErrorCategory::Rail,
            _ => ErrorCategory::Internal,
        }
    }

    /// Get a user-friendly suggestion for recovering from this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidPrice => Some("Prices are whole numbers of the smallest token unit and must be at least 1."),
            Self::InvalidUri => Some("Provide a non-empty locator URI of at most 2048 bytes."),
            Self::InvalidIdentity => Some("Provide a non-empty account identity."),
            Self::AlreadyRegistered => Some("Each fingerprint can be registered once. Use 'paylane set-price' to change the price."),
            Self::TooManyItems => Some("Split the purchase into smaller calls."),
            Self::ContentInactive => Some("The owner has disabled this content."),
            Self::InvalidRequest => Some("Pass at least one fingerprint."),
            Self::NotOwner => Some("Only the owner that registered the content may change it."),
            Self::Forbidden => Some("Check the caller identity proof."),
            Self::NotFound => Some("Verify the fingerprint. Use 'paylane list' to see registered content."),
            Self::LicenseNotFound => Some("Purchase the content with 'paylane purchase'."),
            Self::PerItemCeilingExceeded => Some("Raise limits.per_item_ceiling or skip this item."),
            Self::DailyCeilingExceeded => Some("Wait for the 24h window to roll over or raise limits.daily_ceiling."),
            Self::TransferFailed => Some("Check the rail status and the sender balance, then retry the item."),
            Self::BatchFailed => Some("No item was charged. Fix the rejected instruction and resubmit."),
            Self::InsufficientBalance => Some("Fund the sender account."),
            Self::RailUnavailable => Some("Check rail.endpoint and network connectivity."),
            Self::InternalError => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(ErrorCode::InvalidPrice.category(), ErrorCategory::Validation);
        assert_eq!(ErrorCode::NotOwner.category(), ErrorCategory::Authorization);
        assert_eq!(ErrorCode::NotFound.category(), ErrorCategory::NotFound);
        assert_eq!(
            ErrorCode::DailyCeilingExceeded.category(),
            ErrorCategory::Budget
        );
        assert_eq!(ErrorCode::BatchFailed.category(), ErrorCategory::Rail);
        assert_eq!(ErrorCode::InternalError.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(ErrorCode::NotFound.to_string(), "0x0300");
        assert_eq!(ErrorCode::InternalError.to_string(), "0xFFFF");
    }

    #[test]
    fn test_suggestions() {
        assert!(ErrorCode::PerItemCeilingExceeded.suggestion().is_some());
        assert!(ErrorCode::InternalError.suggestion().is_none());
    }
}
