//! Protocol constants.
//!
//! These constants define license lifetime, the spending window, and the
//! size limits applied at registration and purchase time.

use crate::{Amount, Timestamp};

// =============================================================================
// Licensing
// =============================================================================

/// Seconds in one day.
pub const SECS_PER_DAY: Timestamp = 86_400;

/// License lifetime: 30 days from issuance. Re-purchase resets, never extends.
pub const LICENSE_DURATION_SECS: Timestamp = 30 * SECS_PER_DAY;

/// Minimum listed price (prices are strictly positive).
pub const MIN_PRICE: Amount = 1;

/// Maximum length of a content locator URI (bytes).
pub const MAX_URI_LENGTH: usize = 2048;

// =============================================================================
// Spending
// =============================================================================

/// Rolling spending window: 24 hours measured from the last reset.
pub const SPENDING_WINDOW_SECS: Timestamp = SECS_PER_DAY;

/// Default maximum number of fingerprints accepted in one purchase call.
pub const MAX_PURCHASE_ITEMS: usize = 32;

// =============================================================================
// Tracking tags
// =============================================================================

/// Width of a tracking tag in bytes.
pub const TRACKING_TAG_LEN: usize = 32;

/// Number of fingerprint bytes embedded in a tracking tag.
pub const TAG_FINGERPRINT_PREFIX_LEN: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_constants() {
        assert_eq!(LICENSE_DURATION_SECS, 2_592_000);
        assert_eq!(SPENDING_WINDOW_SECS, 86_400);
        const { assert!(LICENSE_DURATION_SECS > SPENDING_WINDOW_SECS) };
    }

    #[test]
    fn test_tag_layout_fits() {
        // prefix + u64 timestamp + u32 index must fit in the tag
        const { assert!(TAG_FINGERPRINT_PREFIX_LEN + 8 + 4 <= TRACKING_TAG_LEN) };
    }

    #[test]
    fn test_price_floor() {
        const { assert!(MIN_PRICE > 0) };
    }
}
