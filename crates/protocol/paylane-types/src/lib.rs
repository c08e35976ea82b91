//! Data structures for the Paylane licensing protocol.
//!
//! This crate holds the vocabulary shared by every other Paylane crate:
//! content fingerprints, identities, ledger entries, licenses, purchase
//! records and tracking tags. It contains no I/O and no business logic
//! beyond the invariants the types themselves carry.
//!
//! # Module Organization
//!
//! - [`constants`] - Protocol constants (license duration, spending window, limits)
//! - [`error`] - Error codes shared across crates
//! - [`fingerprint`] - Content fingerprints and identities
//! - [`ledger`] - Content entries, licenses and purchase records
//! - [`tag`] - Tracking tags attached to transfers
//! - [`clock`] - Time source abstraction
//!
//! # Example
//!
//! ```
//! use paylane_types::{ContentEntry, Fingerprint, Identity, License, LICENSE_DURATION_SECS};
//!
//! let fp = Fingerprint::of(b"The Rust Programming Language, ch. 4");
//! let owner = Identity::new("0xowner");
//! let entry = ContentEntry::new(fp, 50_000, "https://example.com/ch4", owner, 1_700_000_000);
//! assert!(entry.active);
//!
//! let holder = Identity::new("0xagent");
//! let license = License::issue(holder, fp, 50_000, "0xabc", 1_700_000_000);
//! assert_eq!(license.expires_at, 1_700_000_000 + LICENSE_DURATION_SECS);
//! assert!(license.is_valid_at(1_700_000_001));
//! ```

/// Protocol version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod clock;
pub mod constants;
pub mod error;
pub mod fingerprint;
pub mod ledger;
pub mod tag;

pub use clock::{Clock, SystemClock};
pub use constants::*;
pub use error::{ErrorCategory, ErrorCode};
pub use fingerprint::{Fingerprint, FingerprintError, Identity};
pub use ledger::{ContentEntry, ContentFilter, License, PurchaseRecord, Strategy};
pub use tag::TrackingTag;

/// Amount in the smallest currency unit of the settlement token.
///
/// All prices, ceilings and revenue counters use this type. There is no
/// floating point anywhere in the ledger.
pub type Amount = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;
