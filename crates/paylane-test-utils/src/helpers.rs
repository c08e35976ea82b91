//! Helper functions for creating test fixtures.

use paylane_types::{Amount, ContentEntry, Fingerprint, Identity, Timestamp};

/// A fixed starting time for tests (2023-11-14T22:13:20Z).
pub const T0: Timestamp = 1_700_000_000;

/// Deterministic fingerprint for item `n`.
pub fn test_fingerprint(n: u8) -> Fingerprint {
    Fingerprint::of(&[b'f', b'p', n])
}

/// A fingerprint nobody else will produce.
pub fn random_fingerprint() -> Fingerprint {
    Fingerprint::from_bytes(rand::random())
}

/// Identity shorthand.
pub fn test_identity(name: &str) -> Identity {
    Identity::new(name)
}

/// Active content entry registered at [`T0`].
pub fn test_entry(fingerprint: Fingerprint, price: Amount, owner: &str) -> ContentEntry {
    ContentEntry::new(
        fingerprint,
        price,
        format!("https://content.example/{}", fingerprint),
        Identity::new(owner),
        T0,
    )
}
