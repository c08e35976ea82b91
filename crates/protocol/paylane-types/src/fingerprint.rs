//! Content fingerprints and account identities.
//!
//! A fingerprint is the primary lookup key for a piece of content. It can be
//! supplied by the registrant (any 32 opaque bytes) or derived from the raw
//! content bytes with SHA-256 and domain separation:
//!
//! ```text
//! Fingerprint(content) = H(0x01 || len(content) as u64be || content)
//! ```

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Domain separator for content fingerprints.
const DOMAIN_CONTENT: u8 = 0x01;

/// Errors from parsing a fingerprint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    /// Not valid hexadecimal.
    #[error("invalid fingerprint hex: {0}")]
    InvalidHex(String),

    /// Wrong number of bytes.
    #[error("invalid fingerprint length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// A 32-byte content fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Create a fingerprint from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive a fingerprint from content bytes.
    ///
    /// # Example
    /// ```
    /// use paylane_types::Fingerprint;
    ///
    /// let a = Fingerprint::of(b"chapter one");
    /// assert_eq!(a, Fingerprint::of(b"chapter one"));
    /// assert_ne!(a, Fingerprint::of(b"chapter two"));
    /// ```
    pub fn of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([DOMAIN_CONTENT]);
        hasher.update((content.len() as u64).to_be_bytes());
        hasher.update(content);
        Self(hasher.finalize().into())
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, FingerprintError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|e| FingerprintError::InvalidHex(e.to_string()))?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| FingerprintError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }

    /// Lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({})", hex::encode(&self.0[..8]))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// An account identity (owner, holder or payer).
///
/// Opaque to the ledger: whatever address format the payment rail uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create a new identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identity is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let fp = Fingerprint::of(b"hello");
        let parsed: Fingerprint = fp.to_string().parse().unwrap();
        assert_eq!(parsed, fp);

        let prefixed = Fingerprint::from_hex(&format!("0x{}", fp)).unwrap();
        assert_eq!(prefixed, fp);
    }

    #[test]
    fn test_invalid_hex() {
        assert!(matches!(
            Fingerprint::from_hex("zz"),
            Err(FingerprintError::InvalidHex(_))
        ));
        assert_eq!(
            Fingerprint::from_hex("abcd"),
            Err(FingerprintError::InvalidLength(2))
        );
    }

    #[test]
    fn test_length_prefix_separates_inputs() {
        // Same trailing bytes, different lengths
        assert_ne!(Fingerprint::of(b""), Fingerprint::of(b"\0"));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let fp = Fingerprint([0xab; 32]);
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn test_identity_blank() {
        assert!(Identity::new("  ").is_blank());
        assert!(!Identity::new("0xabc").is_blank());
        assert_eq!(
            serde_json::to_string(&Identity::new("0xabc")).unwrap(),
            "\"0xabc\""
        );
    }
}
