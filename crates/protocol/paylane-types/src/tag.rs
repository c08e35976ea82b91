//! Tracking tags attached to transfers.
//!
//! A tag correlates a transfer with the purchase it represents. It is an
//! audit label only and grants nothing. Layout (32 bytes):
//!
//! ```text
//! [0..16)  fingerprint prefix
//! [16..24) timestamp, u64 big-endian
//! [24..28) item index, u32 big-endian
//! [28..32) zero padding
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{TAG_FINGERPRINT_PREFIX_LEN, TRACKING_TAG_LEN};
use crate::fingerprint::{Fingerprint, FingerprintError};
use crate::Timestamp;

const TS_OFFSET: usize = TAG_FINGERPRINT_PREFIX_LEN;
const INDEX_OFFSET: usize = TS_OFFSET + 8;
const PAD_OFFSET: usize = INDEX_OFFSET + 4;

/// Fixed-width transfer memo.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackingTag(pub [u8; TRACKING_TAG_LEN]);

impl TrackingTag {
    /// Derive the tag for item `index` of a purchase made at `timestamp`.
    ///
    /// # Example
    /// ```
    /// use paylane_types::{Fingerprint, TrackingTag};
    ///
    /// let fp = Fingerprint::of(b"report.pdf");
    /// let tag = TrackingTag::derive(&fp, 1_700_000_000, 3);
    /// assert_eq!(tag, TrackingTag::derive(&fp, 1_700_000_000, 3));
    ///
    /// let (prefix, ts, index) = tag.decode();
    /// assert_eq!(&prefix[..], &fp.as_bytes()[..16]);
    /// assert_eq!((ts, index), (1_700_000_000, 3));
    /// ```
    pub fn derive(fingerprint: &Fingerprint, timestamp: Timestamp, index: u32) -> Self {
        let mut bytes = [0u8; TRACKING_TAG_LEN];
        bytes[..TS_OFFSET].copy_from_slice(&fingerprint.as_bytes()[..TAG_FINGERPRINT_PREFIX_LEN]);
        bytes[TS_OFFSET..INDEX_OFFSET].copy_from_slice(&timestamp.to_be_bytes());
        bytes[INDEX_OFFSET..PAD_OFFSET].copy_from_slice(&index.to_be_bytes());
        Self(bytes)
    }

    /// Split the tag back into (fingerprint prefix, timestamp, item index).
    pub fn decode(&self) -> ([u8; TAG_FINGERPRINT_PREFIX_LEN], Timestamp, u32) {
        let mut prefix = [0u8; TAG_FINGERPRINT_PREFIX_LEN];
        prefix.copy_from_slice(&self.0[..TS_OFFSET]);

        let mut ts = [0u8; 8];
        ts.copy_from_slice(&self.0[TS_OFFSET..INDEX_OFFSET]);

        let mut index = [0u8; 4];
        index.copy_from_slice(&self.0[INDEX_OFFSET..PAD_OFFSET]);

        (prefix, u64::from_be_bytes(ts), u32::from_be_bytes(index))
    }

    /// True if the tag was derived from `fingerprint`.
    pub fn matches(&self, fingerprint: &Fingerprint) -> bool {
        self.0[..TS_OFFSET] == fingerprint.as_bytes()[..TAG_FINGERPRINT_PREFIX_LEN]
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; TRACKING_TAG_LEN] {
        &self.0
    }

    /// Lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, FingerprintError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|e| FingerprintError::InvalidHex(e.to_string()))?;
        let array: [u8; TRACKING_TAG_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| FingerprintError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }
}

impl std::fmt::Debug for TrackingTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (_, ts, index) = self.decode();
        write!(f, "TrackingTag({}..@{}#{})", hex::encode(&self.0[..4]), ts, index)
    }
}

impl std::fmt::Display for TrackingTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for TrackingTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TrackingTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
