//! Ledger entries: content, licenses and purchase records.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::LICENSE_DURATION_SECS;
use crate::fingerprint::{Fingerprint, Identity};
use crate::tag::TrackingTag;
use crate::{Amount, Timestamp};

/// A priced piece of content.
///
/// The owner is fixed at registration. Revenue and access count only grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Primary key.
    pub fingerprint: Fingerprint,
    /// Listed price in the smallest currency unit (always > 0).
    pub price: Amount,
    /// Registrant; never changes.
    pub owner: Identity,
    /// Where the content lives.
    pub uri: String,
    /// Disabled entries cannot be licensed.
    pub active: bool,
    /// Sum of prices paid for licenses.
    pub revenue: Amount,
    /// Number of licenses issued.
    pub access_count: u64,
    /// Registration time.
    pub created_at: Timestamp,
    /// Last mutation time.
    pub updated_at: Timestamp,
}

impl ContentEntry {
    /// Create a new active entry with zeroed counters.
    pub fn new(
        fingerprint: Fingerprint,
        price: Amount,
        uri: impl Into<String>,
        owner: Identity,
        now: Timestamp,
    ) -> Self {
        Self {
            fingerprint,
            price,
            owner,
            uri: uri.into(),
            active: true,
            revenue: 0,
            access_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether `caller` owns this entry.
    pub fn is_owned_by(&self, caller: &Identity) -> bool {
        &self.owner == caller
    }

    /// Account for one issued license.
    ///
    /// Returns the new revenue, or `None` if a counter would overflow (the
    /// entry is left untouched in that case).
    pub fn record_access(&mut self, price_paid: Amount) -> Option<Amount> {
        let revenue = self.revenue.checked_add(price_paid)?;
        let access_count = self.access_count.checked_add(1)?;
        self.revenue = revenue;
        self.access_count = access_count;
        Some(revenue)
    }
}

/// Filter for listing content entries.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    /// Only entries owned by this identity.
    pub owner: Option<Identity>,
    /// Only entries with this active flag.
    pub active: Option<bool>,
    /// Maximum number of entries.
    pub limit: Option<usize>,
}

impl ContentFilter {
    /// Match everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to an owner.
    pub fn with_owner(mut self, owner: Identity) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Restrict to active or inactive entries.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Cap the number of results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check an entry against the filter (limit is applied by the caller).
    pub fn matches(&self, entry: &ContentEntry) -> bool {
        if let Some(ref owner) = self.owner {
            if &entry.owner != owner {
                return false;
            }
        }
        if let Some(active) = self.active {
            if entry.active != active {
                return false;
            }
        }
        true
    }
}

/// Proof that `holder` paid for `fingerprint`.
///
/// Keyed by (holder, fingerprint). A re-purchase overwrites the license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Who paid.
    pub holder: Identity,
    /// What was paid for.
    pub fingerprint: Fingerprint,
    /// Amount paid.
    pub price_paid: Amount,
    /// Rail reference of the confirmed transfer.
    pub transfer_ref: String,
    /// Issuance time.
    pub issued_at: Timestamp,
    /// Expiry time (issuance + 30 days).
    pub expires_at: Timestamp,
    /// Active flag.
    pub active: bool,
}

impl License {
    /// Issue a fresh license at `now`.
    pub fn issue(
        holder: Identity,
        fingerprint: Fingerprint,
        price_paid: Amount,
        transfer_ref: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            holder,
            fingerprint,
            price_paid,
            transfer_ref: transfer_ref.into(),
            issued_at: now,
            expires_at: now.saturating_add(LICENSE_DURATION_SECS),
            active: true,
        }
    }

    /// A license is valid iff active and expiry is strictly in the future.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.active && self.expires_at > now
    }

    /// Seconds until expiry (zero once expired).
    pub fn remaining_secs(&self, now: Timestamp) -> Timestamp {
        self.expires_at.saturating_sub(now)
    }
}

/// Settlement strategy used for a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One item at a time, in input order.
    #[default]
    Sequential,
    /// All items concurrently, each on its own ordering lane.
    Parallel,
    /// One all-or-nothing submission.
    Batch,
}

impl Strategy {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
            Self::Batch => "batch",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "seq" => Ok(Self::Sequential),
            "parallel" | "par" => Ok(Self::Parallel),
            "batch" | "atomic" => Ok(Self::Batch),
            _ => Err(format!(
                "Unknown strategy: {}. Use 'sequential', 'parallel' or 'batch'.",
                s
            )),
        }
    }
}

/// Append-only log entry written for every confirmed settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Content paid for.
    pub fingerprint: Fingerprint,
    /// Who paid.
    pub payer: Identity,
    /// Amount transferred.
    pub price: Amount,
    /// Rail reference.
    pub transfer_ref: String,
    /// Settlement time.
    pub timestamp: Timestamp,
    /// Correlation tag carried by the transfer.
    pub tag: TrackingTag,
    /// Strategy that produced the transfer.
    pub strategy: Strategy,
}
