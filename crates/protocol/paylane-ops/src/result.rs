//! Structured purchase outcomes.
//!
//! Expected conditions ("already licensed", "not found", a rejected
//! transfer) are ordinary values here. Callers branch on
//! [`PurchaseResult::success`], [`PurchaseResult::method`] and each item's
//! [`ItemStatus`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use paylane_types::{Amount, ErrorCode, Fingerprint, Strategy, Timestamp, TrackingTag};

/// What happened to one requested item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    /// Transfer confirmed and license recorded.
    Paid {
        /// Rail reference for this item's transfer.
        transfer_ref: String,
        /// Audit tag carried by the transfer.
        tag: TrackingTag,
        /// License expiry.
        expires_at: Timestamp,
    },
    /// Nothing to do for this item.
    Skipped {
        /// Why the item was skipped.
        reason: String,
    },
    /// The item did not end up licensed.
    Failed {
        /// Protocol error code.
        code: ErrorCode,
        /// Human-readable reason.
        reason: String,
        /// Set when money moved but the license was not recorded, or the
        /// rail returned a reference without confirming.
        #[serde(skip_serializing_if = "Option::is_none")]
        transfer_ref: Option<String>,
    },
}

impl ItemStatus {
    pub(crate) fn failed(code: ErrorCode, reason: impl Into<String>) -> Self {
        Self::Failed {
            code,
            reason: reason.into(),
            transfer_ref: None,
        }
    }

    pub(crate) fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }
}

/// Outcome for one requested fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Position in the deduplicated request.
    pub index: usize,
    /// Requested content.
    pub fingerprint: Fingerprint,
    /// Listed price, when the lookup succeeded.
    pub price: Option<Amount>,
    /// What happened.
    #[serde(flatten)]
    pub status: ItemStatus,
}

impl ItemOutcome {
    /// True if this item was paid for.
    pub fn is_paid(&self) -> bool {
        matches!(self.status, ItemStatus::Paid { .. })
    }

    /// True if this item was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, ItemStatus::Skipped { .. })
    }

    /// True if this item failed.
    pub fn is_failed(&self) -> bool {
        matches!(self.status, ItemStatus::Failed { .. })
    }

    /// Transfer reference, if money moved.
    pub fn transfer_ref(&self) -> Option<&str> {
        match &self.status {
            ItemStatus::Paid { transfer_ref, .. } => Some(transfer_ref),
            ItemStatus::Failed { transfer_ref, .. } => transfer_ref.as_deref(),
            ItemStatus::Skipped { .. } => None,
        }
    }
}

/// Result of one orchestrator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseResult {
    /// No item failed.
    pub success: bool,
    /// Strategy used.
    pub strategy: Strategy,
    /// Per-item outcomes in request order.
    pub items: Vec<ItemOutcome>,
    /// Sum of listed prices for items that reached settlement.
    pub total_requested: Amount,
    /// Sum of prices actually paid.
    pub total_paid: Amount,
    /// Items paid.
    pub succeeded: usize,
    /// Items failed.
    pub failed: usize,
    /// Items skipped.
    pub skipped: usize,
    /// Batch reference for atomic settlement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_ref: Option<String>,
    /// Bookkeeping problems that did not change any item's outcome.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl PurchaseResult {
    /// Build a result from item outcomes, computing the counters.
    pub fn from_items(strategy: Strategy, mut items: Vec<ItemOutcome>) -> Self {
        items.sort_by_key(|item| item.index);

        let mut result = Self {
            success: true,
            strategy,
            items: Vec::new(),
            total_requested: 0,
            total_paid: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            batch_ref: None,
            warnings: Vec::new(),
        };
        for item in &items {
            match &item.status {
                ItemStatus::Paid { .. } => {
                    result.succeeded += 1;
                    let price = item.price.unwrap_or(0);
                    result.total_paid = result.total_paid.saturating_add(price);
                    result.total_requested = result.total_requested.saturating_add(price);
                }
                ItemStatus::Failed { .. } => {
                    result.failed += 1;
                    let price = item.price.unwrap_or(0);
                    result.total_requested = result.total_requested.saturating_add(price);
                }
                ItemStatus::Skipped { .. } => result.skipped += 1,
            }
        }
        result.success = result.failed == 0;
        result.items = items;
        result
    }

    /// True if nothing was paid and nothing failed.
    pub fn is_noop(&self) -> bool {
        self.succeeded == 0 && self.failed == 0
    }

    /// How the call was settled; `"noop"` when no payment was needed.
    pub fn method(&self) -> &'static str {
        if self.is_noop() {
            "noop"
        } else {
            self.strategy.as_str()
        }
    }

    /// Outcome for a fingerprint.
    pub fn item(&self, fingerprint: &Fingerprint) -> Option<&ItemOutcome> {
        self.items.iter().find(|item| &item.fingerprint == fingerprint)
    }
}

/// Spend for one strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyStats {
    /// Purchases settled with this strategy.
    pub count: u64,
    /// Amount paid with this strategy.
    pub amount: Amount,
}

/// Purchase history summary for one payer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseStats {
    /// Number of purchase records.
    pub purchases: u64,
    /// Total amount paid.
    pub total_spent: Amount,
    /// Breakdown keyed by strategy name.
    pub by_strategy: BTreeMap<String, StrategyStats>,
}
