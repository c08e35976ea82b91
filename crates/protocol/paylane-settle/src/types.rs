//! Transfer instructions and receipts.

use serde::{Deserialize, Serialize};

use paylane_types::{Amount, Identity, TrackingTag};

use crate::error::{RailError, RailResult};

/// Rail reference for a submitted transfer or batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferRef(String);

impl TransferRef {
    /// Create a new reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reference for sub-transfer `index` of this batch.
    pub fn item(&self, index: usize) -> Self {
        Self(format!("{}#{}", self.0, index))
    }
}

impl std::fmt::Display for TransferRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TransferRef> for String {
    fn from(r: TransferRef) -> Self {
        r.0
    }
}

/// One token transfer to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstruction {
    /// Payee.
    pub to: Identity,
    /// Amount in the smallest token unit.
    pub amount: Amount,
    /// Token symbol or address.
    pub token: String,
    /// Audit tag carried with the transfer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<TrackingTag>,
    /// Ask the rail to sponsor execution fees.
    #[serde(default)]
    pub fee_sponsored: bool,
    /// Independent sequencing lane. `None` uses the account's default ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane: Option<u64>,
}

impl TransferInstruction {
    /// Create an instruction with no memo, no sponsorship and the default lane.
    pub fn new(to: Identity, amount: Amount, token: impl Into<String>) -> Self {
        Self {
            to,
            amount,
            token: token.into(),
            memo: None,
            fee_sponsored: false,
            lane: None,
        }
    }

    /// Attach a tracking tag.
    pub fn with_memo(mut self, tag: TrackingTag) -> Self {
        self.memo = Some(tag);
        self
    }

    /// Set fee sponsorship.
    pub fn with_fee_sponsored(mut self, sponsored: bool) -> Self {
        self.fee_sponsored = sponsored;
        self
    }

    /// Route the transfer on an independent lane.
    pub fn on_lane(mut self, lane: u64) -> Self {
        self.lane = Some(lane);
        self
    }

    /// Reject instructions no rail would accept.
    pub fn validate(&self) -> RailResult<()> {
        if self.amount == 0 {
            return Err(RailError::rejected("transfer amount must be positive"));
        }
        if self.to.is_blank() {
            return Err(RailError::rejected("transfer has no payee"));
        }
        if self.token.trim().is_empty() {
            return Err(RailError::rejected("transfer has no token"));
        }
        Ok(())
    }
}

/// Outcome of a single transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Rail reference.
    pub transfer_ref: TransferRef,
    /// True once the rail has final confirmation.
    pub confirmed: bool,
}

impl TransferReceipt {
    /// A confirmed receipt.
    pub fn confirmed(transfer_ref: TransferRef) -> Self {
        Self {
            transfer_ref,
            confirmed: true,
        }
    }

    /// The reference, or `Unconfirmed` if the rail did not confirm.
    pub fn into_confirmed(self) -> RailResult<TransferRef> {
        if self.confirmed {
            Ok(self.transfer_ref)
        } else {
            Err(RailError::unconfirmed(self.transfer_ref))
        }
    }
}

/// Outcome of an all-or-nothing batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    /// Rail reference for the whole batch.
    pub transfer_ref: TransferRef,
    /// True once every sub-transfer is confirmed.
    pub all_confirmed: bool,
    /// One reference per sub-transfer, in submission order.
    pub item_refs: Vec<TransferRef>,
}

impl BatchReceipt {
    /// Build a receipt for `count` sub-transfers.
    ///
    /// Missing or short `item_refs` are filled with `"{batch_ref}#{index}"`.
    pub fn new(
        transfer_ref: TransferRef,
        all_confirmed: bool,
        item_refs: Option<Vec<TransferRef>>,
        count: usize,
    ) -> Self {
        let mut refs = item_refs.unwrap_or_default();
        refs.truncate(count);
        let have = refs.len();
        refs.extend((have..count).map(|i| transfer_ref.item(i)));
        Self {
            transfer_ref,
            all_confirmed,
            item_refs: refs,
        }
    }

    /// Reference for sub-transfer `index`.
    pub fn item_ref(&self, index: usize) -> TransferRef {
        self.item_refs
            .get(index)
            .cloned()
            .unwrap_or_else(|| self.transfer_ref.item(index))
    }
}
