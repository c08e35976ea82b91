//! Payment rail trait definition.

use std::sync::Arc;

use async_trait::async_trait;
use paylane_types::{Amount, Identity};

use crate::error::RailResult;
use crate::types::{BatchReceipt, TransferInstruction, TransferReceipt};

/// An instant token-transfer primitive.
///
/// This trait abstracts the settlement rail, allowing for:
/// - An HTTP gateway client for production
/// - A mock implementation for testing
///
/// Every call runs to completion or failure. Implementations enforce their
/// own timeouts; callers do not wrap these futures in shorter ones.
#[async_trait]
pub trait PaymentRail: Send + Sync {
    /// The paying account.
    fn sender(&self) -> &Identity;

    /// Submit one transfer.
    ///
    /// Fails with `InsufficientBalance` or `Rejected` when the rail refuses it.
    async fn transfer(&self, instruction: &TransferInstruction) -> RailResult<TransferReceipt>;

    /// Submit every instruction as one all-or-nothing unit.
    ///
    /// If any sub-transfer is invalid the whole batch fails and nothing moves.
    async fn submit_batch(
        &self,
        instructions: &[TransferInstruction],
        fee_sponsored: bool,
    ) -> RailResult<BatchReceipt>;

    /// Sender balance in `token`.
    async fn balance(&self, token: &str) -> RailResult<Amount>;
}

#[async_trait]
impl<T: PaymentRail + ?Sized> PaymentRail for Arc<T> {
    fn sender(&self) -> &Identity {
        (**self).sender()
    }

    async fn transfer(&self, instruction: &TransferInstruction) -> RailResult<TransferReceipt> {
        (**self).transfer(instruction).await
    }

    async fn submit_batch(
        &self,
        instructions: &[TransferInstruction],
        fee_sponsored: bool,
    ) -> RailResult<BatchReceipt> {
        (**self).submit_batch(instructions, fee_sponsored).await
    }

    async fn balance(&self, token: &str) -> RailResult<Amount> {
        (**self).balance(token).await
    }
}
