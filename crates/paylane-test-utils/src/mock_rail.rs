//! Mock implementation of the `PaymentRail` trait for testing.
//!
//! Records every submitted instruction, tracks a sender balance, and fails
//! transfers that match configured predicates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use paylane_settle::{
    BatchReceipt, PaymentRail, RailError, RailResult, TransferInstruction, TransferReceipt,
    TransferRef,
};
use paylane_types::{Amount, Identity};

type FailPredicate = Arc<dyn Fn(&TransferInstruction) -> bool + Send + Sync>;

struct MockRailInner {
    /// Sender balance.
    balance: Amount,
    /// Every instruction passed to `transfer`, in arrival order.
    attempts: Vec<TransferInstruction>,
    /// Instructions that moved money (single transfers and batch items).
    settled: Vec<TransferInstruction>,
    /// Every batch passed to `submit_batch`, accepted or not.
    batches: Vec<Vec<TransferInstruction>>,
    /// Instructions matching any predicate are rejected.
    fail_when: Vec<FailPredicate>,
    /// When true, all operations return Rejected.
    should_fail: bool,
    /// When true, receipts come back unconfirmed (money still moves).
    unconfirmed: bool,
    /// Auto-incrementing reference counter.
    tx_counter: u64,
}

/// A mock payment rail.
///
/// Uses `Arc<RwLock<...>>` internally, so it is cheap to clone and all
/// clones share the same state.
#[derive(Clone)]
pub struct MockRail {
    sender: Identity,
    latency: Option<Duration>,
    inner: Arc<RwLock<MockRailInner>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockRail {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRail {
    /// Create a rail for sender `0xagent` with a large balance.
    pub fn new() -> Self {
        Self::with_sender(Identity::new("0xagent"))
    }

    /// Create a rail for a specific sender.
    pub fn with_sender(sender: Identity) -> Self {
        Self {
            sender,
            latency: None,
            inner: Arc::new(RwLock::new(MockRailInner {
                balance: 1_000_000_000_000,
                attempts: Vec::new(),
                settled: Vec::new(),
                batches: Vec::new(),
                fail_when: Vec::new(),
                should_fail: false,
                unconfirmed: false,
                tx_counter: 0,
            })),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the sender balance.
    pub fn with_balance(self, balance: Amount) -> Self {
        self.inner.write().unwrap().balance = balance;
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Configure the mock to fail all operations.
    pub fn with_failure(self) -> Self {
        self.inner.write().unwrap().should_fail = true;
        self
    }

    /// Return unconfirmed receipts.
    pub fn with_unconfirmed(self) -> Self {
        self.inner.write().unwrap().unconfirmed = true;
        self
    }

    /// Reject any instruction matching `predicate`.
    pub fn fail_when<F>(self, predicate: F) -> Self
    where
        F: Fn(&TransferInstruction) -> bool + Send + Sync + 'static,
    {
        self.inner
            .write()
            .unwrap()
            .fail_when
            .push(Arc::new(predicate));
        self
    }

    /// Reject transfers to `payee`.
    pub fn fail_payee(self, payee: Identity) -> Self {
        self.fail_when(move |ix| ix.to == payee)
    }

    /// Reject transfers on `lane`.
    pub fn fail_lane(self, lane: u64) -> Self {
        self.fail_when(move |ix| ix.lane == Some(lane))
    }

    /// Set the failure mode at runtime.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.inner.write().unwrap().should_fail = should_fail;
    }

    // =========================================================================
    // Assertion Helpers
    // =========================================================================

    /// Instructions passed to `transfer`.
    pub fn attempts(&self) -> Vec<TransferInstruction> {
        self.inner.read().unwrap().attempts.clone()
    }

    /// Instructions that moved money.
    pub fn settled(&self) -> Vec<TransferInstruction> {
        self.inner.read().unwrap().settled.clone()
    }

    /// Batches passed to `submit_batch`.
    pub fn batches(&self) -> Vec<Vec<TransferInstruction>> {
        self.inner.read().unwrap().batches.clone()
    }

    /// Number of rail calls made (transfers plus batches).
    pub fn call_count(&self) -> usize {
        let inner = self.inner.read().unwrap();
        inner.attempts.len() + inner.batches.len()
    }

    /// Current sender balance.
    pub fn current_balance(&self) -> Amount {
        self.inner.read().unwrap().balance
    }

    /// Peak number of transfers in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_ref(inner: &mut MockRailInner) -> TransferRef {
        inner.tx_counter += 1;
        TransferRef::new(format!("0xmock{:04}", inner.tx_counter))
    }

    fn check(inner: &MockRailInner, ix: &TransferInstruction) -> RailResult<()> {
        if inner.should_fail {
            return Err(RailError::rejected("mock failure"));
        }
        ix.validate()?;
        if inner.fail_when.iter().any(|p| p(ix)) {
            return Err(RailError::rejected(format!(
                "mock rejected transfer to {}",
                ix.to
            )));
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentRail for MockRail {
    fn sender(&self) -> &Identity {
        &self.sender
    }

    async fn transfer(&self, instruction: &TransferInstruction) -> RailResult<TransferReceipt> {
        self.inner
            .write()
            .unwrap()
            .attempts
            .push(instruction.clone());

        self.simulate_latency().await;

        let mut inner = self.inner.write().unwrap();
        Self::check(&inner, instruction)?;
        if inner.balance < instruction.amount {
            return Err(RailError::insufficient_balance(
                inner.balance,
                instruction.amount,
            ));
        }

        inner.balance -= instruction.amount;
        inner.settled.push(instruction.clone());
        let transfer_ref = Self::next_ref(&mut inner);
        Ok(TransferReceipt {
            transfer_ref,
            confirmed: !inner.unconfirmed,
        })
    }

    async fn submit_batch(
        &self,
        instructions: &[TransferInstruction],
        _fee_sponsored: bool,
    ) -> RailResult<BatchReceipt> {
        self.inner
            .write()
            .unwrap()
            .batches
            .push(instructions.to_vec());

        if instructions.is_empty() {
            return Err(RailError::EmptyBatch);
        }

        self.simulate_latency().await;

        let mut inner = self.inner.write().unwrap();
        for ix in instructions {
            Self::check(&inner, ix)?;
        }
        let total: Amount = instructions.iter().map(|ix| ix.amount).sum();
        if inner.balance < total {
            return Err(RailError::insufficient_balance(inner.balance, total));
        }

        inner.balance -= total;
        inner.settled.extend(instructions.iter().cloned());
        let transfer_ref = Self::next_ref(&mut inner);
        let all_confirmed = !inner.unconfirmed;
        Ok(BatchReceipt::new(
            transfer_ref,
            all_confirmed,
            None,
            instructions.len(),
        ))
    }

    async fn balance(&self, _token: &str) -> RailResult<Amount> {
        Ok(self.inner.read().unwrap().balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ix(to: &str, amount: Amount) -> TransferInstruction {
        TransferInstruction::new(Identity::new(to), amount, "USDC")
    }

    #[tokio::test]
    async fn test_transfer_debits_balance() {
        let rail = MockRail::new().with_balance(100);
        let receipt = rail.transfer(&ix("bob", 40)).await.unwrap();
        assert!(receipt.confirmed);
        assert_eq!(rail.current_balance(), 60);
        assert_eq!(rail.settled().len(), 1);

        let err = rail.transfer(&ix("bob", 61)).await.unwrap_err();
        assert!(matches!(err, RailError::InsufficientBalance { have: 60, need: 61 }));
        assert_eq!(rail.attempts().len(), 2);
    }

    #[tokio::test]
    async fn test_fail_payee() {
        let rail = MockRail::new().fail_payee(Identity::new("mallory"));
        assert!(rail.transfer(&ix("bob", 1)).await.is_ok());
        assert!(matches!(
            rail.transfer(&ix("mallory", 1)).await,
            Err(RailError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_all_or_nothing() {
        let rail = MockRail::new().with_balance(100);
        let err = rail
            .submit_batch(&[ix("bob", 10), ix("carol", 0)], false)
            .await
            .unwrap_err();
        assert!(matches!(err, RailError::Rejected(_)));
        assert_eq!(rail.current_balance(), 100);
        assert!(rail.settled().is_empty());
        assert_eq!(rail.batches().len(), 1);

        let receipt = rail
            .submit_batch(&[ix("bob", 10), ix("carol", 20)], false)
            .await
            .unwrap();
        assert_eq!(receipt.item_refs.len(), 2);
        assert_eq!(rail.current_balance(), 70);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let rail = MockRail::new();
        let clone = rail.clone();
        clone.transfer(&ix("bob", 1)).await.unwrap();
        assert_eq!(rail.call_count(), 1);
    }
}
