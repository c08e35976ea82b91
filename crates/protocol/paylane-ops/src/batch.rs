//! Atomic-batch settlement.
//!
//! Every item goes to the rail in one all-or-nothing submission. Any lookup
//! failure aborts the call before the rail is touched, and a rejected or
//! unconfirmed batch records nothing. Each sub-transfer still carries its
//! own tracking tag.

use futures::future::join_all;
use tracing::{info, warn};

use paylane_license::LicensingClient;
use paylane_settle::{PaymentRail, RailError, TransferInstruction};
use paylane_store::PurchaseLog;
use paylane_types::{Amount, ErrorCode, Strategy, Timestamp, TrackingTag};

use crate::error::{OpsError, OpsResult};
use crate::guard::Reservation;
use crate::orchestrator::{is_definitive, tracking_tag, PaymentOrchestrator, Plan};
use crate::result::PurchaseResult;

impl<L, R, P> PaymentOrchestrator<L, R, P>
where
    L: LicensingClient,
    R: PaymentRail,
    P: PurchaseLog,
{
    pub(crate) async fn settle_batch(
        &self,
        plan: Plan,
        now: Timestamp,
    ) -> OpsResult<PurchaseResult> {
        let Plan {
            pending,
            mut skipped,
        } = plan;

        let lookups =
            join_all(pending.iter().map(|item| self.resolve(&item.fingerprint))).await;
        let resolved = lookups.into_iter().collect::<OpsResult<Vec<_>>>()?;
        let items: Vec<_> = pending.into_iter().zip(resolved).collect();

        let prices: Vec<Amount> = items.iter().map(|(_, info)| info.price).collect();
        let reservations = self.guard.reserve_many(&prices)?;

        let tags: Vec<TrackingTag> = items
            .iter()
            .map(|(item, _)| tracking_tag(item, now))
            .collect();
        let instructions: Vec<TransferInstruction> = items
            .iter()
            .zip(&tags)
            .map(|((_, info), tag)| self.instruction(info, *tag))
            .collect();

        let receipt = match self
            .rail
            .submit_batch(&instructions, self.config.fee_sponsored)
            .await
        {
            Ok(receipt) if receipt.all_confirmed => receipt,
            Ok(receipt) => {
                return Err(self.batch_failed(
                    RailError::unconfirmed(receipt.transfer_ref),
                    reservations,
                ));
            }
            Err(e) => return Err(self.batch_failed(e, reservations)),
        };

        info!(
            payer = %self.payer(),
            batch_ref = %receipt.transfer_ref,
            items = items.len(),
            "Batch confirmed"
        );

        let mut warnings = Vec::new();
        for (position, ((item, info), tag)) in items.into_iter().zip(tags).enumerate() {
            let item_ref = receipt.item_ref(position);
            let outcome = self
                .settle_item(
                    item,
                    &info,
                    item_ref.as_str(),
                    tag,
                    Strategy::Batch,
                    now,
                    &mut warnings,
                )
                .await;
            skipped.push(outcome);
        }

        let mut result = PurchaseResult::from_items(Strategy::Batch, skipped);
        result.batch_ref = Some(receipt.transfer_ref.to_string());
        result.warnings = warnings;
        Ok(result)
    }

    fn batch_failed(&self, err: RailError, reservations: Vec<Reservation>) -> OpsError {
        if is_definitive(&err) {
            for reservation in reservations {
                if let Err(e) = self.guard.release(reservation) {
                    warn!(error = %e, "Reservation not released");
                }
            }
        }
        warn!(payer = %self.payer(), error = %err, "Batch failed");

        let code = match &err {
            RailError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            RailError::Network(_) => ErrorCode::RailUnavailable,
            _ => ErrorCode::BatchFailed,
        };
        OpsError::BatchFailed {
            reason: err.to_string(),
            code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use paylane_license::LicensingEngine;
    use paylane_store::{MemoryLedgerStore, MemoryPurchaseLog};
    use paylane_test_utils::{test_fingerprint, ManualClock, MockRail, T0};
    use paylane_types::{Fingerprint, Identity};

    use crate::{OrchestratorConfig, SpendingGuard, SpendingLimits};

    type Engine = LicensingEngine<MemoryLedgerStore, ManualClock>;

    fn orchestrator(
        rail: MockRail,
    ) -> (
        PaymentOrchestrator<Arc<Engine>, MockRail, MemoryPurchaseLog>,
        Arc<Engine>,
    ) {
        let clock = ManualClock::new(T0);
        let engine = Arc::new(LicensingEngine::with_clock(
            MemoryLedgerStore::new(),
            clock.clone(),
        ));
        let guard = SpendingGuard::with_clock(
            rail.sender().clone(),
            SpendingLimits::new(10_000, 1_000),
            Arc::new(clock),
        );
        let orchestrator = PaymentOrchestrator::new(
            Arc::clone(&engine),
            rail,
            MemoryPurchaseLog::new(),
            guard,
            OrchestratorConfig::default(),
        )
        .unwrap();
        (orchestrator, engine)
    }

    fn register(engine: &Engine, n: u8, owner: &str) -> Fingerprint {
        let fp = test_fingerprint(n);
        engine
            .register_content(fp, 100, "https://content.example/item", &Identity::new(owner))
            .unwrap();
        fp
    }

    #[tokio::test]
    async fn test_batch_success_uses_item_refs() {
        let rail = MockRail::new();
        let (orchestrator, engine) = orchestrator(rail.clone());
        let fps: Vec<Fingerprint> = (0..3).map(|n| register(&engine, n, "0xowner")).collect();

        let result = orchestrator
            .purchase(&fps, Strategy::Batch, false)
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.batch_ref.as_deref(), Some("0xmock0001"));
        assert_eq!(
            result.item(&fps[2]).unwrap().transfer_ref(),
            Some("0xmock0001#2")
        );
        assert_eq!(rail.batches().len(), 1);
        assert!(rail.attempts().is_empty());

        let tags: Vec<u32> = rail.batches()[0]
            .iter()
            .map(|ix| ix.memo.unwrap().decode().2)
            .collect();
        assert_eq!(tags, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_unknown_item_aborts_before_rail() {
        let rail = MockRail::new();
        let (orchestrator, engine) = orchestrator(rail.clone());
        let known = register(&engine, 1, "0xowner");

        let err = orchestrator
            .purchase(&[known, test_fingerprint(9)], Strategy::Batch, false)
            .await
            .unwrap_err();

        assert!(matches!(err, OpsError::ContentNotFound(_)));
        assert_eq!(rail.call_count(), 0);
        assert_eq!(orchestrator.guard().spent().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unconfirmed_batch_keeps_reservations() {
        let rail = MockRail::new().with_unconfirmed();
        let (orchestrator, engine) = orchestrator(rail.clone());
        let fps: Vec<Fingerprint> = (0..2).map(|n| register(&engine, n, "0xowner")).collect();

        let err = orchestrator
            .purchase(&fps, Strategy::Batch, false)
            .await
            .unwrap_err();

        assert!(matches!(err, OpsError::BatchFailed { .. }));
        assert_eq!(orchestrator.guard().spent().unwrap(), 200);
        assert_eq!(orchestrator.stats().unwrap().purchases, 0);
    }
}
