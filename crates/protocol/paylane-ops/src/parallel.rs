//! Independently-parallel settlement.
//!
//! All items are reserved up front against the request total, then every
//! transfer is submitted at once on its own lane and the call waits for all
//! of them. A failed transfer fails only its own item; there is no rollback
//! of the others.

use futures::future::join_all;
use tracing::debug;

use paylane_license::LicensingClient;
use paylane_settle::PaymentRail;
use paylane_store::PurchaseLog;
use paylane_types::{Amount, Strategy, Timestamp};

use crate::error::OpsResult;
use crate::orchestrator::{tracking_tag, PaymentOrchestrator, Plan};
use crate::result::PurchaseResult;

impl<L, R, P> PaymentOrchestrator<L, R, P>
where
    L: LicensingClient,
    R: PaymentRail,
    P: PurchaseLog,
{
    /// A budget refusal fails the whole call before any transfer.
    pub(crate) async fn settle_parallel(
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
        let mut resolved = Vec::with_capacity(pending.len());
        for (item, lookup) in pending.into_iter().zip(lookups) {
            match lookup {
                Ok(info) => resolved.push((item, info)),
                Err(e) => skipped.push(self.dropped(item, None, &e)),
            }
        }

        if resolved.is_empty() {
            return Ok(PurchaseResult::from_items(Strategy::Parallel, skipped));
        }

        let prices: Vec<Amount> = resolved.iter().map(|(_, info)| info.price).collect();
        let reservations = self.guard.reserve_many(&prices)?;

        let tagged: Vec<_> = resolved
            .iter()
            .map(|(item, info)| {
                let tag = tracking_tag(item, now);
                let instruction = self.instruction(info, tag).on_lane(item.index as u64);
                (tag, instruction)
            })
            .collect();

        debug!(
            payer = %self.payer(),
            transfers = tagged.len(),
            "Submitting parallel transfers"
        );
        let receipts = join_all(tagged.iter().map(|(_, ix)| self.rail.transfer(ix))).await;

        let mut warnings = Vec::new();
        let settled = resolved
            .into_iter()
            .zip(tagged)
            .zip(reservations)
            .zip(receipts);
        for ((((item, info), (tag, _)), reservation), receipt) in settled {
            let outcome = match receipt.and_then(|r| r.into_confirmed()) {
                Ok(transfer_ref) => {
                    self.settle_item(
                        item,
                        &info,
                        transfer_ref.as_str(),
                        tag,
                        Strategy::Parallel,
                        now,
                        &mut warnings,
                    )
                    .await
                }
                Err(e) => self.transfer_failed(item, &info, reservation, e),
            };
            skipped.push(outcome);
        }

        let mut result = PurchaseResult::from_items(Strategy::Parallel, skipped);
        result.warnings = warnings;
        Ok(result)
    }
}
