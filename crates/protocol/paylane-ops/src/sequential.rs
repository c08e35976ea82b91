//! Sequential settlement.
//!
//! Items are settled one at a time in request order. Each item is looked
//! up and reserved against the guard just before its own transfer, and a
//! failure on one item never stops the next. A budget rejection before any
//! transfer has been attempted fails the whole call instead.

use tracing::debug;

use paylane_license::LicensingClient;
use paylane_settle::PaymentRail;
use paylane_store::PurchaseLog;
use paylane_types::{Strategy, Timestamp};

use crate::error::{OpsError, OpsResult};
use crate::orchestrator::{PaymentOrchestrator, Plan};
use crate::result::PurchaseResult;

impl<L, R, P> PaymentOrchestrator<L, R, P>
where
    L: LicensingClient,
    R: PaymentRail,
    P: PurchaseLog,
{
    pub(crate) async fn settle_sequential(
        &self,
        plan: Plan,
        now: Timestamp,
    ) -> OpsResult<PurchaseResult> {
        let Plan {
            pending,
            mut skipped,
        } = plan;
        let mut warnings = Vec::new();
        let mut attempted = false;

        for item in pending {
            debug!(fingerprint = %item.fingerprint, index = item.index, "Settling item");
            let outcome = match self
                .settle_single(item, now, Strategy::Sequential, &mut warnings)
                .await
            {
                Ok(outcome) => {
                    attempted = true;
                    outcome
                }
                Err(e @ OpsError::Budget(_)) if !attempted => return Err(e),
                Err(e) => self.dropped(item, None, &e),
            };
            skipped.push(outcome);
        }

        let mut result = PurchaseResult::from_items(Strategy::Sequential, skipped);
        result.warnings = warnings;
        Ok(result)
    }
}
