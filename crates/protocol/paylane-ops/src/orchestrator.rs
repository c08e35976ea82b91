//! Main `PaymentOrchestrator` implementation.
//!
//! This module holds the orchestrator struct, request planning (dedupe,
//! item limit, license skip) and the pieces every strategy shares: price
//! lookup, instruction building and post-confirmation bookkeeping. The
//! strategies themselves live in `sequential`, `parallel` and `batch`.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use paylane_license::{ContentInfo, LicenseError, LicensingClient};
use paylane_settle::{PaymentRail, RailError, TransferInstruction};
use paylane_store::PurchaseLog;
use paylane_types::{
    Amount, Fingerprint, Identity, PurchaseRecord, Strategy, Timestamp, TrackingTag,
    SPENDING_WINDOW_SECS,
};

use crate::config::OrchestratorConfig;
use crate::error::{OpsError, OpsResult};
use crate::guard::{BudgetStatus, Reservation, SpendingGuard};
use crate::result::{ItemOutcome, ItemStatus, PurchaseResult, PurchaseStats, StrategyStats};

/// An item that survived planning and still needs paying for.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingItem {
    pub index: usize,
    pub fingerprint: Fingerprint,
}

/// Output of request planning.
#[derive(Debug, Default)]
pub(crate) struct Plan {
    pub pending: Vec<PendingItem>,
    pub skipped: Vec<ItemOutcome>,
}

/// Fingerprints a call has claimed for settlement. Released on drop.
pub(crate) struct Claim<'a> {
    in_flight: &'a Mutex<HashSet<Fingerprint>>,
    held: Vec<Fingerprint>,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        for fp in &self.held {
            in_flight.remove(fp);
        }
    }
}

/// Settles purchases for one payer.
///
/// Generic over:
/// - `L`: the licensing engine client
/// - `R`: the payment rail
/// - `P`: the purchase log
///
/// The orchestrator owns the payer's [`SpendingGuard`]; every transfer is
/// reserved against it before it reaches the rail. Licenses are recorded
/// only after the rail confirms a transfer. A fingerprint is settled by at
/// most one call at a time; overlapping calls skip it.
pub struct PaymentOrchestrator<L, R, P>
where
    L: LicensingClient,
    R: PaymentRail,
    P: PurchaseLog,
{
    pub(crate) licensing: L,
    pub(crate) rail: R,
    pub(crate) guard: SpendingGuard,
    log: Mutex<P>,
    in_flight: Mutex<HashSet<Fingerprint>>,
    pub(crate) config: OrchestratorConfig,
}

impl<L, R, P> PaymentOrchestrator<L, R, P>
where
    L: LicensingClient,
    R: PaymentRail,
    P: PurchaseLog,
{
    /// Create an orchestrator.
    ///
    /// The guard's payer must be the rail's sender.
    pub fn new(
        licensing: L,
        rail: R,
        log: P,
        guard: SpendingGuard,
        config: OrchestratorConfig,
    ) -> OpsResult<Self> {
        if guard.payer() != rail.sender() {
            return Err(OpsError::invalid_request(format!(
                "spending guard payer {} does not match rail sender {}",
                guard.payer(),
                rail.sender()
            )));
        }
        if config.max_items == 0 {
            return Err(OpsError::invalid_request("max_items must be at least 1"));
        }
        Ok(Self {
            licensing,
            rail,
            guard,
            log: Mutex::new(log),
            in_flight: Mutex::new(HashSet::new()),
            config,
        })
    }

    /// Payer this orchestrator acts for.
    pub fn payer(&self) -> &Identity {
        self.guard.payer()
    }

    /// The spending guard.
    pub fn guard(&self) -> &SpendingGuard {
        &self.guard
    }

    /// The payment rail.
    pub fn rail(&self) -> &R {
        &self.rail
    }

    /// The licensing client.
    pub fn licensing(&self) -> &L {
        &self.licensing
    }

    /// Configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    // =========================================================================
    // Entry Points
    // =========================================================================

    /// Purchase a set of fingerprints with the given strategy.
    ///
    /// Fingerprints already licensed to the payer are skipped unless
    /// `force` is set, as are fingerprints another call is still settling.
    /// If nothing is left, the rail is not called and a no-op result is
    /// returned.
    ///
    /// Budget rejections are returned as errors when no transfer has been
    /// attempted yet. For sequential purchases, an item rejected after an
    /// earlier item reached the rail is reported as a failed item instead,
    /// so the caller still sees what was paid.
    pub async fn purchase(
        &self,
        fingerprints: &[Fingerprint],
        strategy: Strategy,
        force: bool,
    ) -> OpsResult<PurchaseResult> {
        let now = self.guard.now();
        let (plan, _claim) = self.plan(fingerprints, force).await?;

        if plan.pending.is_empty() {
            debug!(
                payer = %self.payer(),
                skipped = plan.skipped.len(),
                "Nothing to purchase"
            );
            return Ok(PurchaseResult::from_items(strategy, plan.skipped));
        }

        debug!(
            payer = %self.payer(),
            strategy = %strategy,
            items = plan.pending.len(),
            "Starting purchase"
        );

        let result = match strategy {
            Strategy::Sequential => self.settle_sequential(plan, now).await?,
            Strategy::Parallel => self.settle_parallel(plan, now).await?,
            Strategy::Batch => self.settle_batch(plan, now).await?,
        };

        info!(
            payer = %self.payer(),
            strategy = %strategy,
            succeeded = result.succeeded,
            failed = result.failed,
            skipped = result.skipped,
            total_paid = result.total_paid,
            "Purchase complete"
        );
        Ok(result)
    }

    /// Purchase a single fingerprint.
    ///
    /// Unlike a one-item sequential purchase, lookup and budget failures
    /// are returned as errors. A rail failure is still an item outcome.
    pub async fn purchase_one(
        &self,
        fingerprint: &Fingerprint,
        force: bool,
    ) -> OpsResult<PurchaseResult> {
        let now = self.guard.now();
        let (plan, _claim) = self.plan(std::slice::from_ref(fingerprint), force).await?;

        let Some(item) = plan.pending.first().copied() else {
            return Ok(PurchaseResult::from_items(Strategy::Sequential, plan.skipped));
        };

        let mut warnings = Vec::new();
        let outcome = self
            .settle_single(item, now, Strategy::Sequential, &mut warnings)
            .await?;
        let mut result = PurchaseResult::from_items(Strategy::Sequential, vec![outcome]);
        result.warnings = warnings;
        Ok(result)
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    /// Snapshot of the payer's budget.
    pub fn budget(&self) -> OpsResult<BudgetStatus> {
        Ok(self.guard.status()?)
    }

    /// Summarise the payer's purchase history.
    pub fn stats(&self) -> OpsResult<PurchaseStats> {
        let records = self.log()?.for_payer(self.payer())?;

        let mut stats = PurchaseStats::default();
        let mut by_strategy: BTreeMap<String, StrategyStats> = BTreeMap::new();
        for record in &records {
            stats.purchases += 1;
            stats.total_spent = stats.total_spent.saturating_add(record.price);
            let entry = by_strategy
                .entry(record.strategy.as_str().to_string())
                .or_default();
            entry.count += 1;
            entry.amount = entry.amount.saturating_add(record.price);
        }
        stats.by_strategy = by_strategy;
        Ok(stats)
    }

    /// Seed the guard from purchases logged in the last 24 hours.
    ///
    /// The restored window starts at the earliest such purchase. Returns the
    /// restored spend.
    ///
    /// Only confirmed purchases are logged, so reservations held for network
    /// errors or unconfirmed receipts are not restored. Reconcile those
    /// against the rail before relying on the restored headroom.
    pub fn restore_budget(&self) -> OpsResult<Amount> {
        let now = self.guard.now();
        // total_spent is inclusive of `since`; the window excludes it
        let since = now.saturating_sub(SPENDING_WINDOW_SECS).saturating_add(1);

        let log = self.log()?;
        let start = log
            .for_payer(self.payer())?
            .iter()
            .map(|r| r.timestamp)
            .filter(|&t| t >= since)
            .min();
        let Some(start) = start else {
            return Ok(0);
        };
        let spent = log.total_spent(self.payer(), since)?;
        drop(log);

        self.guard.restore(spent, start)?;
        Ok(spent)
    }

    // =========================================================================
    // Shared Steps
    // =========================================================================

    /// Deduplicate, enforce the item limit, and skip licensed content.
    ///
    /// Pending fingerprints are claimed for the life of the returned
    /// [`Claim`]; ones already claimed by another call are skipped.
    pub(crate) async fn plan(
        &self,
        fingerprints: &[Fingerprint],
        force: bool,
    ) -> OpsResult<(Plan, Claim<'_>)> {
        if fingerprints.is_empty() {
            return Err(OpsError::invalid_request("no fingerprints given"));
        }

        let mut seen = HashSet::new();
        let unique: Vec<Fingerprint> = fingerprints
            .iter()
            .copied()
            .filter(|fp| seen.insert(*fp))
            .collect();

        if unique.len() > self.config.max_items {
            return Err(OpsError::TooManyItems {
                count: unique.len(),
                max: self.config.max_items,
            });
        }

        let mut plan = Plan::default();
        let mut claim = Claim {
            in_flight: &self.in_flight,
            held: Vec::new(),
        };
        for (index, fingerprint) in unique.into_iter().enumerate() {
            if !self.try_claim(&mut claim, fingerprint)? {
                debug!(
                    payer = %self.payer(),
                    fingerprint = %fingerprint,
                    "Purchase in progress, skipping"
                );
                plan.skipped.push(ItemOutcome {
                    index,
                    fingerprint,
                    price: None,
                    status: ItemStatus::skipped("purchase in progress"),
                });
                continue;
            }
            if !force
                && self
                    .licensing
                    .has_valid_license(self.payer(), &fingerprint)
                    .await?
            {
                debug!(
                    payer = %self.payer(),
                    fingerprint = %fingerprint,
                    "Already licensed, skipping"
                );
                plan.skipped.push(ItemOutcome {
                    index,
                    fingerprint,
                    price: None,
                    status: ItemStatus::skipped("already licensed"),
                });
                continue;
            }
            plan.pending.push(PendingItem { index, fingerprint });
        }
        Ok((plan, claim))
    }

    fn try_claim(&self, claim: &mut Claim<'_>, fingerprint: Fingerprint) -> OpsResult<bool> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| OpsError::lock_poisoned("in-flight set lock poisoned"))?;
        if !in_flight.insert(fingerprint) {
            return Ok(false);
        }
        claim.held.push(fingerprint);
        Ok(true)
    }

    /// Look up the price and payee. Unknown or inactive content is an error.
    pub(crate) async fn resolve(&self, fingerprint: &Fingerprint) -> OpsResult<ContentInfo> {
        let info = self
            .licensing
            .content_info(fingerprint)
            .await
            .map_err(|e| match e {
                LicenseError::NotFound(fp) => OpsError::ContentNotFound(fp),
                other => OpsError::Licensing(other),
            })?;
        if !info.active {
            return Err(OpsError::ContentInactive(*fingerprint));
        }
        Ok(info)
    }

    /// Build the rail instruction for an item.
    pub(crate) fn instruction(
        &self,
        info: &ContentInfo,
        tag: TrackingTag,
    ) -> TransferInstruction {
        TransferInstruction::new(info.owner.clone(), info.price, self.config.token.clone())
            .with_memo(tag)
            .with_fee_sponsored(self.config.fee_sponsored)
    }

    /// One reservation, one transfer. Lookup and budget failures are errors;
    /// the transfer's result is an outcome.
    pub(crate) async fn settle_single(
        &self,
        item: PendingItem,
        now: Timestamp,
        strategy: Strategy,
        warnings: &mut Vec<String>,
    ) -> OpsResult<ItemOutcome> {
        let info = self.resolve(&item.fingerprint).await?;
        let reservation = self.guard.reserve(info.price)?;

        let tag = tracking_tag(&item, now);
        let instruction = self.instruction(&info, tag);
        let confirmed = self
            .rail
            .transfer(&instruction)
            .await
            .and_then(|receipt| receipt.into_confirmed());

        Ok(match confirmed {
            Ok(transfer_ref) => {
                self.settle_item(
                    item,
                    &info,
                    transfer_ref.as_str(),
                    tag,
                    strategy,
                    now,
                    warnings,
                )
                .await
            }
            Err(e) => self.transfer_failed(item, &info, reservation, e),
        })
    }

    /// Record the license and the purchase for a confirmed transfer.
    ///
    /// The purchase record is written even if the license is not, since the
    /// money has moved.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn settle_item(
        &self,
        item: PendingItem,
        info: &ContentInfo,
        transfer_ref: &str,
        tag: TrackingTag,
        strategy: Strategy,
        now: Timestamp,
        warnings: &mut Vec<String>,
    ) -> ItemOutcome {
        let payer = self.payer();
        let license = self
            .licensing
            .record_license(payer, &item.fingerprint, info.price, transfer_ref)
            .await;

        let record = PurchaseRecord {
            fingerprint: item.fingerprint,
            payer: payer.clone(),
            price: info.price,
            transfer_ref: transfer_ref.to_string(),
            timestamp: now,
            tag,
            strategy,
        };
        if let Err(e) = self.append_record(&record) {
            error!(
                payer = %payer,
                fingerprint = %item.fingerprint,
                transfer_ref,
                error = %e,
                "Purchase record not written"
            );
            warnings.push(format!(
                "purchase record for {} not written: {}",
                item.fingerprint, e
            ));
        }

        let status = match license {
            Ok(license) => {
                info!(
                    payer = %payer,
                    fingerprint = %item.fingerprint,
                    payee = %info.owner,
                    price = info.price,
                    transfer_ref,
                    "Item paid"
                );
                ItemStatus::Paid {
                    transfer_ref: transfer_ref.to_string(),
                    tag,
                    expires_at: license.expires_at,
                }
            }
            Err(e) => {
                error!(
                    payer = %payer,
                    fingerprint = %item.fingerprint,
                    transfer_ref,
                    error = %e,
                    "Transfer confirmed but license not recorded"
                );
                ItemStatus::Failed {
                    code: e.error_code(),
                    reason: format!("license not recorded: {}", e),
                    transfer_ref: Some(transfer_ref.to_string()),
                }
            }
        };

        ItemOutcome {
            index: item.index,
            fingerprint: item.fingerprint,
            price: Some(info.price),
            status,
        }
    }

    /// Turn a rail failure into an outcome, releasing the reservation when
    /// the rail definitely did not move money.
    pub(crate) fn transfer_failed(
        &self,
        item: PendingItem,
        info: &ContentInfo,
        reservation: Reservation,
        err: RailError,
    ) -> ItemOutcome {
        if is_definitive(&err) {
            if let Err(e) = self.guard.release(reservation) {
                warn!(error = %e, "Reservation not released");
            }
        }
        warn!(
            payer = %self.payer(),
            fingerprint = %item.fingerprint,
            payee = %info.owner,
            price = info.price,
            error = %err,
            "Transfer failed"
        );

        let transfer_ref = match &err {
            RailError::Unconfirmed(r) => Some(r.clone()),
            _ => None,
        };
        ItemOutcome {
            index: item.index,
            fingerprint: item.fingerprint,
            price: Some(info.price),
            status: ItemStatus::Failed {
                code: err.error_code(),
                reason: err.to_string(),
                transfer_ref,
            },
        }
    }

    /// Outcome for an item dropped before reaching the rail.
    pub(crate) fn dropped(
        &self,
        item: PendingItem,
        price: Option<Amount>,
        err: &OpsError,
    ) -> ItemOutcome {
        warn!(
            payer = %self.payer(),
            fingerprint = %item.fingerprint,
            error = %err,
            "Item dropped"
        );
        ItemOutcome {
            index: item.index,
            fingerprint: item.fingerprint,
            price,
            status: ItemStatus::failed(err.error_code(), err.to_string()),
        }
    }

    fn log(&self) -> OpsResult<MutexGuard<'_, P>> {
        self.log
            .lock()
            .map_err(|_| OpsError::lock_poisoned("purchase log lock poisoned"))
    }

    fn append_record(&self, record: &PurchaseRecord) -> OpsResult<()> {
        self.log()?.append(record)?;
        Ok(())
    }
}

/// Audit tag for an item: fingerprint prefix, call time, request index.
pub(crate) fn tracking_tag(item: &PendingItem, now: Timestamp) -> TrackingTag {
    let index = u32::try_from(item.index).unwrap_or(u32::MAX);
    TrackingTag::derive(&item.fingerprint, now, index)
}

/// True if the rail certainly did not move money.
///
/// Network errors and unconfirmed receipts are ambiguous; their
/// reservations stay committed.
pub(crate) fn is_definitive(err: &RailError) -> bool {
    !err.is_transient() && !matches!(err, RailError::Unconfirmed(_))
}
