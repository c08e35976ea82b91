//! End-to-end purchase flows across the licensing engine, the spending
//! guard and a mock rail.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use paylane_license::{LicensingClient, LicensingEngine};
use paylane_ops::{
    BudgetError, ItemStatus, OpsError, OrchestratorConfig, PaymentOrchestrator, SpendingGuard,
    SpendingLimits, Strategy,
};
use paylane_settle::PaymentRail;
use paylane_store::{MemoryLedgerStore, MemoryPurchaseLog, PurchaseLog};
use paylane_test_utils::{test_fingerprint, ManualClock, MockRail, T0};
use paylane_types::{
    Amount, Fingerprint, Identity, PurchaseRecord, Timestamp, SPENDING_WINDOW_SECS,
};

type Engine = LicensingEngine<MemoryLedgerStore, ManualClock>;
type Orchestrator = PaymentOrchestrator<Arc<Engine>, MockRail, SharedLog>;

/// Purchase log shared between the orchestrator and the test.
#[derive(Clone, Default)]
struct SharedLog(Arc<Mutex<MemoryPurchaseLog>>);

impl PurchaseLog for SharedLog {
    fn append(&mut self, record: &PurchaseRecord) -> paylane_store::Result<()> {
        self.0.lock().unwrap().append(record)
    }

    fn all(&self) -> paylane_store::Result<Vec<PurchaseRecord>> {
        self.0.lock().unwrap().all()
    }

    fn for_payer(&self, payer: &Identity) -> paylane_store::Result<Vec<PurchaseRecord>> {
        self.0.lock().unwrap().for_payer(payer)
    }

    fn for_content(&self, fingerprint: &Fingerprint) -> paylane_store::Result<Vec<PurchaseRecord>> {
        self.0.lock().unwrap().for_content(fingerprint)
    }

    fn total_spent(&self, payer: &Identity, since: Timestamp) -> paylane_store::Result<Amount> {
        self.0.lock().unwrap().total_spent(payer, since)
    }
}

struct Harness {
    orchestrator: Orchestrator,
    engine: Arc<Engine>,
    rail: MockRail,
    log: SharedLog,
    clock: ManualClock,
}

fn harness(rail: MockRail, daily: u64, per_item: u64) -> Harness {
    let clock = ManualClock::new(T0);
    let engine = Arc::new(LicensingEngine::with_clock(
        MemoryLedgerStore::new(),
        clock.clone(),
    ));
    let log = SharedLog::default();
    let guard = SpendingGuard::with_clock(
        rail.sender().clone(),
        SpendingLimits::new(daily, per_item),
        Arc::new(clock.clone()),
    );
    let orchestrator = PaymentOrchestrator::new(
        Arc::clone(&engine),
        rail.clone(),
        log.clone(),
        guard,
        OrchestratorConfig::default(),
    )
    .unwrap();
    Harness {
        orchestrator,
        engine,
        rail,
        log,
        clock,
    }
}

fn register(engine: &Engine, n: u8, price: u64, owner: &str) -> Fingerprint {
    let fp = test_fingerprint(n);
    engine
        .register_content(fp, price, "https://content.example/item", &Identity::new(owner))
        .unwrap();
    fp
}

#[tokio::test]
async fn test_budget_blocks_second_purchase() {
    let h = harness(MockRail::new(), 100_000, 60_000);
    let fp1 = register(&h.engine, 1, 50_000, "0xowner");
    let fp2 = register(&h.engine, 2, 60_000, "0xowner");

    let first = h.orchestrator.purchase_one(&fp1, false).await.unwrap();
    assert!(first.success);
    assert_eq!(h.orchestrator.guard().spent().unwrap(), 50_000);

    let err = h.orchestrator.purchase_one(&fp2, false).await.unwrap_err();
    assert!(matches!(
        err,
        OpsError::Budget(BudgetError::DailyCeilingExceeded {
            requested: 60_000,
            spent: 50_000,
            ceiling: 100_000,
        })
    ));
    assert_eq!(h.orchestrator.guard().spent().unwrap(), 50_000);
    assert_eq!(h.rail.call_count(), 1);
}

#[tokio::test]
async fn test_repurchase_without_force_is_skipped() {
    let h = harness(MockRail::new(), 100_000, 60_000);
    let fp1 = register(&h.engine, 1, 50_000, "0xowner");

    h.orchestrator.purchase_one(&fp1, false).await.unwrap();
    let second = h.orchestrator.purchase_one(&fp1, false).await.unwrap();

    assert!(second.success);
    assert!(second.is_noop());
    assert_eq!(second.skipped, 1);
    assert!(matches!(
        second.items[0].status,
        ItemStatus::Skipped { .. }
    ));
    assert_eq!(h.rail.call_count(), 1);

    let info = h.engine.content_info(&fp1).await.unwrap();
    assert_eq!(info.access_count, 1);
    assert_eq!(info.revenue, 50_000);
}

#[tokio::test]
async fn test_force_repurchases() {
    let h = harness(MockRail::new(), 100_000, 60_000);
    let fp1 = register(&h.engine, 1, 10_000, "0xowner");

    h.orchestrator.purchase_one(&fp1, false).await.unwrap();
    let forced = h
        .orchestrator
        .purchase(&[fp1], Strategy::Sequential, true)
        .await
        .unwrap();

    assert_eq!(forced.succeeded, 1);
    let info = h.engine.content_info(&fp1).await.unwrap();
    assert_eq!(info.access_count, 2);
}

#[tokio::test]
async fn test_all_licensed_never_calls_rail() {
    let h = harness(MockRail::new(), 100_000, 60_000);
    let fps: Vec<Fingerprint> = (1..=3)
        .map(|n| register(&h.engine, n, 100, "0xowner"))
        .collect();
    h.orchestrator
        .purchase(&fps, Strategy::Parallel, false)
        .await
        .unwrap();
    let calls = h.rail.call_count();

    for strategy in [Strategy::Sequential, Strategy::Parallel, Strategy::Batch] {
        let result = h.orchestrator.purchase(&fps, strategy, false).await.unwrap();
        assert_eq!(result.method(), "noop");
        assert_eq!(result.skipped, 3);
    }
    assert_eq!(h.rail.call_count(), calls);
}

#[tokio::test]
async fn test_parallel_partial_failure() {
    let rail = MockRail::new().fail_lane(2);
    let h = harness(rail, 1_000_000, 100_000);
    let fps: Vec<Fingerprint> = (1..=5)
        .map(|n| register(&h.engine, n, 1_000, "0xowner"))
        .collect();

    let result = h
        .orchestrator
        .purchase(&fps, Strategy::Parallel, false)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.succeeded, 4);
    assert_eq!(result.failed, 1);
    assert!(result.items[2].is_failed());
    assert_eq!(h.log.all().unwrap().len(), 4);

    let payer = h.rail.sender().clone();
    assert!(!h.engine.has_valid_license(&payer, &fps[2]).await.unwrap());
    for fp in [fps[0], fps[1], fps[3], fps[4]] {
        assert!(h.engine.has_valid_license(&payer, &fp).await.unwrap());
    }
}

#[tokio::test]
async fn test_batch_all_or_nothing() {
    let rail = MockRail::new().fail_payee(Identity::new("0xbad"));
    let h = harness(rail, 1_000_000, 100_000);
    let good = register(&h.engine, 1, 1_000, "0xgood");
    let bad = register(&h.engine, 2, 1_000, "0xbad");

    let err = h
        .orchestrator
        .purchase(&[good, bad], Strategy::Batch, false)
        .await
        .unwrap_err();

    assert!(matches!(err, OpsError::BatchFailed { .. }));
    assert!(h.rail.settled().is_empty());
    assert!(h.log.all().unwrap().is_empty());
    assert_eq!(h.orchestrator.guard().spent().unwrap(), 0);

    let payer = h.rail.sender().clone();
    assert!(!h.engine.has_valid_license(&payer, &good).await.unwrap());
    assert_eq!(h.engine.content_info(&good).await.unwrap().access_count, 0);
}

#[tokio::test]
async fn test_rolling_window_reset() {
    let h = harness(MockRail::new(), 1_000, 1_000);
    let fp1 = register(&h.engine, 1, 800, "0xowner");
    let fp2 = register(&h.engine, 2, 800, "0xowner");

    h.orchestrator.purchase_one(&fp1, false).await.unwrap();
    assert!(h.orchestrator.purchase_one(&fp2, false).await.is_err());

    h.clock.advance(SPENDING_WINDOW_SECS);
    let result = h.orchestrator.purchase_one(&fp2, false).await.unwrap();
    assert!(result.success);
    assert_eq!(h.orchestrator.guard().spent().unwrap(), 800);
    assert_eq!(
        h.orchestrator.budget().unwrap().window_start,
        T0 + SPENDING_WINDOW_SECS
    );
}

#[tokio::test]
async fn test_license_expiry_allows_repurchase() {
    let h = harness(MockRail::new(), 1_000_000, 1_000);
    let fp1 = register(&h.engine, 1, 500, "0xowner");

    let first = h.orchestrator.purchase_one(&fp1, false).await.unwrap();
    let ItemStatus::Paid { expires_at, .. } = &first.items[0].status else {
        panic!("expected paid item");
    };

    h.clock.set(*expires_at);
    let second = h.orchestrator.purchase_one(&fp1, false).await.unwrap();
    assert_eq!(second.succeeded, 1);
}

#[tokio::test]
async fn test_stats_by_strategy() {
    let h = harness(MockRail::new(), 1_000_000, 1_000);
    let fps: Vec<Fingerprint> = (1..=4)
        .map(|n| register(&h.engine, n, 100, "0xowner"))
        .collect();

    h.orchestrator
        .purchase(&fps[..1], Strategy::Sequential, false)
        .await
        .unwrap();
    h.orchestrator
        .purchase(&fps[1..3], Strategy::Parallel, false)
        .await
        .unwrap();
    h.orchestrator
        .purchase(&fps[3..], Strategy::Batch, false)
        .await
        .unwrap();

    let stats = h.orchestrator.stats().unwrap();
    assert_eq!(stats.purchases, 4);
    assert_eq!(stats.total_spent, 400);
    assert_eq!(stats.by_strategy["parallel"].count, 2);
    assert_eq!(stats.by_strategy["batch"].amount, 100);
}

#[tokio::test]
async fn test_payee_is_content_owner() {
    let h = harness(MockRail::new(), 1_000_000, 1_000);
    let a = register(&h.engine, 1, 100, "0xalice");
    let b = register(&h.engine, 2, 100, "0xbob");

    h.orchestrator
        .purchase(&[a, b], Strategy::Sequential, false)
        .await
        .unwrap();

    let payees: Vec<String> = h
        .rail
        .settled()
        .iter()
        .map(|ix| ix.to.to_string())
        .collect();
    assert_eq!(payees, vec!["0xalice", "0xbob"]);
}

#[tokio::test]
async fn test_overlapping_purchases_pay_once() {
    let rail = MockRail::new().with_latency(Duration::from_millis(20));
    let h = harness(rail, 1_000_000, 1_000);
    let fp = register(&h.engine, 3, 500, "0xowner");

    let fps = [fp];
    let (first, second) = tokio::join!(
        h.orchestrator.purchase(&fps, Strategy::Parallel, false),
        h.orchestrator.purchase(&fps, Strategy::Parallel, false),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.succeeded + second.succeeded, 1);
    assert_eq!(first.skipped + second.skipped, 1);
    let skipped = if first.skipped == 1 { &first } else { &second };
    assert!(matches!(
        &skipped.items[0].status,
        ItemStatus::Skipped { reason } if reason == "purchase in progress"
    ));

    assert_eq!(h.rail.call_count(), 1);
    assert_eq!(h.log.all().unwrap().len(), 1);
    assert_eq!(h.orchestrator.guard().spent().unwrap(), 500);
    assert_eq!(h.engine.content_info(&fp).await.unwrap().access_count, 1);

    let again = h.orchestrator.purchase(&[fp], Strategy::Parallel, false).await.unwrap();
    assert!(matches!(
        &again.items[0].status,
        ItemStatus::Skipped { reason } if reason == "already licensed"
    ));
}
