//! Concurrent license issuance against one entry.

use std::sync::Arc;
use std::thread;

use paylane_license::LicensingEngine;
use paylane_store::{LedgerDatabase, MemoryLedgerStore, StoreConfig};
use paylane_test_utils::{test_fingerprint, ManualClock, T0};
use paylane_types::Identity;
use tempfile::TempDir;

const BUYERS: usize = 16;

#[test]
fn test_concurrent_purchases_serialize_counters() {
    let engine = Arc::new(LicensingEngine::with_clock(
        MemoryLedgerStore::new(),
        ManualClock::new(T0),
    ));
    let fp = test_fingerprint(1);
    engine
        .register_content(fp, 1_000, "https://x", &Identity::new("owner"))
        .unwrap();

    let handles: Vec<_> = (0..BUYERS)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let buyer = Identity::new(format!("agent-{i}"));
                engine
                    .record_license(&buyer, &fp, 1_000, &format!("0xref{i}"))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = engine.content_stats(&fp).unwrap();
    assert_eq!(stats.access_count, BUYERS as u64);
    assert_eq!(stats.revenue, 1_000 * BUYERS as u64);
}

#[test]
fn test_engine_over_sqlite() {
    let temp_dir = TempDir::new().unwrap();
    let db = LedgerDatabase::open(&StoreConfig::new(temp_dir.path())).unwrap();
    let engine = Arc::new(LicensingEngine::with_clock(db.ledger(), ManualClock::new(T0)));
    let fp = test_fingerprint(2);
    engine
        .register_content(fp, 500, "https://x", &Identity::new("owner"))
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine
                    .record_license(&Identity::new(format!("agent-{i}")), &fp, 500, "0xr")
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // a second handle on the same file sees the committed counters
    let entry = paylane_store::LedgerStore::get_content(&db.ledger(), &fp)
        .unwrap()
        .unwrap();
    assert_eq!(entry.access_count, 4);
    assert_eq!(entry.revenue, 2_000);
}
