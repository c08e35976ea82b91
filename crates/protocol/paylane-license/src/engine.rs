//! The licensing engine.
//!
//! Registers content, issues licenses after confirmed transfers, and keeps
//! revenue and access counters. The engine owns its store for its whole
//! lifetime; every read and write goes through one mutex, so counter updates
//! from concurrent license issuance are serialized.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info};

use paylane_store::{LedgerStore, StoreError};
use paylane_types::{
    Amount, Clock, ContentEntry, ContentFilter, Fingerprint, Identity, License, SystemClock,
    Timestamp, MAX_URI_LENGTH, MIN_PRICE,
};

use crate::error::{LicenseError, LicenseResult};

/// Per-content counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    /// Current price.
    pub price: Amount,
    /// Total paid for licenses.
    pub revenue: Amount,
    /// Licenses issued.
    pub access_count: u64,
    /// Whether the content can be licensed.
    pub active: bool,
}

impl From<&ContentEntry> for ContentStats {
    fn from(entry: &ContentEntry) -> Self {
        Self {
            price: entry.price,
            revenue: entry.revenue,
            access_count: entry.access_count,
            active: entry.active,
        }
    }
}

/// Totals across the whole ledger, optionally for one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    /// Registered entries.
    pub content_count: u64,
    /// Entries currently active.
    pub active_count: u64,
    /// Sum of revenue.
    pub total_revenue: Amount,
    /// Sum of access counts.
    pub total_accesses: u64,
}

/// The authority over content entries and licenses.
pub struct LicensingEngine<S: LedgerStore, C: Clock = SystemClock> {
    store: Mutex<S>,
    clock: C,
}

impl<S: LedgerStore> LicensingEngine<S, SystemClock> {
    /// Create an engine over `store` using wall-clock time.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: LedgerStore, C: Clock> LicensingEngine<S, C> {
    /// Create an engine with an explicit time source.
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store: Mutex::new(store),
            clock,
        }
    }

    /// Shut the engine down and hand back its store.
    pub fn into_store(self) -> LicenseResult<S> {
        self.store
            .into_inner()
            .map_err(|_| LicenseError::lock_poisoned("ledger store lock poisoned"))
    }

    /// Current time as seen by the engine.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn store(&self) -> LicenseResult<MutexGuard<'_, S>> {
        self.store
            .lock()
            .map_err(|_| LicenseError::lock_poisoned("ledger store lock poisoned"))
    }

    fn load(store: &S, fingerprint: &Fingerprint) -> LicenseResult<ContentEntry> {
        store
            .get_content(fingerprint)?
            .ok_or(LicenseError::NotFound(*fingerprint))
    }

    fn load_owned(
        store: &S,
        fingerprint: &Fingerprint,
        caller: &Identity,
    ) -> LicenseResult<ContentEntry> {
        let entry = Self::load(store, fingerprint)?;
        if !entry.is_owned_by(caller) {
            return Err(LicenseError::NotOwner {
                fingerprint: *fingerprint,
                caller: caller.clone(),
            });
        }
        Ok(entry)
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Register new content.
    ///
    /// Fails with `AlreadyRegistered` if the fingerprint exists, and with a
    /// validation error for a zero price, an empty or oversized URI, or a
    /// blank owner.
    pub fn register_content(
        &self,
        fingerprint: Fingerprint,
        price: Amount,
        uri: &str,
        owner: &Identity,
    ) -> LicenseResult<ContentEntry> {
        validate_price(price)?;
        validate_uri(uri)?;
        if owner.is_blank() {
            return Err(LicenseError::invalid_identity("owner is empty"));
        }

        let entry = ContentEntry::new(fingerprint, price, uri, owner.clone(), self.now());
        let mut store = self.store()?;
        store.insert_content(&entry).map_err(|e| match e {
            StoreError::AlreadyExists(fp) => LicenseError::AlreadyRegistered(fp),
            other => other.into(),
        })?;

        info!(
            fingerprint = %fingerprint,
            owner = %owner,
            price,
            "Content registered"
        );
        Ok(entry)
    }

    /// Look up content.
    pub fn get_content(&self, fingerprint: &Fingerprint) -> LicenseResult<ContentEntry> {
        let store = self.store()?;
        Self::load(&store, fingerprint)
    }

    /// Change the price. Owner only; the old price stays on any failure.
    pub fn update_price(
        &self,
        fingerprint: &Fingerprint,
        new_price: Amount,
        caller: &Identity,
    ) -> LicenseResult<ContentEntry> {
        let mut store = self.store()?;
        let mut entry = Self::load_owned(&store, fingerprint, caller)?;
        validate_price(new_price)?;

        let old_price = entry.price;
        entry.price = new_price;
        entry.updated_at = self.now();
        store.update_content(&entry)?;

        info!(
            fingerprint = %fingerprint,
            old_price,
            new_price,
            "Price updated"
        );
        Ok(entry)
    }

    /// Flip the active flag. Owner only. Returns the new flag.
    pub fn toggle_active(&self, fingerprint: &Fingerprint, caller: &Identity) -> LicenseResult<bool> {
        let mut store = self.store()?;
        let mut entry = Self::load_owned(&store, fingerprint, caller)?;

        entry.active = !entry.active;
        entry.updated_at = self.now();
        store.update_content(&entry)?;

        info!(fingerprint = %fingerprint, active = entry.active, "Content toggled");
        Ok(entry.active)
    }

    /// List content matching `filter`, oldest first.
    pub fn list_content(&self, filter: &ContentFilter) -> LicenseResult<Vec<ContentEntry>> {
        let store = self.store()?;
        Ok(store.list_content(filter)?)
    }

    /// Counters for one entry.
    pub fn content_stats(&self, fingerprint: &Fingerprint) -> LicenseResult<ContentStats> {
        let entry = self.get_content(fingerprint)?;
        Ok(ContentStats::from(&entry))
    }

    /// Totals over every entry (or one owner's entries).
    pub fn ledger_stats(&self, owner: Option<&Identity>) -> LicenseResult<LedgerStats> {
        let mut filter = ContentFilter::new();
        if let Some(owner) = owner {
            filter = filter.with_owner(owner.clone());
        }

        let entries = self.list_content(&filter)?;
        Ok(entries.iter().fold(LedgerStats::default(), |mut acc, e| {
            acc.content_count += 1;
            acc.active_count += u64::from(e.active);
            acc.total_revenue = acc.total_revenue.saturating_add(e.revenue);
            acc.total_accesses = acc.total_accesses.saturating_add(e.access_count);
            acc
        }))
    }

    // =========================================================================
    // Licenses
    // =========================================================================

    /// Record a license after a confirmed transfer.
    ///
    /// This is the only way a license comes into existence. It overwrites any
    /// previous license for (holder, fingerprint) with a fresh 30-day expiry
    /// and adds `price_paid` to the entry's revenue and one to its access
    /// count, in one store commit.
    pub fn record_license(
        &self,
        holder: &Identity,
        fingerprint: &Fingerprint,
        price_paid: Amount,
        transfer_ref: &str,
    ) -> LicenseResult<License> {
        if holder.is_blank() {
            return Err(LicenseError::invalid_identity("holder is empty"));
        }
        validate_price(price_paid)?;
        if transfer_ref.trim().is_empty() {
            return Err(LicenseError::MissingTransferRef);
        }

        let mut store = self.store()?;
        let mut entry = Self::load(&store, fingerprint)?;
        if !entry.active {
            return Err(LicenseError::Inactive(*fingerprint));
        }

        let now = self.now();
        entry
            .record_access(price_paid)
            .ok_or(LicenseError::Overflow(*fingerprint))?;
        entry.updated_at = now;

        let license = License::issue(holder.clone(), *fingerprint, price_paid, transfer_ref, now);
        store.commit_license(&license, &entry)?;

        info!(
            fingerprint = %fingerprint,
            holder = %holder,
            price_paid,
            transfer_ref,
            expires_at = license.expires_at,
            access_count = entry.access_count,
            "License recorded"
        );
        Ok(license)
    }

    /// True iff `holder` has an active, unexpired license. No side effects.
    pub fn has_valid_license(
        &self,
        holder: &Identity,
        fingerprint: &Fingerprint,
    ) -> LicenseResult<bool> {
        let valid = self
            .get_license(holder, fingerprint)?
            .is_some_and(|l| l.is_valid_at(self.now()));
        debug!(fingerprint = %fingerprint, holder = %holder, valid, "License checked");
        Ok(valid)
    }

    /// The stored license, valid or not.
    pub fn get_license(
        &self,
        holder: &Identity,
        fingerprint: &Fingerprint,
    ) -> LicenseResult<Option<License>> {
        let store = self.store()?;
        Ok(store.get_license(holder, fingerprint)?)
    }

    /// Every license `holder` has been issued.
    pub fn licenses_for(&self, holder: &Identity) -> LicenseResult<Vec<License>> {
        let store = self.store()?;
        Ok(store.licenses_for(holder)?)
    }
}

fn validate_price(price: Amount) -> LicenseResult<()> {
    if price < MIN_PRICE {
        return Err(LicenseError::InvalidPrice(price));
    }
    Ok(())
}

fn validate_uri(uri: &str) -> LicenseResult<()> {
    if uri.trim().is_empty() {
        return Err(LicenseError::invalid_uri("uri is empty"));
    }
    if uri.len() > MAX_URI_LENGTH {
        return Err(LicenseError::invalid_uri(format!(
            "uri is {} bytes, limit is {}",
            uri.len(),
            MAX_URI_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use paylane_store::MemoryLedgerStore;
    use paylane_test_utils::{test_fingerprint, ManualClock, T0};
    use paylane_types::LICENSE_DURATION_SECS;

    fn engine() -> (LicensingEngine<MemoryLedgerStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new(T0);
        (
            LicensingEngine::with_clock(MemoryLedgerStore::new(), clock.clone()),
            clock,
        )
    }

    fn alice() -> Identity {
        Identity::new("alice")
    }

    #[test]
    fn test_register_and_get() {
        let (engine, _) = engine();
        let fp = test_fingerprint(1);
        let entry = engine
            .register_content(fp, 50_000, "https://x/1", &alice())
            .unwrap();
        assert!(entry.active);
        assert_eq!(entry.created_at, T0);
        assert_eq!(engine.get_content(&fp).unwrap(), entry);
    }

    #[test]
    fn test_register_duplicate() {
        let (engine, _) = engine();
        let fp = test_fingerprint(1);
        engine.register_content(fp, 1, "u", &alice()).unwrap();
        assert!(matches!(
            engine.register_content(fp, 2, "u", &Identity::new("bob")),
            Err(LicenseError::AlreadyRegistered(_))
        ));
        // first registration wins
        assert_eq!(engine.get_content(&fp).unwrap().owner, alice());
    }

    #[test]
    fn test_register_validation() {
        let (engine, _) = engine();
        let fp = test_fingerprint(1);
        assert!(matches!(
            engine.register_content(fp, 0, "u", &alice()),
            Err(LicenseError::InvalidPrice(0))
        ));
        assert!(matches!(
            engine.register_content(fp, 1, " ", &alice()),
            Err(LicenseError::InvalidUri(_))
        ));
        let long = "a".repeat(MAX_URI_LENGTH + 1);
        assert!(matches!(
            engine.register_content(fp, 1, &long, &alice()),
            Err(LicenseError::InvalidUri(_))
        ));
        assert!(matches!(
            engine.register_content(fp, 1, "u", &Identity::new("")),
            Err(LicenseError::InvalidIdentity(_))
        ));
        assert!(engine.get_content(&fp).unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_price() {
        let (engine, clock) = engine();
        let fp = test_fingerprint(1);
        engine.register_content(fp, 100, "u", &alice()).unwrap();

        clock.advance(10);
        let entry = engine.update_price(&fp, 250, &alice()).unwrap();
        assert_eq!(entry.price, 250);
        assert_eq!(entry.updated_at, T0 + 10);

        assert!(matches!(
            engine.update_price(&fp, 0, &alice()),
            Err(LicenseError::InvalidPrice(0))
        ));
        assert!(matches!(
            engine.update_price(&fp, 300, &Identity::new("mallory")),
            Err(LicenseError::NotOwner { .. })
        ));
        assert_eq!(engine.get_content(&fp).unwrap().price, 250);
    }

    #[test]
    fn test_toggle_active() {
        let (engine, _) = engine();
        let fp = test_fingerprint(1);
        engine.register_content(fp, 100, "u", &alice()).unwrap();

        assert!(!engine.toggle_active(&fp, &alice()).unwrap());
        assert!(engine.toggle_active(&fp, &alice()).unwrap());
        assert!(matches!(
            engine.toggle_active(&fp, &Identity::new("bob")),
            Err(LicenseError::NotOwner { .. })
        ));
        assert!(matches!(
            engine.toggle_active(&test_fingerprint(9), &alice()),
            Err(LicenseError::NotFound(_))
        ));
    }

    #[test]
    fn test_record_license_updates_counters() {
        let (engine, _) = engine();
        let fp = test_fingerprint(1);
        let agent = Identity::new("agent");
        engine.register_content(fp, 500, "u", &alice()).unwrap();

        let license = engine.record_license(&agent, &fp, 500, "0xref").unwrap();
        assert_eq!(license.expires_at, T0 + LICENSE_DURATION_SECS);
        assert!(engine.has_valid_license(&agent, &fp).unwrap());

        let stats = engine.content_stats(&fp).unwrap();
        assert_eq!(stats.revenue, 500);
        assert_eq!(stats.access_count, 1);
    }

    #[test]
    fn test_record_license_rejections() {
        let (engine, _) = engine();
        let fp = test_fingerprint(1);
        let agent = Identity::new("agent");

        assert!(matches!(
            engine.record_license(&agent, &fp, 5, "r"),
            Err(LicenseError::NotFound(_))
        ));

        engine.register_content(fp, 5, "u", &alice()).unwrap();
        assert!(matches!(
            engine.record_license(&agent, &fp, 5, ""),
            Err(LicenseError::MissingTransferRef)
        ));
        assert!(matches!(
            engine.record_license(&agent, &fp, 0, "r"),
            Err(LicenseError::InvalidPrice(0))
        ));

        engine.toggle_active(&fp, &alice()).unwrap();
        assert!(matches!(
            engine.record_license(&agent, &fp, 5, "r"),
            Err(LicenseError::Inactive(_))
        ));
        assert_eq!(engine.content_stats(&fp).unwrap().access_count, 0);
        assert!(engine.get_license(&agent, &fp).unwrap().is_none());
    }

    #[test]
    fn test_expiry_is_strict() {
        let (engine, clock) = engine();
        let fp = test_fingerprint(1);
        let agent = Identity::new("agent");
        engine.register_content(fp, 5, "u", &alice()).unwrap();
        engine.record_license(&agent, &fp, 5, "r").unwrap();

        clock.advance(LICENSE_DURATION_SECS - 1);
        assert!(engine.has_valid_license(&agent, &fp).unwrap());
        clock.advance(1);
        assert!(!engine.has_valid_license(&agent, &fp).unwrap());
        // still stored, just invalid
        assert!(engine.get_license(&agent, &fp).unwrap().is_some());
    }

    #[test]
    fn test_repurchase_resets_expiry() {
        let (engine, clock) = engine();
        let fp = test_fingerprint(1);
        let agent = Identity::new("agent");
        engine.register_content(fp, 5, "u", &alice()).unwrap();
        engine.record_license(&agent, &fp, 5, "r1").unwrap();

        clock.advance(10 * 86_400);
        let renewed = engine.record_license(&agent, &fp, 5, "r2").unwrap();
        // reset from now, not stacked on the old expiry
        assert_eq!(renewed.expires_at, T0 + 10 * 86_400 + LICENSE_DURATION_SECS);
        assert_eq!(engine.licenses_for(&agent).unwrap().len(), 1);
        assert_eq!(engine.content_stats(&fp).unwrap().access_count, 2);
    }

    #[test]
    fn test_ledger_stats() {
        let (engine, _) = engine();
        let bob = Identity::new("bob");
        engine.register_content(test_fingerprint(1), 5, "u", &alice()).unwrap();
        engine.register_content(test_fingerprint(2), 7, "u", &bob).unwrap();
        engine
            .record_license(&Identity::new("agent"), &test_fingerprint(2), 7, "r")
            .unwrap();

        let all = engine.ledger_stats(None).unwrap();
        assert_eq!(all.content_count, 2);
        assert_eq!(all.total_revenue, 7);

        let bobs = engine.ledger_stats(Some(&bob)).unwrap();
        assert_eq!(bobs.content_count, 1);
        assert_eq!(bobs.total_accesses, 1);
    }

    #[test]
    fn test_into_store() {
        let (engine, _) = engine();
        engine.register_content(test_fingerprint(1), 5, "u", &alice()).unwrap();
        let store = engine.into_store().unwrap();
        assert_eq!(store.content_count(), 1);
    }
}
