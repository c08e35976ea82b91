//! In-memory stores.
//!
//! Used by tests and by engines that need no persistence. Content keeps
//! registration order so listings match the SQLite ordering.

use std::collections::HashMap;

use paylane_types::{
    Amount, ContentEntry, ContentFilter, Fingerprint, Identity, License, PurchaseRecord, Timestamp,
};

use crate::error::{Result, StoreError};
use crate::traits::{LedgerStore, PurchaseLog};

/// HashMap-backed ledger.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    content: HashMap<Fingerprint, ContentEntry>,
    order: Vec<Fingerprint>,
    licenses: HashMap<(Identity, Fingerprint), License>,
}

impl MemoryLedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered entries.
    pub fn content_count(&self) -> usize {
        self.content.len()
    }

    /// Number of stored licenses.
    pub fn license_count(&self) -> usize {
        self.licenses.len()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn insert_content(&mut self, entry: &ContentEntry) -> Result<()> {
        if self.content.contains_key(&entry.fingerprint) {
            return Err(StoreError::AlreadyExists(entry.fingerprint));
        }
        self.order.push(entry.fingerprint);
        self.content.insert(entry.fingerprint, entry.clone());
        Ok(())
    }

    fn get_content(&self, fingerprint: &Fingerprint) -> Result<Option<ContentEntry>> {
        Ok(self.content.get(fingerprint).cloned())
    }

    fn update_content(&mut self, entry: &ContentEntry) -> Result<()> {
        match self.content.get_mut(&entry.fingerprint) {
            Some(existing) => {
                *existing = entry.clone();
                Ok(())
            }
            None => Err(StoreError::ContentNotFound(entry.fingerprint)),
        }
    }

    fn list_content(&self, filter: &ContentFilter) -> Result<Vec<ContentEntry>> {
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(self
            .order
            .iter()
            .filter_map(|fp| self.content.get(fp))
            .filter(|entry| filter.matches(entry))
            .take(limit)
            .cloned()
            .collect())
    }

    fn put_license(&mut self, license: &License) -> Result<()> {
        self.licenses.insert(
            (license.holder.clone(), license.fingerprint),
            license.clone(),
        );
        Ok(())
    }

    fn get_license(&self, holder: &Identity, fingerprint: &Fingerprint) -> Result<Option<License>> {
        Ok(self.licenses.get(&(holder.clone(), *fingerprint)).cloned())
    }

    fn licenses_for(&self, holder: &Identity) -> Result<Vec<License>> {
        let mut licenses: Vec<License> = self
            .licenses
            .values()
            .filter(|l| &l.holder == holder)
            .cloned()
            .collect();
        licenses.sort_by_key(|l| (l.issued_at, l.fingerprint));
        Ok(licenses)
    }

    fn commit_license(&mut self, license: &License, entry: &ContentEntry) -> Result<()> {
        // Check first so a missing entry leaves no orphan license behind.
        if !self.content.contains_key(&entry.fingerprint) {
            return Err(StoreError::ContentNotFound(entry.fingerprint));
        }
        self.put_license(license)?;
        self.update_content(entry)
    }
}

/// Vec-backed purchase log.
#[derive(Debug, Default)]
pub struct MemoryPurchaseLog {
    records: Vec<PurchaseRecord>,
}

impl MemoryPurchaseLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PurchaseLog for MemoryPurchaseLog {
    fn append(&mut self, record: &PurchaseRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn all(&self) -> Result<Vec<PurchaseRecord>> {
        Ok(self.records.clone())
    }

    fn for_payer(&self, payer: &Identity) -> Result<Vec<PurchaseRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| &r.payer == payer)
            .cloned()
            .collect())
    }

    fn for_content(&self, fingerprint: &Fingerprint) -> Result<Vec<PurchaseRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| &r.fingerprint == fingerprint)
            .cloned()
            .collect())
    }

    fn total_spent(&self, payer: &Identity, since: Timestamp) -> Result<Amount> {
        Ok(self
            .records
            .iter()
            .filter(|r| &r.payer == payer && r.timestamp >= since)
            .fold(0, |acc: Amount, r| acc.saturating_add(r.price)))
    }
}
