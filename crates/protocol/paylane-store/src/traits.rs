//! Trait definitions for storage components.
//!
//! Implementations may be in-memory or SQLite-backed but must satisfy these
//! contracts. Stores hold data only; pricing and ownership rules live in the
//! licensing engine.

use paylane_types::{
    Amount, ContentEntry, ContentFilter, Fingerprint, Identity, License, PurchaseRecord, Timestamp,
};

use crate::error::Result;

// =============================================================================
// Ledger
// =============================================================================

/// Content entries and licenses.
pub trait LedgerStore: Send {
    /// Insert a new content entry.
    ///
    /// Fails with `AlreadyExists` if the fingerprint is taken.
    fn insert_content(&mut self, entry: &ContentEntry) -> Result<()>;

    /// Load a content entry.
    fn get_content(&self, fingerprint: &Fingerprint) -> Result<Option<ContentEntry>>;

    /// Replace an existing content entry.
    ///
    /// Fails with `ContentNotFound` if absent.
    fn update_content(&mut self, entry: &ContentEntry) -> Result<()>;

    /// List entries matching the filter, oldest first.
    fn list_content(&self, filter: &ContentFilter) -> Result<Vec<ContentEntry>>;

    /// Insert or overwrite the license for (holder, fingerprint).
    fn put_license(&mut self, license: &License) -> Result<()>;

    /// Load the license for (holder, fingerprint), valid or not.
    fn get_license(&self, holder: &Identity, fingerprint: &Fingerprint) -> Result<Option<License>>;

    /// All licenses held by an identity.
    fn licenses_for(&self, holder: &Identity) -> Result<Vec<License>>;

    /// Record a license and the matching counter update in one step.
    ///
    /// The default writes the license then the entry. SQLite overrides this
    /// with a transaction.
    fn commit_license(&mut self, license: &License, entry: &ContentEntry) -> Result<()> {
        self.put_license(license)?;
        self.update_content(entry)
    }
}

// =============================================================================
// Purchase log
// =============================================================================

/// Append-only log of confirmed settlements.
pub trait PurchaseLog: Send {
    /// Append a record. There is no update or delete.
    fn append(&mut self, record: &PurchaseRecord) -> Result<()>;

    /// Every record, in append order.
    fn all(&self) -> Result<Vec<PurchaseRecord>>;

    /// Records paid by `payer`, in append order.
    fn for_payer(&self, payer: &Identity) -> Result<Vec<PurchaseRecord>>;

    /// Records for one piece of content, in append order.
    fn for_content(&self, fingerprint: &Fingerprint) -> Result<Vec<PurchaseRecord>>;

    /// Sum paid by `payer` at or after `since`.
    fn total_spent(&self, payer: &Identity, since: Timestamp) -> Result<Amount>;
}
