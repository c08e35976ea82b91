//! External surface of the licensing engine.
//!
//! The payment orchestrator and the access gateway talk to the engine only
//! through [`LicensingClient`], so either can run in-process with a
//! [`LicensingEngine`] or against a remote one.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use paylane_store::LedgerStore;
use paylane_types::{Amount, Clock, ContentEntry, Fingerprint, Identity, License};

use crate::engine::LicensingEngine;
use crate::error::LicenseResult;

/// Public view of a content entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInfo {
    /// Content key.
    pub fingerprint: Fingerprint,
    /// Listed price.
    pub price: Amount,
    /// Payee for purchases.
    pub owner: Identity,
    /// Where the content lives.
    pub uri: String,
    /// Whether licenses can be issued.
    pub active: bool,
    /// Total paid for licenses.
    pub revenue: Amount,
    /// Licenses issued.
    pub access_count: u64,
}

impl From<ContentEntry> for ContentInfo {
    fn from(entry: ContentEntry) -> Self {
        Self {
            fingerprint: entry.fingerprint,
            price: entry.price,
            owner: entry.owner,
            uri: entry.uri,
            active: entry.active,
            revenue: entry.revenue,
            access_count: entry.access_count,
        }
    }
}

/// Operations other components may call on a licensing engine.
#[async_trait]
pub trait LicensingClient: Send + Sync {
    /// Look up content. Fails with `NotFound` for unknown fingerprints.
    async fn content_info(&self, fingerprint: &Fingerprint) -> LicenseResult<ContentInfo>;

    /// True iff `holder` has an active, unexpired license.
    async fn has_valid_license(
        &self,
        holder: &Identity,
        fingerprint: &Fingerprint,
    ) -> LicenseResult<bool>;

    /// Record a license for a confirmed transfer.
    async fn record_license(
        &self,
        holder: &Identity,
        fingerprint: &Fingerprint,
        price_paid: Amount,
        transfer_ref: &str,
    ) -> LicenseResult<License>;
}

#[async_trait]
impl<S, C> LicensingClient for LicensingEngine<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    async fn content_info(&self, fingerprint: &Fingerprint) -> LicenseResult<ContentInfo> {
        self.get_content(fingerprint).map(ContentInfo::from)
    }

    async fn has_valid_license(
        &self,
        holder: &Identity,
        fingerprint: &Fingerprint,
    ) -> LicenseResult<bool> {
        LicensingEngine::has_valid_license(self, holder, fingerprint)
    }

    async fn record_license(
        &self,
        holder: &Identity,
        fingerprint: &Fingerprint,
        price_paid: Amount,
        transfer_ref: &str,
    ) -> LicenseResult<License> {
        LicensingEngine::record_license(self, holder, fingerprint, price_paid, transfer_ref)
    }
}

#[async_trait]
impl<T: LicensingClient + ?Sized> LicensingClient for Arc<T> {
    async fn content_info(&self, fingerprint: &Fingerprint) -> LicenseResult<ContentInfo> {
        (**self).content_info(fingerprint).await
    }

    async fn has_valid_license(
        &self,
        holder: &Identity,
        fingerprint: &Fingerprint,
    ) -> LicenseResult<bool> {
        (**self).has_valid_license(holder, fingerprint).await
    }

    async fn record_license(
        &self,
        holder: &Identity,
        fingerprint: &Fingerprint,
        price_paid: Amount,
        transfer_ref: &str,
    ) -> LicenseResult<License> {
        (**self)
            .record_license(holder, fingerprint, price_paid, transfer_ref)
            .await
    }
}
