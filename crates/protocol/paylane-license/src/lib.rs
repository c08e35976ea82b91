//! Licensing engine for the Paylane protocol.
//!
//! The engine is the single authority over content entries and licenses:
//!
//! - **Registration**: create a priced entry for a fingerprint (once)
//! - **Owner mutations**: change price, toggle the active flag
//! - **License issuance**: record a 30-day license after a confirmed
//!   transfer, updating revenue and access counters
//! - **Queries**: license validity, content lookup, listings, stats
//!
//! Only `register_content`, `update_price`, `toggle_active` and
//! `record_license` change state.
//!
//! # Example
//!
//! ```
//! use paylane_license::LicensingEngine;
//! use paylane_store::MemoryLedgerStore;
//! use paylane_types::{Fingerprint, Identity};
//!
//! let engine = LicensingEngine::new(MemoryLedgerStore::new());
//! let fp = Fingerprint::of(b"dataset.csv");
//! let owner = Identity::new("0xowner");
//! let agent = Identity::new("0xagent");
//!
//! engine.register_content(fp, 50_000, "https://example.com/dataset.csv", &owner).unwrap();
//! assert!(!engine.has_valid_license(&agent, &fp).unwrap());
//!
//! engine.record_license(&agent, &fp, 50_000, "0xtransfer").unwrap();
//! assert!(engine.has_valid_license(&agent, &fp).unwrap());
//! ```

pub mod client;
pub mod engine;
pub mod error;

pub use client::{ContentInfo, LicensingClient};
pub use engine::{ContentStats, LedgerStats, LicensingEngine};
pub use error::{LicenseError, LicenseResult};
