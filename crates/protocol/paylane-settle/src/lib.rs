//! Payment rail surface for the Paylane protocol.
//!
//! This crate models the external instant-transfer primitive the payment
//! orchestrator settles through. It does not execute transfers itself.
//!
//! # Architecture
//!
//! ```text
//! paylane-ops                  paylane-settle
//! ┌──────────────────┐        ┌─────────────────────────┐
//! │ sequential       │        │ PaymentRail (trait)     │
//! │ parallel         │ ─────► │   ├─ HttpRail           │
//! │ batch            │        │   └─ MockRail (tests)   │
//! └──────────────────┘        └───────────┬─────────────┘
//!                                         │
//!                                         ▼
//!                             ┌─────────────────────────┐
//!                             │ rail gateway            │
//!                             └─────────────────────────┘
//! ```
//!
//! # Transfers
//!
//! Every [`TransferInstruction`] names a payee, an amount and a token, and
//! may carry a [`TrackingTag`] memo, a fee-sponsorship flag and a sequencing
//! lane. Transfers on distinct lanes need not be ordered relative to each
//! other.
//!
//! Batches are all-or-nothing. A batch carries one tagged sub-transfer per
//! item, so per-item audit tags survive atomic settlement, and the
//! [`BatchReceipt`] exposes one reference per sub-transfer.
//!
//! # Retries
//!
//! Nothing in this crate retries. A [`RailError::Network`] after submission
//! can hide a transfer that succeeded, so resubmitting risks paying twice.

pub mod config;
pub mod error;
pub mod http;
pub mod traits;
pub mod types;

pub use config::RailConfig;
pub use error::{RailError, RailResult};
pub use http::HttpRail;
pub use traits::PaymentRail;
pub use types::{BatchReceipt, TransferInstruction, TransferReceipt, TransferRef};

pub use paylane_types::TrackingTag;
