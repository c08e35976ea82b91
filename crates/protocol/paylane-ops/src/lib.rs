//! Payment orchestration for the Paylane protocol.
//!
//! This crate runs on the paying agent's side. It turns a list of content
//! fingerprints into confirmed transfers and recorded licenses:
//!
//! ```text
//! purchase(fps, strategy, force)
//!   │
//!   ├─ plan: dedupe, item limit, skip already-licensed content
//!   ├─ resolve: price and payee from the licensing engine
//!   ├─ SpendingGuard: per-item and rolling daily ceilings
//!   ├─ PaymentRail: sequential | parallel | batch
//!   └─ on confirmation: record license, append PurchaseRecord
//! ```
//!
//! # Strategies
//!
//! | Strategy     | Budget check      | Rail call              | Partial failure          |
//! |--------------|-------------------|------------------------|--------------------------|
//! | `Sequential` | per item          | one transfer at a time | failed item only         |
//! | `Parallel`   | request total     | concurrent, one lane each | failed item only      |
//! | `Batch`      | request total     | one atomic batch       | whole call, nothing recorded |
//!
//! The orchestrator never retries a transfer and imposes no timeout of its
//! own; a reservation is released only when the rail definitely did not
//! move money.

pub mod batch;
pub mod config;
pub mod error;
pub mod guard;
pub mod orchestrator;
pub mod parallel;
pub mod result;
pub mod sequential;

pub use config::OrchestratorConfig;
pub use error::{OpsError, OpsResult};
pub use guard::{BudgetError, BudgetStatus, Reservation, SpendingGuard, SpendingLimits};
pub use orchestrator::PaymentOrchestrator;
pub use result::{ItemOutcome, ItemStatus, PurchaseResult, PurchaseStats, StrategyStats};

pub use paylane_types::Strategy;
