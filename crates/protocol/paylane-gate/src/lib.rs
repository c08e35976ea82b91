//! Access gateway for Paylane-licensed content.
//!
//! The gateway sits in front of content and decides, per request, whether
//! to serve it, ask for payment, or refuse. It holds no state of its own:
//! content and license lookups go to a
//! [`LicensingClient`](paylane_license::LicensingClient), and caller proofs
//! to a [`ProofVerifier`].
//!
//! A `PaymentRequired` decision carries [`PaymentInstructions`] that encode
//! into an `X-PAYMENT-REQUIRED` header for HTTP front ends.
//!
//! ```
//! use paylane_gate::{AccessGateway, AccessRequest, Caller, GateConfig};
//! use paylane_license::LicensingEngine;
//! use paylane_store::MemoryLedgerStore;
//! use paylane_types::{Fingerprint, Identity};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = LicensingEngine::new(MemoryLedgerStore::new());
//! let fp = Fingerprint::of(b"report.pdf");
//! let owner = Identity::new("0xowner");
//! engine.register_content(fp, 1_000, "https://example.com/report.pdf", &owner)?;
//!
//! let gateway = AccessGateway::new(engine, GateConfig::default());
//! let request = AccessRequest::from_caller(fp, Caller::agent(Identity::new("0xagent")));
//! let decision = gateway.decide(&request).await?;
//! assert_eq!(decision.status_code(), 402);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod types;
pub mod verifier;

pub use config::GateConfig;
pub use error::{GateError, GateResult};
pub use gateway::AccessGateway;
pub use types::{
    AccessDecision, AccessRequest, Caller, CallerKind, PaymentInstructions, DEFAULT_NETWORK,
    HEADER_PAYMENT_REQUIRED,
};
pub use verifier::{AcceptAll, KeyedDigestVerifier, ProofVerifier};
