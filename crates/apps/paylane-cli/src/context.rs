//! Shared state for CLI commands.

use std::sync::Arc;

use tracing::debug;

use paylane_gate::{AcceptAll, AccessGateway, KeyedDigestVerifier, ProofVerifier};
use paylane_license::LicensingEngine;
use paylane_ops::{PaymentOrchestrator, SpendingGuard};
use paylane_settle::{HttpRail, PaymentRail};
use paylane_store::{LedgerDatabase, SqliteLedgerStore, SqlitePurchaseLog};
use paylane_types::Identity;

use crate::config::CliConfig;
use crate::error::CliResult;

/// Licensing engine over the on-disk ledger.
pub type Engine = LicensingEngine<SqliteLedgerStore>;

/// Orchestrator over the on-disk ledger and purchase log.
pub type Orchestrator<R> = PaymentOrchestrator<Arc<Engine>, R, SqlitePurchaseLog>;

/// Gateway with the configured proof verifier.
pub type Gateway = AccessGateway<Arc<Engine>, Box<dyn ProofVerifier>>;

/// Opened database and engine for one command.
pub struct AppContext {
    /// Loaded configuration.
    pub config: CliConfig,
    /// Licensing engine.
    pub engine: Arc<Engine>,
    db: LedgerDatabase,
}

impl AppContext {
    /// Open the ledger database named by the configuration.
    pub fn open(config: CliConfig) -> CliResult<Self> {
        let store_config = config.store_config();
        let db = LedgerDatabase::open(&store_config)?;
        debug!(path = %store_config.database_path().display(), "Ledger opened");

        let engine = Arc::new(LicensingEngine::new(db.ledger()));
        Ok(Self { config, engine, db })
    }

    /// The configured agent.
    pub fn agent(&self) -> CliResult<Identity> {
        self.config.agent()
    }

    /// Token prices are quoted in.
    pub fn token(&self) -> &str {
        &self.config.rail.token
    }

    /// Orchestrator paying through the configured HTTP rail.
    pub fn orchestrator(&self) -> CliResult<Orchestrator<HttpRail>> {
        let rail = HttpRail::new(&self.config.rail_config()?)?;
        self.orchestrator_with(rail)
    }

    /// Orchestrator paying through `rail`, with its budget restored from
    /// the purchase log.
    pub fn orchestrator_with<R: PaymentRail>(&self, rail: R) -> CliResult<Orchestrator<R>> {
        let guard = SpendingGuard::new(self.agent()?, self.config.spending_limits());
        let orchestrator = PaymentOrchestrator::new(
            Arc::clone(&self.engine),
            rail,
            self.db.purchases(),
            guard,
            self.config.orchestrator_config(),
        )?;

        let restored = orchestrator.restore_budget()?;
        debug!(payer = %orchestrator.payer(), restored, "Budget restored");
        Ok(orchestrator)
    }

    /// Access gateway over the ledger.
    pub fn gateway(&self) -> Gateway {
        let verifier: Box<dyn ProofVerifier> = match &self.config.gate.proof_secret {
            Some(secret) => Box::new(KeyedDigestVerifier::new(secret)),
            None => Box::new(AcceptAll),
        };
        AccessGateway::with_verifier(
            Arc::clone(&self.engine),
            verifier,
            self.config.gate_config(),
        )
    }
}
