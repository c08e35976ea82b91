//! Access gateway policy.
//!
//! Decision order for a request:
//! 1. Unknown fingerprint → `NotFound`
//! 2. Inactive entry → `Forbidden`
//! 3. Gate disabled or human caller → `Allowed`
//! 4. Agent whose proof fails the verifier → `Forbidden`
//! 5. Agent holding a valid license → `Allowed`
//! 6. Anything else → `PaymentRequired`

use tracing::debug;

use paylane_license::{ContentInfo, LicenseError, LicensingClient};
use paylane_types::LICENSE_DURATION_SECS;

use crate::config::GateConfig;
use crate::error::GateResult;
use crate::types::{AccessDecision, AccessRequest, CallerKind, PaymentInstructions};
use crate::verifier::{AcceptAll, ProofVerifier};

/// Decides whether a request may receive content.
pub struct AccessGateway<L, V = AcceptAll>
where
    L: LicensingClient,
    V: ProofVerifier,
{
    licensing: L,
    verifier: V,
    config: GateConfig,
}

impl<L: LicensingClient> AccessGateway<L, AcceptAll> {
    /// Create a gateway that does not check caller proofs.
    pub fn new(licensing: L, config: GateConfig) -> Self {
        Self::with_verifier(licensing, AcceptAll, config)
    }
}

impl<L, V> AccessGateway<L, V>
where
    L: LicensingClient,
    V: ProofVerifier,
{
    /// Create a gateway with a proof verifier.
    pub fn with_verifier(licensing: L, verifier: V, config: GateConfig) -> Self {
        Self {
            licensing,
            verifier,
            config,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide a request.
    pub async fn decide(&self, request: &AccessRequest) -> GateResult<AccessDecision> {
        let fingerprint = &request.fingerprint;

        let info = match self.licensing.content_info(fingerprint).await {
            Ok(info) => info,
            Err(LicenseError::NotFound(_)) => {
                debug!(fingerprint = %fingerprint, "Access denied: not found");
                return Ok(AccessDecision::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        if !info.active {
            debug!(fingerprint = %fingerprint, "Access denied: inactive");
            return Ok(AccessDecision::Forbidden);
        }

        if !self.config.enabled {
            return Ok(AccessDecision::Allowed { uri: info.uri });
        }

        let Some(caller) = &request.caller else {
            return Ok(self.payment_required(info));
        };

        if caller.kind == CallerKind::Human {
            debug!(
                fingerprint = %fingerprint,
                caller = %caller.identity,
                "Human caller, no payment"
            );
            return Ok(AccessDecision::Allowed { uri: info.uri });
        }

        if !self
            .verifier
            .verify(&caller.identity, caller.proof.as_deref())
        {
            debug!(
                fingerprint = %fingerprint,
                caller = %caller.identity,
                "Access denied: proof rejected"
            );
            return Ok(AccessDecision::Forbidden);
        }

        if self
            .licensing
            .has_valid_license(&caller.identity, fingerprint)
            .await?
        {
            debug!(fingerprint = %fingerprint, caller = %caller.identity, "Licensed");
            return Ok(AccessDecision::Allowed { uri: info.uri });
        }

        Ok(self.payment_required(info))
    }

    fn payment_required(&self, info: ContentInfo) -> AccessDecision {
        debug!(fingerprint = %info.fingerprint, price = info.price, "Payment required");
        AccessDecision::PaymentRequired {
            price: info.price,
            instructions: PaymentInstructions {
                pay_to: info.owner,
                amount: info.price,
                token: self.config.token.clone(),
                fingerprint: info.fingerprint,
                network: self.config.network.clone(),
                license_secs: LICENSE_DURATION_SECS,
            },
        }
    }
}
