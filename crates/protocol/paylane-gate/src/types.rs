//! Gateway request and decision types.

use serde::{Deserialize, Serialize};

use paylane_types::{Amount, Fingerprint, Identity, Timestamp};

use crate::error::{GateError, GateResult};

/// HTTP header carrying [`PaymentInstructions`] on a payment-required response.
pub const HEADER_PAYMENT_REQUIRED: &str = "X-PAYMENT-REQUIRED";

/// Default settlement network name.
pub const DEFAULT_NETWORK: &str = "paylane:testnet";

// =============================================================================
// Requests
// =============================================================================

/// Who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerKind {
    /// A person. Never asked to pay.
    Human,
    /// An automated client.
    Agent,
}

/// A caller identity with an optional proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Claimed identity.
    pub identity: Identity,
    /// Human or agent.
    pub kind: CallerKind,
    /// Proof that the caller controls `identity`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,
}

impl Caller {
    /// An automated caller.
    pub fn agent(identity: Identity) -> Self {
        Self {
            identity,
            kind: CallerKind::Agent,
            proof: None,
        }
    }

    /// A human caller.
    pub fn human(identity: Identity) -> Self {
        Self {
            identity,
            kind: CallerKind::Human,
            proof: None,
        }
    }

    /// Attach a proof.
    pub fn with_proof(mut self, proof: impl Into<String>) -> Self {
        self.proof = Some(proof.into());
        self
    }
}

/// A request for content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Requested content.
    pub fingerprint: Fingerprint,
    /// Caller, if identified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<Caller>,
}

impl AccessRequest {
    /// Anonymous request.
    pub fn anonymous(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            caller: None,
        }
    }

    /// Request from a caller.
    pub fn from_caller(fingerprint: Fingerprint, caller: Caller) -> Self {
        Self {
            fingerprint,
            caller: Some(caller),
        }
    }
}

// =============================================================================
// Decisions
// =============================================================================

/// How to pay for a license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstructions {
    /// Content owner to pay.
    pub pay_to: Identity,
    /// Listed price in the smallest unit.
    pub amount: Amount,
    /// Token symbol.
    pub token: String,
    /// Content being licensed.
    pub fingerprint: Fingerprint,
    /// Settlement network.
    pub network: String,
    /// License duration bought by the payment.
    pub license_secs: Timestamp,
}

impl PaymentInstructions {
    /// Encode as a base64 JSON header value.
    pub fn to_header(&self) -> GateResult<String> {
        use base64::Engine as _;
        let json = serde_json::to_vec(self).map_err(|e| GateError::Encode {
            reason: e.to_string(),
        })?;
        Ok(base64::engine::general_purpose::STANDARD.encode(json))
    }

    /// Decode a header value produced by [`to_header`](Self::to_header).
    pub fn from_header(value: &str) -> GateResult<Self> {
        use base64::Engine as _;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(value.trim())
            .map_err(|e| GateError::MalformedHeader {
                reason: format!("base64 decode error: {}", e),
            })?;
        serde_json::from_slice(&decoded).map_err(|e| GateError::MalformedHeader {
            reason: format!("JSON parse error: {}", e),
        })
    }
}

/// Gateway verdict for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Serve the content.
    Allowed {
        /// Content locator.
        uri: String,
    },
    /// The caller must buy a license first.
    PaymentRequired {
        /// Listed price.
        price: Amount,
        /// How to pay.
        instructions: PaymentInstructions,
    },
    /// Unknown fingerprint.
    NotFound,
    /// Inactive content or a failed caller proof.
    Forbidden,
}

impl AccessDecision {
    /// HTTP status equivalent.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Allowed { .. } => 200,
            Self::PaymentRequired { .. } => 402,
            Self::NotFound => 404,
            Self::Forbidden => 403,
        }
    }

    /// True if the content may be served.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Header name and value to send with a payment-required response.
    pub fn payment_header(&self) -> GateResult<Option<(&'static str, String)>> {
        match self {
            Self::PaymentRequired { instructions, .. } => {
                Ok(Some((HEADER_PAYMENT_REQUIRED, instructions.to_header()?)))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paylane_types::LICENSE_DURATION_SECS;

    fn instructions() -> PaymentInstructions {
        PaymentInstructions {
            pay_to: Identity::new("0xowner"),
            amount: 50_000,
            token: "USDC".to_string(),
            fingerprint: Fingerprint::of(b"dataset"),
            network: DEFAULT_NETWORK.to_string(),
            license_secs: LICENSE_DURATION_SECS,
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let original = instructions();
        let header = original.to_header().unwrap();
        assert_eq!(PaymentInstructions::from_header(&header).unwrap(), original);
    }

    #[test]
    fn test_header_is_camel_case_json() {
        use base64::Engine as _;
        let header = instructions().to_header().unwrap();
        let json = base64::engine::general_purpose::STANDARD
            .decode(header)
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["payTo"], "0xowner");
        assert_eq!(value["licenseSecs"], LICENSE_DURATION_SECS);
    }

    #[test]
    fn test_malformed_header() {
        assert!(matches!(
            PaymentInstructions::from_header("not base64!"),
            Err(GateError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn test_status_codes() {
        let decision = AccessDecision::PaymentRequired {
            price: 1,
            instructions: instructions(),
        };
        assert_eq!(decision.status_code(), 402);
        let (name, _) = decision.payment_header().unwrap().unwrap();
        assert_eq!(name, HEADER_PAYMENT_REQUIRED);

        assert_eq!(AccessDecision::NotFound.status_code(), 404);
        assert!(AccessDecision::NotFound.payment_header().unwrap().is_none());
        assert_eq!(AccessDecision::Forbidden.status_code(), 403);
    }
}
