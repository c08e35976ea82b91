//! Caller proof verification.
//!
//! The gateway never interprets proofs itself; it asks a [`ProofVerifier`].

use sha2::{Digest, Sha256};

use paylane_types::Identity;

/// Checks that a caller controls the identity it claims.
pub trait ProofVerifier: Send + Sync {
    /// True if `proof` is acceptable for `identity`.
    fn verify(&self, identity: &Identity, proof: Option<&str>) -> bool;
}

/// Accepts every caller, with or without a proof.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ProofVerifier for AcceptAll {
    fn verify(&self, _identity: &Identity, _proof: Option<&str>) -> bool {
        true
    }
}

/// Proofs issued by the operator: `hex(SHA-256(secret || identity))`.
///
/// A missing proof never verifies.
#[derive(Clone)]
pub struct KeyedDigestVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for KeyedDigestVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedDigestVerifier").finish_non_exhaustive()
    }
}

impl KeyedDigestVerifier {
    /// Create a verifier for `secret`.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// The proof this verifier expects from `identity`.
    pub fn issue(&self, identity: &Identity) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(identity.as_str().as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl ProofVerifier for KeyedDigestVerifier {
    fn verify(&self, identity: &Identity, proof: Option<&str>) -> bool {
        match proof {
            Some(proof) => proof.trim().eq_ignore_ascii_case(&self.issue(identity)),
            None => false,
        }
    }
}

impl<T: ProofVerifier + ?Sized> ProofVerifier for std::sync::Arc<T> {
    fn verify(&self, identity: &Identity, proof: Option<&str>) -> bool {
        (**self).verify(identity, proof)
    }
}

impl<T: ProofVerifier + ?Sized> ProofVerifier for Box<T> {
    fn verify(&self, identity: &Identity, proof: Option<&str>) -> bool {
        (**self).verify(identity, proof)
    }
}
