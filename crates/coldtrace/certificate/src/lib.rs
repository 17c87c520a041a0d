//! Coldtrace Certificate - stateless certificate protocol.
//!
//! A certifying authority signs the canonical message of a batch. A stored
//! certificate is valid iff the signer recovered from its signature equals
//! the claimed authority and that authority is currently registered.
//! Verification is a total predicate: it never errors and never caches.

#![deny(unsafe_code)]

use coldtrace_authority::AuthorityRegistry;
use coldtrace_crypto::{AuthorityKeypair, Ed25519Scheme, SignatureScheme};
use coldtrace_types::{Address, BatchId, Certificate, ContentHash};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Domain prefix of every certified message.
pub const CERTIFICATE_DOMAIN: &str = "Organically certified batch ID ";

/// Canonical message an authority signs for a batch.
pub fn canonical_message(batch_id: &BatchId) -> Vec<u8> {
    format!("{CERTIFICATE_DOMAIN}{batch_id}").into_bytes()
}

/// Digest of the canonical message, recorded in the certificate.
pub fn certified_digest(batch_id: &BatchId) -> ContentHash {
    ContentHash::hash(&canonical_message(batch_id))
}

/// Why a certificate does or does not verify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationOutcome {
    Valid,
    /// No signer could be recovered over the canonical message.
    MalformedSignature,
    SignerMismatch { recovered: Address, claimed: Address },
    UntrustedAuthority(Address),
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid)
    }
}

/// Certificate verifier bound to an authority registry.
#[derive(Clone)]
pub struct CertificateVerifier {
    registry: Arc<AuthorityRegistry>,
    scheme: Arc<dyn SignatureScheme>,
}

impl CertificateVerifier {
    /// Verifier using Ed25519 recoverable signatures.
    pub fn new(registry: Arc<AuthorityRegistry>) -> Self {
        Self::with_scheme(registry, Arc::new(Ed25519Scheme))
    }

    pub fn with_scheme(registry: Arc<AuthorityRegistry>, scheme: Arc<dyn SignatureScheme>) -> Self {
        Self { registry, scheme }
    }

    pub fn registry(&self) -> &Arc<AuthorityRegistry> {
        &self.registry
    }

    /// Explain the verification result for a certificate on a batch.
    pub fn inspect(&self, batch_id: &BatchId, certificate: &Certificate) -> VerificationOutcome {
        let message = canonical_message(batch_id);
        let outcome = match self.scheme.recover_signer(&message, &certificate.signature) {
            None => VerificationOutcome::MalformedSignature,
            Some(recovered) if recovered != certificate.claimed_authority => {
                VerificationOutcome::SignerMismatch {
                    recovered,
                    claimed: certificate.claimed_authority,
                }
            }
            Some(signer) if !self.registry.is_trusted(&signer) => {
                VerificationOutcome::UntrustedAuthority(signer)
            }
            Some(_) => VerificationOutcome::Valid,
        };
        debug!(batch = %batch_id, outcome = ?outcome, "Certificate inspected");
        outcome
    }

    pub fn verify(&self, batch_id: &BatchId, certificate: &Certificate) -> bool {
        self.inspect(batch_id, certificate).is_valid()
    }

    /// Certify a batch with an authority key (the authority's side of the
    /// protocol).
    pub fn issue(batch_id: &BatchId, authority: &AuthorityKeypair) -> Certificate {
        Certificate {
            certified_message: certified_digest(batch_id),
            signature: authority.sign(&canonical_message(batch_id)),
            claimed_authority: authority.address(),
        }
    }
}

impl std::fmt::Debug for CertificateVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateVerifier")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
