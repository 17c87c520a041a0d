use crate::{Address, ContentHash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque recoverable signature bytes. The layout is owned by the signature
/// scheme that produced it; the ledger only stores and forwards it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecoverableSignature(pub Vec<u8>);

impl RecoverableSignature {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        crate::hex::encode(&self.0)
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "RecoverableSignature({}…, {} bytes)", &hex[..hex.len().min(12)], self.0.len())
    }
}

/// A certificate as attached by a batch owner.
///
/// Stored verbatim whether or not it verifies. Validity is always recomputed
/// against the current authority registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Digest of the message the authority claims to have signed.
    pub certified_message: ContentHash,
    pub signature: RecoverableSignature,
    pub claimed_authority: Address,
}
