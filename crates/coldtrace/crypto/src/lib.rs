//! Coldtrace Crypto - the signature primitive consumed by certificate
//! verification.
//!
//! Ed25519 has no public-key recovery, so a [`RecoverableSignature`] produced
//! here carries the signer's 32-byte verifying key followed by the 64-byte
//! signature. Recovery parses both halves, verifies strictly, and yields the
//! [`Address`] derived from the key. Anything malformed recovers to `None`.

#![deny(unsafe_code)]

use coldtrace_types::{Address, RecoverableSignature};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroize;

const PUBLIC_KEY_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;

/// Length of an encoded recoverable signature.
pub const RECOVERABLE_SIGNATURE_LEN: usize = PUBLIC_KEY_LEN + SIGNATURE_LEN;

/// Recovers the identity that produced a signature over a message.
pub trait SignatureScheme: Send + Sync {
    /// Returns the signer's address, or `None` when the signature is
    /// malformed or does not verify over `message`.
    fn recover_signer(&self, message: &[u8], signature: &RecoverableSignature) -> Option<Address>;
}

/// Recoverable signatures over Ed25519.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Scheme;

impl SignatureScheme for Ed25519Scheme {
    fn recover_signer(&self, message: &[u8], signature: &RecoverableSignature) -> Option<Address> {
        let bytes = signature.as_bytes();
        if bytes.len() != RECOVERABLE_SIGNATURE_LEN {
            return None;
        }
        let (key_bytes, sig_bytes) = bytes.split_at(PUBLIC_KEY_LEN);
        let verifying_key = VerifyingKey::from_bytes(key_bytes.try_into().ok()?).ok()?;
        let signature = Signature::from_slice(sig_bytes).ok()?;
        verifying_key.verify_strict(message, &signature).ok()?;
        Some(Address::from_public_key(verifying_key.as_bytes()))
    }
}

/// Signing key of a certifying authority.
pub struct AuthorityKeypair {
    signing_key: SigningKey,
}

impl AuthorityKeypair {
    /// Generate a fresh key pair from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        let keypair = Self::from_secret(&secret);
        secret.zeroize();
        keypair
    }

    pub fn from_secret(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    /// Parse a 64-digit hex secret (as printed by `coldtrace keygen`).
    pub fn from_secret_hex(hex: &str) -> Result<Self, CryptoError> {
        let digits = hex.strip_prefix("0x").unwrap_or(hex);
        if digits.len() != 64 {
            return Err(CryptoError::InvalidSecretLength(digits.len()));
        }
        if !digits.is_ascii() {
            return Err(CryptoError::InvalidHex);
        }
        let mut secret = [0u8; 32];
        for (i, byte) in secret.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
                .map_err(|_| CryptoError::InvalidHex)?;
        }
        let keypair = Self::from_secret(&secret);
        secret.zeroize();
        Ok(keypair)
    }

    pub fn secret_hex(&self) -> String {
        let mut secret = self.signing_key.to_bytes();
        let hex: String = secret.iter().map(|b| format!("{:02x}", b)).collect();
        secret.zeroize();
        hex
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(self.verifying_key().as_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> RecoverableSignature {
        let signature = self.signing_key.sign(message);
        let mut bytes = Vec::with_capacity(RECOVERABLE_SIGNATURE_LEN);
        bytes.extend_from_slice(self.verifying_key().as_bytes());
        bytes.extend_from_slice(&signature.to_bytes());
        RecoverableSignature::new(bytes)
    }
}

impl std::fmt::Debug for AuthorityKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorityKeypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid secret length: expected 64 hex digits, got {0}")]
    InvalidSecretLength(usize),
    #[error("invalid hex in secret")]
    InvalidHex,
}
