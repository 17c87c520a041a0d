//! Coldtrace Authority - the set of certifying authorities whose signatures
//! are trusted.
//!
//! Only the registry administrator may change membership. Membership checks
//! are public and side-effect free, and are re-run on every certificate
//! verification, so removing a key invalidates certificates it signed.

#![deny(unsafe_code)]

use coldtrace_types::Address;
use std::collections::BTreeSet;
use std::sync::RwLock;
use thiserror::Error;
use tracing::{info, warn};

/// Registry of trusted certifying-authority addresses.
#[derive(Debug)]
pub struct AuthorityRegistry {
    administrator: Address,
    trusted: RwLock<BTreeSet<Address>>,
}

impl AuthorityRegistry {
    pub fn new(administrator: Address) -> Self {
        Self {
            administrator,
            trusted: RwLock::new(BTreeSet::new()),
        }
    }

    pub fn administrator(&self) -> Address {
        self.administrator
    }

    /// Register an authority. Re-adding a registered key is a no-op.
    pub fn add_key(&self, key: Address, caller: &Address) -> Result<(), RegistryError> {
        self.ensure_administrator(caller)?;
        let mut trusted = self.trusted.write().map_err(|_| RegistryError::LockError)?;
        if trusted.insert(key) {
            info!(authority = %key, "Certifying authority registered");
        }
        Ok(())
    }

    /// Revoke an authority.
    pub fn remove_key(&self, key: &Address, caller: &Address) -> Result<(), RegistryError> {
        self.ensure_administrator(caller)?;
        let mut trusted = self.trusted.write().map_err(|_| RegistryError::LockError)?;
        if !trusted.remove(key) {
            return Err(RegistryError::NotFound(*key));
        }
        info!(authority = %key, "Certifying authority revoked");
        Ok(())
    }

    /// Membership test. Never fails; a poisoned registry trusts nobody.
    pub fn is_trusted(&self, key: &Address) -> bool {
        self.trusted
            .read()
            .map(|trusted| trusted.contains(key))
            .unwrap_or(false)
    }

    pub fn trusted_keys(&self) -> Vec<Address> {
        self.trusted
            .read()
            .map(|trusted| trusted.iter().copied().collect())
            .unwrap_or_default()
    }

    fn ensure_administrator(&self, caller: &Address) -> Result<(), RegistryError> {
        if *caller != self.administrator {
            warn!(caller = %caller, "Registry change rejected: caller is not the administrator");
            return Err(RegistryError::Unauthorized(*caller));
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unauthorized: {0} is not the registry administrator")]
    Unauthorized(Address),

    #[error("authority not registered: {0}")]
    NotFound(Address),

    #[error("registry lock poisoned")]
    LockError,
}
