use crate::error::LedgerError;
use coldtrace_types::Address;
use std::collections::BTreeSet;
use std::sync::RwLock;
use tracing::info;

/// Principals permitted to create batches.
#[derive(Debug)]
pub struct ProducerAllowlist {
    administrator: Address,
    producers: RwLock<BTreeSet<Address>>,
}

impl ProducerAllowlist {
    pub fn new(administrator: Address) -> Self {
        Self {
            administrator,
            producers: RwLock::new(BTreeSet::new()),
        }
    }

    /// Allow a producer. Adding an existing producer is a no-op.
    pub fn add(&self, principal: Address, caller: &Address) -> Result<(), LedgerError> {
        self.ensure_administrator(caller, "add producers")?;
        let mut producers = self.write()?;
        if producers.insert(principal) {
            info!(producer = %principal, "Producer allow-listed");
        }
        Ok(())
    }

    pub fn remove(&self, principal: &Address, caller: &Address) -> Result<(), LedgerError> {
        self.ensure_administrator(caller, "remove producers")?;
        let mut producers = self.write()?;
        if !producers.remove(principal) {
            return Err(LedgerError::NotFound(format!("producer {principal}")));
        }
        info!(producer = %principal, "Producer removed from allow-list");
        Ok(())
    }

    pub fn contains(&self, principal: &Address) -> bool {
        self.producers
            .read()
            .map(|producers| producers.contains(principal))
            .unwrap_or(false)
    }

    pub fn producers(&self) -> Vec<Address> {
        self.producers
            .read()
            .map(|producers| producers.iter().copied().collect())
            .unwrap_or_default()
    }

    fn ensure_administrator(&self, caller: &Address, action: &'static str) -> Result<(), LedgerError> {
        if *caller != self.administrator {
            return Err(LedgerError::Unauthorized {
                caller: *caller,
                action,
            });
        }
        Ok(())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeSet<Address>>, LedgerError> {
        self.producers
            .write()
            .map_err(|_| LedgerError::LockPoisoned("producer allow-list"))
    }
}
