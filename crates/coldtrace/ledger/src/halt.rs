use crate::error::LedgerError;
use coldtrace_types::Address;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Global circuit breaker over batch mutations.
#[derive(Debug)]
pub struct HaltSwitch {
    administrator: Address,
    halted: AtomicBool,
}

impl HaltSwitch {
    pub fn new(administrator: Address) -> Self {
        Self {
            administrator,
            halted: AtomicBool::new(false),
        }
    }

    pub fn halt(&self, caller: &Address) -> Result<(), LedgerError> {
        self.ensure_administrator(caller, "halt the ledger")?;
        self.halted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| LedgerError::AlreadyHalted)?;
        warn!(by = %caller, "Ledger halted");
        Ok(())
    }

    pub fn resume(&self, caller: &Address) -> Result<(), LedgerError> {
        self.ensure_administrator(caller, "resume the ledger")?;
        self.halted
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| LedgerError::NotHalted)?;
        warn!(by = %caller, "Ledger resumed");
        Ok(())
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Gate for mutating entry points.
    pub fn ensure_running(&self) -> Result<(), LedgerError> {
        if self.is_halted() {
            return Err(LedgerError::Halted);
        }
        Ok(())
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halt_and_resume_toggle() {
        let admin = Address::from_label("owner");
        let switch = HaltSwitch::new(admin);
        assert!(switch.ensure_running().is_ok());

        switch.halt(&admin).unwrap();
        assert!(switch.is_halted());
        assert_eq!(switch.ensure_running(), Err(LedgerError::Halted));
        assert_eq!(switch.halt(&admin), Err(LedgerError::AlreadyHalted));

        switch.resume(&admin).unwrap();
        assert!(!switch.is_halted());
        assert_eq!(switch.resume(&admin), Err(LedgerError::NotHalted));
    }

    #[test]
    fn only_administrator_may_toggle() {
        let switch = HaltSwitch::new(Address::from_label("owner"));
        let other = Address::from_label("producer");
        assert!(matches!(
            switch.halt(&other),
            Err(LedgerError::Unauthorized { .. })
        ));
        assert!(!switch.is_halted());
    }
}
