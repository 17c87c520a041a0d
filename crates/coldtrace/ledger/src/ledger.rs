//! The batch state machine.
//!
//! Mutating entry points run one at a time under the ledger's serial lock,
//! check the halt switch first, and validate everything before writing, so a
//! failed call changes nothing. Read-only queries never take the serial lock
//! and stay available while halted.

use crate::allowlist::ProducerAllowlist;
use crate::config::LedgerConfig;
use crate::error::{ConfigError, LedgerError};
use crate::halt::HaltSwitch;
use coldtrace_authority::AuthorityRegistry;
use coldtrace_certificate::{CertificateVerifier, VerificationOutcome};
use coldtrace_oracle::{
    is_compliant, OracleCorrelator, PendingOracleRequest, ReadingSink, TemperatureRequest,
};
use coldtrace_types::{
    Address, Batch, BatchId, Certificate, Clock, ContentHash, StorageRef, SystemClock, Temperature,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

type BatchMap = HashMap<BatchId, Batch>;

/// Owns every batch record and enforces who may change it.
pub struct BatchLedger {
    config: LedgerConfig,
    batches: RwLock<BatchMap>,
    producers: ProducerAllowlist,
    halt: HaltSwitch,
    verifier: CertificateVerifier,
    correlator: OracleCorrelator,
    clock: Arc<dyn Clock>,
    requests: Option<mpsc::UnboundedSender<TemperatureRequest>>,
    serial: Mutex<()>,
}

impl BatchLedger {
    /// Validate `config` and create a ledger over `registry`.
    pub fn try_new(config: LedgerConfig, registry: Arc<AuthorityRegistry>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, registry))
    }

    /// Create a ledger that verifies certificates against `registry`.
    ///
    /// `config` is taken as is; use [`BatchLedger::try_new`] for
    /// configuration that has not been validated.
    pub fn new(config: LedgerConfig, registry: Arc<AuthorityRegistry>) -> Self {
        Self {
            producers: ProducerAllowlist::new(config.administrator),
            halt: HaltSwitch::new(config.administrator),
            verifier: CertificateVerifier::new(registry),
            correlator: OracleCorrelator::new(config.pending_request_ttl()),
            batches: RwLock::new(HashMap::new()),
            clock: Arc::new(SystemClock),
            requests: None,
            serial: Mutex::new(()),
            config,
        }
    }

    /// Replace the certificate verifier (e.g. a different signature scheme).
    pub fn with_verifier(mut self, verifier: CertificateVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Publish every opened temperature check on `sender` for the oracle.
    pub fn with_request_channel(mut self, sender: mpsc::UnboundedSender<TemperatureRequest>) -> Self {
        self.requests = Some(sender);
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<AuthorityRegistry> {
        self.verifier.registry()
    }

    // ── Administration ──────────────────────────────────────────────

    pub fn add_producer(&self, principal: Address, caller: &Address) -> Result<(), LedgerError> {
        let _serial = self.serialize()?;
        self.producers.add(principal, caller)
    }

    pub fn remove_producer(&self, principal: &Address, caller: &Address) -> Result<(), LedgerError> {
        let _serial = self.serialize()?;
        self.producers.remove(principal, caller)
    }

    pub fn is_producer(&self, principal: &Address) -> bool {
        self.producers.contains(principal)
    }

    pub fn producers(&self) -> Vec<Address> {
        self.producers.producers()
    }

    pub fn halt(&self, caller: &Address) -> Result<(), LedgerError> {
        let _serial = self.serialize()?;
        self.halt.halt(caller)
    }

    pub fn resume(&self, caller: &Address) -> Result<(), LedgerError> {
        let _serial = self.serialize()?;
        self.halt.resume(caller)
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_halted()
    }

    /// Drop pending temperature checks whose TTL has elapsed.
    pub fn expire_stale_requests(&self, caller: &Address) -> Result<Vec<BatchId>, LedgerError> {
        let _serial = self.serialize()?;
        if *caller != self.config.administrator {
            return Err(self.reject(caller, "expire temperature checks"));
        }
        Ok(self.correlator.expire(self.clock.now())?)
    }

    // ── Batch lifecycle ─────────────────────────────────────────────

    /// Register a new batch owned by its producer. Returns the fresh id.
    pub fn create_batch(
        &self,
        content_hash: ContentHash,
        required_temperature: Temperature,
        storage_ref: StorageRef,
        caller: &Address,
    ) -> Result<BatchId, LedgerError> {
        let _serial = self.serialize()?;
        self.halt.ensure_running()?;
        if !self.producers.contains(caller) {
            return Err(self.reject(caller, "create batches"));
        }

        let mut batches = self.write_batches()?;
        let mut id = BatchId::generate();
        while batches.contains_key(&id) {
            id = BatchId::generate();
        }
        let batch = Batch::new(
            id,
            content_hash,
            required_temperature,
            storage_ref,
            *caller,
            self.clock.now(),
        );
        batches.insert(id, batch);

        info!(
            batch = %id,
            producer = %caller,
            required_temperature,
            "Batch created"
        );
        Ok(id)
    }

    /// Store a certificate on a batch without validating it.
    pub fn add_certificate(
        &self,
        batch_id: &BatchId,
        certificate: Certificate,
        caller: &Address,
    ) -> Result<(), LedgerError> {
        let _serial = self.serialize()?;
        self.halt.ensure_running()?;
        let mut batches = self.write_batches()?;
        let batch = self.owned_batch(&mut batches, batch_id, caller)?;

        let authority = certificate.claimed_authority;
        batch.certificate = Some(certificate);
        batch.updated_at = self.clock.now();
        info!(batch = %batch_id, authority = %authority, "Certificate stored");
        Ok(())
    }

    /// Name the authority expected to certify a batch.
    pub fn designate_issuer(
        &self,
        batch_id: &BatchId,
        authority: Address,
        caller: &Address,
    ) -> Result<(), LedgerError> {
        let _serial = self.serialize()?;
        self.halt.ensure_running()?;
        let mut batches = self.write_batches()?;
        let batch = self.owned_batch(&mut batches, batch_id, caller)?;

        batch.designated_issuer = Some(authority);
        batch.updated_at = self.clock.now();
        info!(batch = %batch_id, authority = %authority, "Issuer designated");
        Ok(())
    }

    /// Transfer ownership, replacing the content hash. Requires a
    /// certificate that verifies right now.
    pub fn update_owner(
        &self,
        batch_id: &BatchId,
        new_content_hash: ContentHash,
        new_owner: Address,
        caller: &Address,
    ) -> Result<(), LedgerError> {
        let _serial = self.serialize()?;
        self.halt.ensure_running()?;
        let mut batches = self.write_batches()?;
        let batch = self.owned_batch(&mut batches, batch_id, caller)?;

        let verified = batch
            .certificate
            .as_ref()
            .is_some_and(|certificate| self.verifier.verify(batch_id, certificate));
        if !verified {
            warn!(batch = %batch_id, caller = %caller, "Transfer refused: certificate does not verify");
            return Err(LedgerError::CertificateInvalid(*batch_id));
        }

        let previous = batch.owner;
        batch.content_hash = new_content_hash;
        batch.owner = new_owner;
        batch.updated_at = self.clock.now();
        info!(batch = %batch_id, from = %previous, to = %new_owner, "Ownership transferred");
        Ok(())
    }

    /// Replace the provenance document reference without a transfer.
    pub fn update_content(
        &self,
        batch_id: &BatchId,
        new_content_hash: ContentHash,
        new_storage_ref: Option<StorageRef>,
        caller: &Address,
    ) -> Result<(), LedgerError> {
        let _serial = self.serialize()?;
        self.halt.ensure_running()?;
        let mut batches = self.write_batches()?;
        let batch = self.owned_batch(&mut batches, batch_id, caller)?;

        batch.content_hash = new_content_hash;
        if let Some(storage_ref) = new_storage_ref {
            batch.storage_ref = storage_ref;
        }
        batch.updated_at = self.clock.now();
        info!(batch = %batch_id, hash = %new_content_hash, "Batch content updated");
        Ok(())
    }

    /// Manually set the compliance flag, e.g. after a physical inspection.
    /// Overrides whatever the last oracle reading decided.
    pub fn update_status(
        &self,
        batch_id: &BatchId,
        compliant: bool,
        caller: &Address,
    ) -> Result<(), LedgerError> {
        let _serial = self.serialize()?;
        self.halt.ensure_running()?;
        let mut batches = self.write_batches()?;
        let batch = self.owned_batch(&mut batches, batch_id, caller)?;

        batch.compliant = compliant;
        batch.updated_at = self.clock.now();
        info!(batch = %batch_id, compliant, "Compliance status set by owner");
        Ok(())
    }

    // ── Oracle protocol ─────────────────────────────────────────────

    /// Open a temperature check for a batch. Returns immediately; the
    /// reading arrives later through [`BatchLedger::oracle_respond`].
    pub fn request_temperature_check(
        &self,
        batch_id: &BatchId,
        caller: &Address,
    ) -> Result<TemperatureRequest, LedgerError> {
        let _serial = self.serialize()?;
        self.halt.ensure_running()?;
        let mut batches = self.write_batches()?;
        self.owned_batch(&mut batches, batch_id, caller)?;

        let pending = self.correlator.open(*batch_id, *caller, self.clock.now())?;
        let request = TemperatureRequest {
            batch_id: *batch_id,
            requested_by: pending.requested_by,
            requested_at: pending.requested_at,
            range: self.config.probe_range,
        };
        info!(batch = %batch_id, owner = %caller, "Temperature check requested");

        if let Some(sender) = &self.requests {
            if sender.send(request.clone()).is_err() {
                warn!(batch = %batch_id, "Oracle channel closed; request stays pending");
            }
        }
        Ok(request)
    }

    /// Accept the oracle's reading for a pending check and update the
    /// compliance flag. Returns the new flag.
    pub fn oracle_respond(
        &self,
        batch_id: &BatchId,
        temperature: Temperature,
        caller: &Address,
    ) -> Result<bool, LedgerError> {
        let _serial = self.serialize()?;
        self.halt.ensure_running()?;
        if *caller != self.config.oracle {
            return Err(self.reject(caller, "deliver oracle readings"));
        }

        let mut batches = self.write_batches()?;
        let batch = batches
            .get_mut(batch_id)
            .ok_or(LedgerError::NoSuchRequest(*batch_id))?;
        self.correlator.resolve(batch_id, self.clock.now())?;

        let compliant = is_compliant(temperature, batch.required_temperature);
        batch.compliant = compliant;
        batch.updated_at = self.clock.now();
        info!(
            batch = %batch_id,
            temperature,
            required = batch.required_temperature,
            compliant,
            "Oracle reading applied"
        );
        Ok(compliant)
    }

    pub fn pending_request(&self, batch_id: &BatchId) -> Option<PendingOracleRequest> {
        self.correlator.get(batch_id)
    }

    pub fn pending_requests(&self) -> Vec<PendingOracleRequest> {
        self.correlator.pending()
    }

    // ── Verification (never fails) ──────────────────────────────────

    /// True iff the stored certificate verifies against the current
    /// registry. False for unknown batches and uncertified ones.
    pub fn verify_certificate(&self, batch_id: &BatchId) -> bool {
        self.with_batch(batch_id, |batch| {
            batch
                .certificate
                .as_ref()
                .is_some_and(|certificate| self.verifier.verify(batch_id, certificate))
        })
        .unwrap_or(false)
    }

    /// True iff the certificate verifies and was issued by the designated
    /// authority.
    pub fn verify_issuer(&self, batch_id: &BatchId) -> bool {
        self.with_batch(batch_id, |batch| {
            match (&batch.certificate, batch.designated_issuer) {
                (Some(certificate), Some(issuer)) => {
                    certificate.claimed_authority == issuer
                        && self.verifier.verify(batch_id, certificate)
                }
                _ => false,
            }
        })
        .unwrap_or(false)
    }

    pub fn verify_product_hash(&self, batch_id: &BatchId, candidate: &ContentHash) -> bool {
        self.with_batch(batch_id, |batch| batch.content_hash == *candidate)
            .unwrap_or(false)
    }

    /// Diagnostic form of [`BatchLedger::verify_certificate`]. `None` when no
    /// certificate is stored.
    pub fn inspect_certificate(
        &self,
        batch_id: &BatchId,
    ) -> Result<Option<VerificationOutcome>, LedgerError> {
        let batches = self.read_batches()?;
        let batch = batches
            .get(batch_id)
            .ok_or_else(|| LedgerError::batch_not_found(batch_id))?;
        Ok(batch
            .certificate
            .as_ref()
            .map(|certificate| self.verifier.inspect(batch_id, certificate)))
    }

    // ── Getters ─────────────────────────────────────────────────────

    pub fn batch(&self, batch_id: &BatchId) -> Result<Batch, LedgerError> {
        let batches = self.read_batches()?;
        batches
            .get(batch_id)
            .cloned()
            .ok_or_else(|| LedgerError::batch_not_found(batch_id))
    }

    pub fn certificate(&self, batch_id: &BatchId) -> Result<Option<Certificate>, LedgerError> {
        Ok(self.batch(batch_id)?.certificate)
    }

    pub fn storage_reference(&self, batch_id: &BatchId) -> Result<StorageRef, LedgerError> {
        Ok(self.batch(batch_id)?.storage_ref)
    }

    pub fn is_compliant(&self, batch_id: &BatchId) -> Result<bool, LedgerError> {
        Ok(self.batch(batch_id)?.compliant)
    }

    pub fn batch_ids(&self) -> Vec<BatchId> {
        let mut ids: Vec<_> = self
            .read_batches()
            .map(|batches| batches.keys().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.read_batches().map(|batches| batches.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Internals ───────────────────────────────────────────────────

    fn serialize(&self) -> Result<MutexGuard<'_, ()>, LedgerError> {
        self.serial
            .lock()
            .map_err(|_| LedgerError::LockPoisoned("ledger serial lock"))
    }

    fn read_batches(&self) -> Result<RwLockReadGuard<'_, BatchMap>, LedgerError> {
        self.batches
            .read()
            .map_err(|_| LedgerError::LockPoisoned("batches"))
    }

    fn write_batches(&self) -> Result<RwLockWriteGuard<'_, BatchMap>, LedgerError> {
        self.batches
            .write()
            .map_err(|_| LedgerError::LockPoisoned("batches"))
    }

    fn with_batch<T>(&self, batch_id: &BatchId, f: impl FnOnce(&Batch) -> T) -> Option<T> {
        let batches = self.batches.read().ok()?;
        let result = batches.get(batch_id).map(f);
        debug!(batch = %batch_id, found = result.is_some(), "Batch queried");
        result
    }

    /// Look up a batch for mutation by its current owner.
    fn owned_batch<'a>(
        &self,
        batches: &'a mut BatchMap,
        batch_id: &BatchId,
        caller: &Address,
    ) -> Result<&'a mut Batch, LedgerError> {
        let batch = batches
            .get_mut(batch_id)
            .ok_or_else(|| LedgerError::batch_not_found(batch_id))?;
        if !batch.is_owned_by(caller) {
            warn!(batch = %batch_id, caller = %caller, owner = %batch.owner, "Caller is not the batch owner");
            return Err(LedgerError::Unauthorized {
                caller: *caller,
                action: "modify this batch",
            });
        }
        Ok(batch)
    }

    fn reject(&self, caller: &Address, action: &'static str) -> LedgerError {
        warn!(caller = %caller, action, "Operation rejected");
        LedgerError::Unauthorized {
            caller: *caller,
            action,
        }
    }
}

impl std::fmt::Debug for BatchLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchLedger")
            .field("config", &self.config)
            .field("batches", &self.len())
            .field("halted", &self.is_halted())
            .finish_non_exhaustive()
    }
}

impl ReadingSink for BatchLedger {
    type Error = LedgerError;

    fn deliver(
        &self,
        batch_id: &BatchId,
        temperature: Temperature,
        oracle: &Address,
    ) -> Result<bool, LedgerError> {
        self.oracle_respond(batch_id, temperature, oracle)
    }
}
