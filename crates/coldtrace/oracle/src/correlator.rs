use crate::error::CorrelatorError;
use chrono::{DateTime, Duration, Utc};
use coldtrace_types::{Address, BatchId, Temperature};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info};

/// A batch meets its requirement when the reading does not exceed it.
pub fn is_compliant(reading: Temperature, required: Temperature) -> bool {
    reading <= required
}

/// Reading range the oracle asks its feed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRange {
    pub min: Temperature,
    pub max: Temperature,
}

impl Default for ProbeRange {
    fn default() -> Self {
        Self { min: -10, max: 20 }
    }
}

/// An outstanding temperature check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOracleRequest {
    pub batch_id: BatchId,
    pub requested_by: Address,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PendingOracleRequest {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Notification sent to the oracle principal for each opened request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureRequest {
    pub batch_id: BatchId,
    pub requested_by: Address,
    pub requested_at: DateTime<Utc>,
    pub range: ProbeRange,
}

/// Pending-request table keyed by batch id.
///
/// At most one request per batch is outstanding. Without a TTL a request
/// stays pending until answered.
#[derive(Debug, Default)]
pub struct OracleCorrelator {
    ttl: Option<Duration>,
    pending: RwLock<HashMap<BatchId, PendingOracleRequest>>,
}

impl OracleCorrelator {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            pending: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Open a request for a batch. An expired entry is replaced; a live one
    /// is a duplicate.
    pub fn open(
        &self,
        batch_id: BatchId,
        requested_by: Address,
        now: DateTime<Utc>,
    ) -> Result<PendingOracleRequest, CorrelatorError> {
        let mut pending = self.pending.write().map_err(|_| CorrelatorError::LockError)?;
        if let Some(existing) = pending.get(&batch_id) {
            if !existing.is_expired(now) {
                return Err(CorrelatorError::DuplicateRequest(batch_id));
            }
            debug!(batch = %batch_id, "Replacing expired temperature request");
        }

        let request = PendingOracleRequest {
            batch_id,
            requested_by,
            requested_at: now,
            // A deadline past the calendar's range never arrives.
            expires_at: self.ttl.and_then(|ttl| now.checked_add_signed(ttl)),
        };
        pending.insert(batch_id, request.clone());
        Ok(request)
    }

    /// Consume the pending request for a batch. Expired entries are left in
    /// place and reported as such.
    pub fn resolve(
        &self,
        batch_id: &BatchId,
        now: DateTime<Utc>,
    ) -> Result<PendingOracleRequest, CorrelatorError> {
        let mut pending = self.pending.write().map_err(|_| CorrelatorError::LockError)?;
        match pending.get(batch_id) {
            None => Err(CorrelatorError::NoSuchRequest(*batch_id)),
            Some(request) if request.is_expired(now) => {
                Err(CorrelatorError::RequestExpired(*batch_id))
            }
            Some(_) => pending
                .remove(batch_id)
                .ok_or(CorrelatorError::NoSuchRequest(*batch_id)),
        }
    }

    /// Drop every expired entry, returning the affected batches.
    pub fn expire(&self, now: DateTime<Utc>) -> Result<Vec<BatchId>, CorrelatorError> {
        let mut pending = self.pending.write().map_err(|_| CorrelatorError::LockError)?;
        let mut expired: Vec<BatchId> = pending
            .values()
            .filter(|request| request.is_expired(now))
            .map(|request| request.batch_id)
            .collect();
        expired.sort();
        for batch_id in &expired {
            pending.remove(batch_id);
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Expired stale temperature requests");
        }
        Ok(expired)
    }

    pub fn get(&self, batch_id: &BatchId) -> Option<PendingOracleRequest> {
        self.pending
            .read()
            .ok()
            .and_then(|pending| pending.get(batch_id).cloned())
    }

    pub fn is_pending(&self, batch_id: &BatchId) -> bool {
        self.get(batch_id).is_some()
    }

    /// All outstanding requests, oldest first.
    pub fn pending(&self) -> Vec<PendingOracleRequest> {
        let mut requests: Vec<_> = self
            .pending
            .read()
            .map(|pending| pending.values().cloned().collect())
            .unwrap_or_default();
        requests.sort_by(|a, b| a.requested_at.cmp(&b.requested_at));
        requests
    }
}
