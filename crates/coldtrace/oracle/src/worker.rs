use crate::correlator::TemperatureRequest;
use crate::error::WorkerError;
use crate::feed::TemperatureFeed;
use coldtrace_types::{Address, BatchId, Temperature};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Receiver of oracle readings: the ledger's reply entry point.
pub trait ReadingSink: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deliver a reading as `oracle`; returns the resulting compliance flag.
    fn deliver(
        &self,
        batch_id: &BatchId,
        temperature: Temperature,
        oracle: &Address,
    ) -> Result<bool, Self::Error>;
}

impl<T: ReadingSink + ?Sized> ReadingSink for Arc<T> {
    type Error = T::Error;

    fn deliver(
        &self,
        batch_id: &BatchId,
        temperature: Temperature,
        oracle: &Address,
    ) -> Result<bool, Self::Error> {
        (**self).deliver(batch_id, temperature, oracle)
    }
}

/// A delivered reading and the compliance flag it produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub batch_id: BatchId,
    pub temperature: Temperature,
    pub compliant: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub delivered: u64,
    pub failed: u64,
}

/// The oracle principal's request loop.
///
/// Failures are logged and counted; the affected request simply stays
/// pending on the ledger.
pub struct OracleWorker<F, S> {
    oracle: Address,
    feed: F,
    sink: S,
}

impl<F, S> OracleWorker<F, S>
where
    F: TemperatureFeed,
    S: ReadingSink,
{
    pub fn new(oracle: Address, feed: F, sink: S) -> Self {
        Self { oracle, feed, sink }
    }

    pub fn oracle(&self) -> Address {
        self.oracle
    }

    /// Serve a single request.
    pub async fn handle(&self, request: &TemperatureRequest) -> Result<Reading, WorkerError> {
        let temperature = self
            .feed
            .fetch(request.range.min, request.range.max)
            .await?;
        debug!(batch = %request.batch_id, temperature, "Reading fetched");

        let compliant = self
            .sink
            .deliver(&request.batch_id, temperature, &self.oracle)
            .map_err(|err| WorkerError::Rejected {
                batch: request.batch_id,
                reason: err.to_string(),
            })?;

        Ok(Reading {
            batch_id: request.batch_id,
            temperature,
            compliant,
        })
    }

    /// Serve requests until the channel closes.
    pub async fn run(self, mut requests: mpsc::UnboundedReceiver<TemperatureRequest>) -> WorkerStats {
        let mut stats = WorkerStats::default();
        while let Some(request) = requests.recv().await {
            match self.handle(&request).await {
                Ok(reading) => {
                    stats.delivered += 1;
                    info!(
                        batch = %reading.batch_id,
                        temperature = reading.temperature,
                        compliant = reading.compliant,
                        "Oracle reading delivered"
                    );
                }
                Err(err) => {
                    stats.failed += 1;
                    warn!(batch = %request.batch_id, error = %err, "Oracle request failed");
                }
            }
        }
        info!(delivered = stats.delivered, failed = stats.failed, "Oracle worker stopped");
        stats
    }

    pub fn spawn(self, requests: mpsc::UnboundedReceiver<TemperatureRequest>) -> JoinHandle<WorkerStats>
    where
        F: 'static,
        S: 'static,
    {
        tokio::spawn(self.run(requests))
    }
}
