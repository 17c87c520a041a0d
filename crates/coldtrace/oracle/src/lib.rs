//! # coldtrace-oracle
//!
//! Two-phase temperature check protocol.
//!
//! 1. The batch owner opens a request; the [`OracleCorrelator`] records a
//!    [`PendingOracleRequest`] keyed by batch id and returns immediately.
//! 2. Later, the designated oracle principal replies with a reading. The
//!    correlator consumes the pending entry exactly once and the reading is
//!    compared against the batch threshold by [`is_compliant`].
//!
//! The [`OracleWorker`] is the oracle principal's side: it receives
//! [`TemperatureRequest`]s over a channel, fetches a reading from a
//! [`TemperatureFeed`] and hands it to a [`ReadingSink`].

#![deny(unsafe_code)]

pub mod correlator;
pub mod error;
pub mod feed;
pub mod worker;

pub use correlator::{
    is_compliant, OracleCorrelator, PendingOracleRequest, ProbeRange, TemperatureRequest,
};
pub use error::{CorrelatorError, FeedError, WorkerError};
pub use feed::{FixedFeed, SimulatedFeed, TemperatureFeed};
pub use worker::{OracleWorker, Reading, ReadingSink, WorkerStats};
