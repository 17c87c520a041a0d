//! # coldtrace-ledger
//!
//! Authoritative record of produce batches moving through a cold chain.
//!
//! A [`BatchLedger`] tracks, per batch: the content hash and storage
//! locator of its provenance document, its owner and producer, the
//! temperature threshold it must stay at or below, a compliance flag, and an
//! optional certificate from a certifying authority.
//!
//! ## Access control
//!
//! - The administrator (from [`LedgerConfig`]) manages the producer
//!   allow-list and the [`HaltSwitch`].
//! - Only allow-listed producers create batches.
//! - Only the current owner mutates a batch, and transferring it requires a
//!   certificate that verifies at the moment of transfer.
//! - Only the configured oracle principal delivers temperature readings.
//!
//! Every rejected operation leaves the ledger unchanged.

#![deny(unsafe_code)]

mod allowlist;
mod config;
mod error;
mod halt;
mod ledger;

pub use allowlist::ProducerAllowlist;
pub use config::LedgerConfig;
pub use error::{ConfigError, LedgerError};
pub use halt::HaltSwitch;
pub use ledger::BatchLedger;

pub use coldtrace_certificate::VerificationOutcome;
pub use coldtrace_oracle::{PendingOracleRequest, ProbeRange, TemperatureRequest};
pub use coldtrace_types::{
    Address, Batch, BatchId, Certificate, CertificationState, ComplianceState, ContentHash,
    StorageRef, Temperature,
};
