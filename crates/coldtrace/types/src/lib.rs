//! Coldtrace Types - shared vocabulary of the batch ledger.
//!
//! Every principal (administrator, producer, owner, certifying authority,
//! oracle) is an [`Address`]. Batches are keyed by an unguessable
//! [`BatchId`] and carry the [`ContentHash`] of their off-chain provenance
//! document plus an opaque [`StorageRef`] locating it.

#![deny(unsafe_code)]

mod address;
mod batch;
mod certificate;
mod clock;
mod hash;
mod hex;

pub use address::Address;
pub use batch::{Batch, BatchId, CertificationState, ComplianceState, StorageRef, Temperature};
pub use certificate::{Certificate, RecoverableSignature};
pub use clock::{Clock, ManualClock, SystemClock};
pub use hash::ContentHash;
pub use hex::HexError;
