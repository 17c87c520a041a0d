use coldtrace_types::{BatchId, Temperature};
use thiserror::Error;

/// Errors from the pending-request table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorrelatorError {
    #[error("a temperature check is already pending for batch {0}")]
    DuplicateRequest(BatchId),

    #[error("no pending temperature check for batch {0}")]
    NoSuchRequest(BatchId),

    #[error("pending temperature check for batch {0} has expired")]
    RequestExpired(BatchId),

    #[error("correlator lock poisoned")]
    LockError,
}

/// Errors from an external temperature feed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("invalid probe range: min {min} > max {max}")]
    InvalidRange { min: Temperature, max: Temperature },

    #[error("feed unavailable: {0}")]
    Unavailable(String),
}

/// Errors while the oracle worker serves one request.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("reading for batch {batch} rejected: {reason}")]
    Rejected { batch: BatchId, reason: String },
}
