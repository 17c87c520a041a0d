use coldtrace_oracle::CorrelatorError;
use coldtrace_types::{Address, BatchId};
use thiserror::Error;

/// Ledger-related errors. A failed operation leaves no partial state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("unauthorized: {caller} may not {action}")]
    Unauthorized {
        caller: Address,
        action: &'static str,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("certificate for batch {0} does not verify")]
    CertificateInvalid(BatchId),

    #[error("ledger is halted")]
    Halted,

    #[error("ledger is already halted")]
    AlreadyHalted,

    #[error("ledger is not halted")]
    NotHalted,

    #[error("no pending temperature check for batch {0}")]
    NoSuchRequest(BatchId),

    #[error("a temperature check is already pending for batch {0}")]
    DuplicateRequest(BatchId),

    #[error("pending temperature check for batch {0} has expired")]
    RequestExpired(BatchId),

    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl LedgerError {
    pub(crate) fn batch_not_found(batch_id: &BatchId) -> Self {
        Self::NotFound(format!("batch {batch_id}"))
    }
}

impl From<CorrelatorError> for LedgerError {
    fn from(value: CorrelatorError) -> Self {
        match value {
            CorrelatorError::DuplicateRequest(id) => Self::DuplicateRequest(id),
            CorrelatorError::NoSuchRequest(id) => Self::NoSuchRequest(id),
            CorrelatorError::RequestExpired(id) => Self::RequestExpired(id),
            CorrelatorError::LockError => Self::LockPoisoned("oracle correlator"),
        }
    }
}

/// Errors loading a [`crate::LedgerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
