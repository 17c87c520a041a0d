use crate::error::ConfigError;
use chrono::{Duration, Utc};
use coldtrace_oracle::ProbeRange;
use coldtrace_types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Construction-time configuration of a [`crate::BatchLedger`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Administers the producer allow-list and the halt switch.
    pub administrator: Address,
    /// The only principal whose temperature readings are accepted.
    pub oracle: Address,
    /// Pending temperature checks expire after this many seconds.
    /// Unset means requests wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_request_ttl_secs: Option<u64>,
    /// Range forwarded to the temperature feed with each request.
    #[serde(default)]
    pub probe_range: ProbeRange,
}

impl LedgerConfig {
    pub fn new(administrator: Address, oracle: Address) -> Self {
        Self {
            administrator,
            oracle,
            pending_request_ttl_secs: None,
            probe_range: ProbeRange::default(),
        }
    }

    pub fn with_probe_range(mut self, range: ProbeRange) -> Self {
        self.probe_range = range;
        self
    }

    pub fn with_pending_request_ttl_secs(mut self, secs: u64) -> Self {
        self.pending_request_ttl_secs = Some(secs);
        self
    }

    /// Template written by `coldtrace config`.
    pub fn template() -> Self {
        Self::new(
            Address::from_label("administrator"),
            Address::from_label("oracle"),
        )
    }

    pub fn pending_request_ttl(&self) -> Option<Duration> {
        self.pending_request_ttl_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_range.min > self.probe_range.max {
            return Err(ConfigError::Invalid(format!(
                "probe_range min {} exceeds max {}",
                self.probe_range.min, self.probe_range.max
            )));
        }
        match self.pending_request_ttl_secs {
            Some(0) => Err(ConfigError::Invalid(
                "pending_request_ttl_secs must be positive".to_string(),
            )),
            Some(secs) if !self.ttl_is_representable() => Err(ConfigError::Invalid(format!(
                "pending_request_ttl_secs {secs} reaches past the supported date range"
            ))),
            _ => Ok(()),
        }
    }

    fn ttl_is_representable(&self) -> bool {
        self.pending_request_ttl()
            .is_some_and(|ttl| Utc::now().checked_add_signed(ttl).is_some())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
