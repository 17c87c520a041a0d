use crate::error::FeedError;
use async_trait::async_trait;
use coldtrace_types::Temperature;
use rand::Rng;

/// External temperature source, queried by the oracle principal only.
#[async_trait]
pub trait TemperatureFeed: Send + Sync {
    /// Fetch one integer reading within `[min, max]`.
    async fn fetch(&self, min: Temperature, max: Temperature) -> Result<Temperature, FeedError>;
}

/// Uniform random readings, standing in for a remote sensor service.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimulatedFeed;

#[async_trait]
impl TemperatureFeed for SimulatedFeed {
    async fn fetch(&self, min: Temperature, max: Temperature) -> Result<Temperature, FeedError> {
        if min > max {
            return Err(FeedError::InvalidRange { min, max });
        }
        Ok(rand::thread_rng().gen_range(min..=max))
    }
}

/// Always reports the same reading.
#[derive(Clone, Copy, Debug)]
pub struct FixedFeed(pub Temperature);

#[async_trait]
impl TemperatureFeed for FixedFeed {
    async fn fetch(&self, _min: Temperature, _max: Temperature) -> Result<Temperature, FeedError> {
        Ok(self.0)
    }
}
