//! Result cache: request-scoped memoization of screening decisions.
//!
//! Screening the same entity under the same policy flags is deterministic, so
//! the complete [`ScreeningResult`](crate::pipeline::ScreeningResult) is
//! memoized across requests. Concurrent same-key screenings may both compute
//! and store; last write wins.

pub mod error;
pub mod store;


pub use error::{CacheError, CacheResult};
pub use store::{CacheMetrics, DecisionCache};

use std::env;
use std::time::Duration;

/// Result cache settings.
///
/// Use [`CacheConfig::from_env`] to read `GATEHOUSE_*` overrides on top of
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Max cached screening results. Default: `50_000`.
    pub capacity: u64,

    /// TTL applied to entries written by the pipeline. Default: `600s`.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 50_000,
            ttl: Duration::from_secs(600),
        }
    }
}

impl CacheConfig {
    const ENV_CAPACITY: &'static str = "GATEHOUSE_CACHE_CAPACITY";
    const ENV_TTL_SECS: &'static str = "GATEHOUSE_CACHE_TTL_SECS";

    /// Loads the configuration from environment variables (falling back to
    /// defaults).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let capacity = parse_u64_from_env(Self::ENV_CAPACITY, defaults.capacity);
        let ttl_secs = parse_u64_from_env(Self::ENV_TTL_SECS, defaults.ttl.as_secs());

        Self {
            capacity,
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Validates bounds; a zero capacity or TTL would make every write a
    /// no-op or an error.
    pub fn validate(&self) -> CacheResult<()> {
        if self.ttl.is_zero() {
            return Err(CacheError::InvalidTtl { ttl: self.ttl });
        }
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
    env::var(var_name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
