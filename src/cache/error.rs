//! Cache error types.

use std::time::Duration;
use thiserror::Error;

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur when reading from or writing to the result cache.
///
/// None of these are fatal to a screening request: callers bypass the cache
/// and proceed as on a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A store was attempted with a TTL the cache cannot honor.
    #[error("invalid cache ttl {ttl:?}: must be greater than zero")]
    InvalidTtl { ttl: Duration },

    /// The configured capacity leaves no room to store anything.
    #[error("invalid cache capacity {capacity}: must be greater than zero")]
    InvalidCapacity { capacity: u64 },
}
