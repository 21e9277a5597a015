//! Watchlist index access.
//!
//! The funnel reads its backing index through [`WatchlistIndex`], a narrow,
//! read-only interface with exactly the three retrieval shapes the tiers
//! need. Mapping raw index records into scored candidates stays in core
//! logic; backends only fetch. Production uses Qdrant; tests use the
//! in-memory mock.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;

pub use client::{QdrantWatchlistIndex, WatchlistIndex};
pub use error::{IndexError, IndexResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockWatchlistIndex;
pub use model::{BlockingKey, RawRecord, ScoredRecord};

/// Default collection holding watchlist entries.
pub const DEFAULT_COLLECTION: &str = "watchlist_entries";
