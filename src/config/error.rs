//! Configuration error types.

use thiserror::Error;

use crate::cache::CacheError;
use crate::decision::DecisionError;
use crate::matchers::VectorizerError;
use crate::pipeline::ScreeningError;
use crate::tier::TierError;

/// Why an assembled [`ScreeningConfig`](super::ScreeningConfig) was rejected.
///
/// Each section validates itself; this enum wraps the section errors so a
/// single `validate` call reports the first offender with its source intact.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The cache section carried a zero capacity or TTL.
    #[error("cache section rejected")]
    Cache {
        #[from]
        source: CacheError,
    },

    /// A score weight or risk threshold was out of range.
    #[error("score weights or risk thresholds rejected")]
    Decision {
        #[from]
        source: DecisionError,
    },

    /// A rerank weight was out of range.
    #[error("rerank weights rejected")]
    Rerank {
        #[from]
        source: TierError,
    },

    /// The vectorizer section carried an unusable dimension or n-gram range.
    #[error("vectorizer section rejected")]
    Vectorizer {
        #[from]
        source: VectorizerError,
    },

    /// The funnel or budget section was internally inconsistent.
    #[error("funnel or budget section rejected")]
    Pipeline {
        #[from]
        source: ScreeningError,
    },

    /// The index URL was empty.
    #[error("index url must not be empty")]
    EmptyIndexUrl,

    /// The index collection name was empty.
    #[error("index collection must not be empty")]
    EmptyIndexCollection,
}
