//! Tier error types.

use thiserror::Error;

use crate::index::IndexError;

/// Failures inside a single tier invocation.
///
/// Backend and deadline variants degrade the tier; weight and build variants
/// surface at construction time.
#[derive(Debug, Error)]
pub enum TierError {
    /// The backing index call failed.
    #[error("backend call failed: {source}")]
    Backend {
        #[from]
        source: IndexError,
    },

    /// The tier hit the request deadline before the backend answered.
    #[error("tier deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    /// The exact-match automaton could not be built.
    #[error("pattern automaton build failed: {source}")]
    AutomatonBuild {
        #[from]
        source: aho_corasick::BuildError,
    },

    /// A rerank weight is NaN, negative, or above one.
    #[error("invalid rerank weight '{name}' = {value}: must be within [0, 1]")]
    InvalidWeight { name: &'static str, value: f32 },
}

impl TierError {
    /// `true` when the failure was running out of time rather than a hard
    /// backend fault.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Backend { source } => source.is_timeout(),
            Self::DeadlineExceeded { .. } => true,
            _ => false,
        }
    }
}
