//! Decision engine error types.

use thiserror::Error;

/// Result alias for decision operations.
pub type DecisionResult<T> = Result<T, DecisionError>;

/// Invariant violations inside the decision engine.
///
/// These are fatal to the request: a misconfigured engine must never emit a
/// silently-corrected classification.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// A score weight is NaN, negative, or above one.
    #[error("invalid score weight '{name}' = {value}: must be within [0, 1]")]
    InvalidWeight { name: &'static str, value: f32 },

    /// Thresholds violate `0 <= medium < high <= 1`.
    #[error("invalid risk thresholds high={high} medium={medium}: must satisfy 0 <= medium < high <= 1")]
    InvalidThresholds { high: f32, medium: f32 },
}
