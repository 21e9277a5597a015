use thiserror::Error;

use crate::decision::DecisionError;

/// Fatal screening failures.
///
/// Tier backend trouble never lands here: it degrades the funnel and shows up
/// as reason codes on the decision instead. What remains fatal is input that
/// cannot be screened at all, configuration rejected at construction, and the
/// decision engine itself failing.
#[derive(Debug, Error)]
pub enum ScreeningError {
    /// The input entity cannot be screened.
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// A component rejected its configuration at construction time.
    #[error("invalid configuration {name}: {value}")]
    InvalidConfig { name: &'static str, value: String },

    /// Decision engine failure.
    #[error("decision engine failed")]
    Internal {
        #[from]
        source: DecisionError,
    },
}
