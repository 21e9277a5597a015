//! Decision engine: deterministic fusion of tier evidence into a risk
//! classification.
//!
//! Everything here is pure. Retrieval, timing, and degradation tracking live
//! in [`crate::pipeline`]; this module only turns assembled
//! [`DecisionEvidence`] into a [`Decision`] under injected weights and
//! thresholds.

pub mod config;
pub mod engine;
pub mod error;
pub mod types;


pub use config::{RiskThresholds, ScoreWeights};
pub use engine::DecisionEngine;
pub use error::{DecisionError, DecisionResult};
pub use types::{
    Decision, DecisionEvidence, ReasonCode, RequiredField, RiskLevel, ScoreBreakdown,
};
