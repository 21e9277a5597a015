//! Score weights and risk thresholds.

use serde::{Deserialize, Serialize};
use std::env;

use super::error::{DecisionError, DecisionResult};

/// Per-component score weights, each in `[0, 1]`.
///
/// Two tuned sets are in active use; neither is canonical. The active set is
/// injected at construction and defaults to [`ScoreWeights::conservative`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Pre-filter entity-shape signal.
    pub smartfilter: f32,
    /// Natural-person evidence signal.
    pub person_evidence: f32,
    /// Organization evidence signal.
    pub org_evidence: f32,
    /// Best reranked candidate confidence.
    pub similarity: f32,
    /// Exact identifier match bonus.
    pub id_exact: f32,
    /// Date-of-birth match bonus.
    pub dob: f32,
}

impl ScoreWeights {
    const ENV_PRESET: &'static str = "GATEHOUSE_SCORE_PRESET";

    /// Identifier-heavy set: a lone fuzzy name match cannot clear the high
    /// threshold, an exact identifier together with a strong name can.
    pub fn conservative() -> Self {
        Self {
            smartfilter: 0.05,
            person_evidence: 0.05,
            org_evidence: 0.05,
            similarity: 0.40,
            id_exact: 0.50,
            dob: 0.15,
        }
    }

    /// Similarity-heavy set: strong name-only matches reach medium on their
    /// own, at the cost of more review queue volume.
    pub fn recall_tuned() -> Self {
        Self {
            smartfilter: 0.10,
            person_evidence: 0.10,
            org_evidence: 0.10,
            similarity: 0.55,
            id_exact: 0.35,
            dob: 0.10,
        }
    }

    /// Selects a preset by name from `GATEHOUSE_SCORE_PRESET`
    /// (`conservative` or `recall_tuned`; anything else falls back to
    /// conservative).
    pub fn from_env() -> Self {
        match env::var(Self::ENV_PRESET).as_deref() {
            Ok("recall_tuned") => Self::recall_tuned(),
            _ => Self::conservative(),
        }
    }

    /// Rejects NaN, negative, or above-one weights.
    pub fn validate(&self) -> DecisionResult<()> {
        for (name, value) in [
            ("smartfilter", self.smartfilter),
            ("person_evidence", self.person_evidence),
            ("org_evidence", self.org_evidence),
            ("similarity", self.similarity),
            ("id_exact", self.id_exact),
            ("dob", self.dob),
        ] {
            if value.is_nan() || !(0.0..=1.0).contains(&value) {
                return Err(DecisionError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::conservative()
    }
}

/// Risk classification cut-offs on the clamped `risk_score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Scores at or above this are `High`. Default: `0.85`.
    pub high: f32,
    /// Scores at or above this (and below `high`) are `Medium`.
    /// Default: `0.60`.
    pub medium: f32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: 0.85,
            medium: 0.60,
        }
    }
}

impl RiskThresholds {
    const ENV_HIGH: &'static str = "GATEHOUSE_THRESHOLD_HIGH";
    const ENV_MEDIUM: &'static str = "GATEHOUSE_THRESHOLD_MEDIUM";

    /// Loads thresholds from environment variables (falling back to
    /// defaults).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            high: parse_f32_from_env(Self::ENV_HIGH, defaults.high),
            medium: parse_f32_from_env(Self::ENV_MEDIUM, defaults.medium),
        }
    }

    /// Enforces `0 <= medium < high <= 1`.
    pub fn validate(&self) -> DecisionResult<()> {
        let ordered = self.medium >= 0.0 && self.medium < self.high && self.high <= 1.0;
        if self.high.is_nan() || self.medium.is_nan() || !ordered {
            return Err(DecisionError::InvalidThresholds {
                high: self.high,
                medium: self.medium,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn with_high(mut self, high: f32) -> Self {
        self.high = high;
        self
    }

    #[must_use]
    pub fn with_medium(mut self, medium: f32) -> Self {
        self.medium = medium;
        self
    }
}

fn parse_f32_from_env(var_name: &str, default: f32) -> f32 {
    env::var(var_name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
