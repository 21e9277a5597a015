//! Retrieval and refinement tiers of the screening funnel.
//!
//! Each tier implements the [`Tier`] trait so the orchestrator can drive
//! them uniformly and collect per-tier diagnostics. Tier 0 is in-process,
//! Tiers 1 and 2 call the backing index, Tier 3 is pure refinement of the
//! merged candidate set.

pub mod blocking;
pub mod error;
pub mod exact;
pub mod rerank;
pub mod vector;

#[cfg(test)]
mod exact_tests;
#[cfg(test)]
mod vector_tests;

pub use blocking::{Blocker, blocking_keys};
pub use error::TierError;
pub use exact::{ExactMatcher, PatternSet};
pub use rerank::{Reranker, RerankWeights};
pub use vector::VectorSearcher;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::candidate::Candidate;
use crate::decision::ReasonCode;
use crate::entity::NormalizedEntity;

/// Funnel stage discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    Exact,
    Blocking,
    Vector,
    Rerank,
}

impl TierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Blocking => "blocking",
            Self::Vector => "vector",
            Self::Rerank => "rerank",
        }
    }
}

impl std::fmt::Display for TierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request input handed to a tier.
#[derive(Debug, Clone, Copy)]
pub struct TierRequest<'a> {
    pub entity: &'a NormalizedEntity,
    /// Candidates from earlier tiers; only the reranker reads these.
    pub candidates: &'a [Candidate],
    /// Global request deadline. Tiers that suspend must not outlive it.
    pub deadline: Option<Instant>,
}

impl<'a> TierRequest<'a> {
    pub fn new(entity: &'a NormalizedEntity) -> Self {
        Self {
            entity,
            candidates: &[],
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_candidates(mut self, candidates: &'a [Candidate]) -> Self {
        self.candidates = candidates;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// What one tier invocation produced.
///
/// Consumed by the orchestrator immediately; never persisted. A set `error`
/// means the tier degraded, not that the request failed.
#[derive(Debug)]
pub struct TierOutcome {
    pub kind: TierKind,
    pub candidates: Vec<Candidate>,
    pub elapsed: Duration,
    /// Tier 1's hint that cheap retrieval was not conclusive.
    pub escalate: bool,
    pub error: Option<TierError>,
    /// Set when the tier answered through a fallback path.
    pub degraded: bool,
}

impl TierOutcome {
    pub fn empty(kind: TierKind) -> Self {
        Self {
            kind,
            candidates: Vec::new(),
            elapsed: Duration::ZERO,
            escalate: false,
            error: None,
            degraded: false,
        }
    }

    /// Best tier-local score among the candidates.
    pub fn best_raw_score(&self) -> Option<f32> {
        self.candidates
            .iter()
            .map(|c| c.raw_score)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// The audit code this outcome contributes when the tier ran degraded.
    pub fn degradation_reason(&self) -> Option<ReasonCode> {
        if let Some(error) = &self.error {
            return Some(match self.kind {
                TierKind::Exact => ReasonCode::ExactLookupDegraded,
                TierKind::Blocking => ReasonCode::BlockingDegraded,
                TierKind::Vector if error.is_timeout() => ReasonCode::VectorSearchTimeout,
                TierKind::Vector => ReasonCode::VectorSearchDegraded,
                TierKind::Rerank => return None,
            });
        }
        if self.degraded {
            return Some(match self.kind {
                TierKind::Exact => ReasonCode::ExactLookupDegraded,
                TierKind::Blocking => ReasonCode::BlockingDegraded,
                TierKind::Vector => ReasonCode::VectorSearchDegraded,
                TierKind::Rerank => return None,
            });
        }
        None
    }
}

/// A stage of the funnel, drivable behind `dyn` for uniform orchestration.
#[async_trait]
pub trait Tier: Send + Sync {
    fn kind(&self) -> TierKind;

    /// Runs the tier. Degradations are reported on the outcome, never as a
    /// panic or a request-fatal error.
    async fn run(&self, request: &TierRequest<'_>) -> TierOutcome;
}
