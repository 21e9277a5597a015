use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::candidate::Candidate;
use crate::decision::Decision;
use crate::tier::{TierKind, TierOutcome};

/// What a single tier did for one request, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDiagnostics {
    pub kind: TierKind,
    /// `false` when the funnel skipped the tier (early stop, policy flag,
    /// or no escalation).
    pub invoked: bool,
    pub elapsed_ms: u64,
    pub candidate_count: usize,
    /// Backend or deadline failure, stringified for the audit record.
    pub error: Option<String>,
}

impl TierDiagnostics {
    pub fn from_outcome(outcome: &TierOutcome) -> Self {
        Self {
            kind: outcome.kind,
            invoked: true,
            elapsed_ms: outcome.elapsed.as_millis() as u64,
            candidate_count: outcome.candidates.len(),
            error: outcome.error.as_ref().map(|e| e.to_string()),
        }
    }

    pub fn skipped(kind: TierKind) -> Self {
        Self {
            kind,
            invoked: false,
            elapsed_ms: 0,
            candidate_count: 0,
            error: None,
        }
    }
}

/// The complete outcome of screening one entity.
///
/// This is what callers receive, what the cache stores, and what shadow
/// comparison reads. Serializable end to end for audit sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    /// Unique id for this screening run, carried through every log line.
    pub audit_id: Uuid,
    pub decision: Decision,
    /// Ranked candidates, best confidence first.
    pub candidates: Vec<Candidate>,
    /// One entry per funnel tier, in funnel order.
    pub tier_diagnostics: Vec<TierDiagnostics>,
    /// `true` when this result was served from the cache.
    pub cache_hit: bool,
    pub screened_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl ScreeningResult {
    /// The highest-confidence candidate, when any survived the funnel.
    #[inline]
    pub fn best_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}
