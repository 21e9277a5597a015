//! Decision data model.

use serde::{Deserialize, Serialize};

use crate::candidate::SourceTier;
use crate::entity::PrefilterSignal;

/// Risk classification assigned to a screening request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// At or above the high threshold; candidate for blocking or escalation.
    High,
    /// Between the medium and high thresholds; worth an analyst look.
    Medium,
    /// Below the medium threshold.
    Low,
    /// Pre-filter judged the input to contain no screenable entity.
    Skip,
}

impl RiskLevel {
    /// Stable lowercase label.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Skip => "skip",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named score components, each already weight-multiplied and clamped to
/// `[0, 1]`.
///
/// The final `risk_score` is the clamped sum of these fields; keeping the
/// post-weight contributions makes the audit trail show exactly what drove a
/// classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Pre-filter entity-shape signal contribution.
    pub smartfilter_signal: f32,
    /// Natural-person evidence contribution.
    pub person_evidence: f32,
    /// Organization evidence contribution.
    pub org_evidence: f32,
    /// Best reranked candidate confidence contribution.
    pub similarity_top: f32,
    /// Exact identifier match bonus (zero when no identifier matched).
    pub id_exact_match: f32,
    /// Date-of-birth match bonus (zero when no DOB matched).
    pub dob_match: f32,
}

impl ScoreBreakdown {
    /// Sum of all components, not yet clamped.
    #[inline]
    pub fn total(&self) -> f32 {
        self.smartfilter_signal
            + self.person_evidence
            + self.org_evidence
            + self.similarity_top
            + self.id_exact_match
            + self.dob_match
    }
}

/// Evidence type an analyst must still verify before a high-risk hit is
/// considered closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequiredField {
    /// Taxpayer identification number.
    Tin,
    /// Date of birth.
    Dob,
}

impl RequiredField {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tin => "TIN",
            Self::Dob => "DOB",
        }
    }
}

/// Stable audit-trail reason code.
///
/// Codes are emitted in a fixed generation order (evidence, similarity band,
/// signals, decisive tier, degradations) and deduplicated preserving first
/// occurrence, so identical inputs always produce an identical list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Pre-filter verdict was `NoEntity`; scoring was skipped.
    PrefilterSkip,
    /// An input identifier exactly matched a watchlist record.
    IdExactMatch,
    /// Input date of birth matched the record's birth year.
    DobMatch,
    /// Best candidate similarity at or above the high threshold.
    StrongNameSimilarity,
    /// Best candidate similarity at or above the medium threshold.
    ModerateNameSimilarity,
    /// Best candidate similarity above zero but below the medium threshold.
    WeakNameSimilarity,
    /// Pre-filter entity-shape signal contributed to the score.
    SmartfilterSignal,
    /// Person-evidence signal contributed to the score.
    PersonEvidence,
    /// Organization-evidence signal contributed to the score.
    OrgEvidence,
    /// The decisive candidate came from the exact tier.
    DecisiveExact,
    /// The decisive candidate came from the blocking tier.
    DecisiveBlocking,
    /// The decisive candidate came from the vector tier.
    DecisiveVector,
    /// No tier surfaced any candidate.
    NoCandidates,
    /// Exact lookup fell back or failed; tier 0 ran degraded.
    ExactLookupDegraded,
    /// Blocking retrieval failed; tier 1 contributed no candidates.
    BlockingDegraded,
    /// Vector search failed; tier 2 contributed no candidates.
    VectorSearchDegraded,
    /// Vector search hit its deadline; results may be partial.
    VectorSearchTimeout,
    /// Cache read or write failed; the request proceeded as a miss.
    CacheBypassed,
}

impl ReasonCode {
    /// Stable snake_case code for audit trails and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrefilterSkip => "prefilter_skip",
            Self::IdExactMatch => "id_exact_match",
            Self::DobMatch => "dob_match",
            Self::StrongNameSimilarity => "strong_name_similarity",
            Self::ModerateNameSimilarity => "moderate_name_similarity",
            Self::WeakNameSimilarity => "weak_name_similarity",
            Self::SmartfilterSignal => "smartfilter_signal",
            Self::PersonEvidence => "person_evidence",
            Self::OrgEvidence => "org_evidence",
            Self::DecisiveExact => "decisive_exact",
            Self::DecisiveBlocking => "decisive_blocking",
            Self::DecisiveVector => "decisive_vector",
            Self::NoCandidates => "no_candidates",
            Self::ExactLookupDegraded => "exact_lookup_degraded",
            Self::BlockingDegraded => "blocking_degraded",
            Self::VectorSearchDegraded => "vector_search_degraded",
            Self::VectorSearchTimeout => "vector_search_timeout",
            Self::CacheBypassed => "cache_bypassed",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified outcome of a screening request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Weighted component sum, clamped to `[0, 1]`.
    pub risk_score: f32,
    pub risk_level: RiskLevel,
    pub breakdown: ScoreBreakdown,
    /// `true` when the hit is high risk but neither identifier nor DOB
    /// evidence closed it.
    pub review_required: bool,
    /// Evidence an analyst must collect when `review_required` is set;
    /// empty otherwise.
    pub required_additional_fields: Vec<RequiredField>,
    /// Ordered, deduplicated audit codes. Degradations always appear here.
    pub decision_reasons: Vec<ReasonCode>,
}

/// Everything the engine needs to classify one request.
///
/// Assembled by the orchestrator after reranking; the engine itself performs
/// no I/O and reads no clock, so equal evidence always produces an equal
/// [`Decision`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionEvidence {
    /// Upstream pre-filter verdict and signals, carried on the input entity.
    pub prefilter: PrefilterSignal,
    /// Best reranked candidate confidence in `[0, 1]`; zero when the funnel
    /// produced nothing.
    pub similarity_top: f32,
    /// An input identifier exactly matched the best candidate's identifiers.
    pub id_exact_match: bool,
    /// Input DOB year matched the best candidate's recorded birth year.
    pub dob_match: bool,
    /// Tier that surfaced the best candidate; `None` when the funnel came
    /// back empty.
    pub decisive_tier: Option<SourceTier>,
    /// Degradation codes observed by the orchestrator, in funnel order.
    pub degradations: Vec<ReasonCode>,
}
