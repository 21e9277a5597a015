//! Candidate model shared by every tier of the funnel.

use serde::{Deserialize, Serialize};

/// Watchlist entry classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Person,
    Organization,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
        }
    }
}

/// The retrieval tier that surfaced a candidate.
///
/// Variant order matters: a numerically higher tier wins during merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    /// Tier 0, precompiled exact patterns.
    Exact,
    /// Tier 1, blocking-key retrieval.
    Blocking,
    /// Tier 2, vector search.
    Vector,
}

impl SourceTier {
    /// Numeric tier level (0 through 2).
    #[inline]
    pub fn rank(&self) -> u8 {
        match self {
            Self::Exact => 0,
            Self::Blocking => 1,
            Self::Vector => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Blocking => "blocking",
            Self::Vector => "vector",
        }
    }
}

/// Which part of the input lined up with the watchlist record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedField {
    Name,
    Alias,
    Identifier,
    BirthDate,
    BlockingKey,
}

/// Record-level context carried alongside a candidate for reranking and audit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandidateMetadata {
    /// Originating list, e.g. `ofac_sdn`.
    pub source: Option<String>,
    /// Sanction program designation, when the list provides one.
    pub program: Option<String>,
    /// Known aliases of the record.
    pub aliases: Vec<String>,
    /// Canonical `KIND:VALUE` identifier tags of the record.
    pub identifiers: Vec<String>,
    /// Birth year of the record, when known.
    pub dob_year: Option<i32>,
    /// Blocking keys the record was indexed under.
    pub blocking_keys: Vec<String>,
}

/// A single watchlist hit, as produced by a retrieval tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable watchlist entry key, unique per list entry.
    pub id: String,
    /// The name or alias text that matched.
    pub matched_text: String,
    pub entity_type: EntityType,
    pub source_tier: SourceTier,
    /// Tier-local score in [0, 1]. Not comparable across tiers.
    pub raw_score: f32,
    /// Calibrated confidence, populated by the reranker. 0.0 until then.
    pub confidence: f32,
    /// Which input fields contributed, in first-contribution order.
    pub matched_fields: Vec<MatchedField>,
    pub metadata: CandidateMetadata,
}

impl Candidate {
    pub fn new(
        id: impl Into<String>,
        matched_text: impl Into<String>,
        entity_type: EntityType,
        source_tier: SourceTier,
        raw_score: f32,
    ) -> Self {
        Self {
            id: id.into(),
            matched_text: matched_text.into(),
            entity_type,
            source_tier,
            raw_score,
            confidence: 0.0,
            matched_fields: Vec::new(),
            metadata: CandidateMetadata::default(),
        }
    }

    #[must_use]
    pub fn with_matched_field(mut self, field: MatchedField) -> Self {
        self.add_matched_field(field);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: CandidateMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Records a contributing field, preserving first-contribution order.
    pub fn add_matched_field(&mut self, field: MatchedField) {
        if !self.matched_fields.contains(&field) {
            self.matched_fields.push(field);
        }
    }

    #[inline]
    pub fn has_field(&self, field: MatchedField) -> bool {
        self.matched_fields.contains(&field)
    }
}

/// Merges candidates surfaced by multiple tiers into a deduplicated set.
///
/// When the same entry id appears more than once, the instance from the
/// highest source tier survives (raw scores are not comparable across tiers,
/// tier level is), and matched fields from the losing instance are unioned
/// into the survivor. First-surfaced order is preserved, and the result is
/// capped at `cap` entries.
pub fn merge_by_id(candidates: Vec<Candidate>, cap: usize) -> Vec<Candidate> {
    let mut merged: Vec<Candidate> = Vec::with_capacity(candidates.len().min(cap));
    let mut position: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for candidate in candidates {
        match position.get(&candidate.id) {
            Some(&at) => {
                let existing = &mut merged[at];
                if candidate.source_tier > existing.source_tier {
                    let mut winner = candidate;
                    for field in existing.matched_fields.clone() {
                        winner.add_matched_field(field);
                    }
                    *existing = winner;
                } else {
                    for field in candidate.matched_fields {
                        existing.add_matched_field(field);
                    }
                }
            }
            None => {
                position.insert(candidate.id.clone(), merged.len());
                merged.push(candidate);
            }
        }
    }

    merged.truncate(cap);
    merged
}
