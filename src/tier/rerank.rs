//! Tier 3: in-process multi-feature reranking.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::time::Instant;
use strsim::{jaro_winkler, normalized_levenshtein};

use super::error::TierError;
use super::{Tier, TierKind, TierOutcome, TierRequest};
use crate::candidate::{Candidate, MatchedField, SourceTier};
use crate::entity::{NormalizedEntity, normalize_name};
use crate::matchers::{NameVectorizer, cosine, phonetic_eq};

/// Feature weights for the rerank sum, each in `[0, 1]`.
///
/// The weights may sum past one; the combined score is clamped. With the
/// defaults, a full-alignment name match reaches high confidence on the name
/// features alone, and identifier or birth-date evidence lifts fuzzy matches
/// the rest of the way.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RerankWeights {
    /// Best edit-distance similarity across name and aliases.
    pub edit: f32,
    /// Surname phonetic equality.
    pub phonetic: f32,
    /// Exact identifier or birth-year hit.
    pub exact_rule: f32,
    /// Vector cosine similarity.
    pub cosine: f32,
}

impl Default for RerankWeights {
    fn default() -> Self {
        Self {
            edit: 0.45,
            phonetic: 0.15,
            exact_rule: 0.35,
            cosine: 0.25,
        }
    }
}

impl RerankWeights {
    /// Rejects NaN, negative, or above-one weights.
    pub fn validate(&self) -> Result<(), TierError> {
        for (name, value) in [
            ("edit", self.edit),
            ("phonetic", self.phonetic),
            ("exact_rule", self.exact_rule),
            ("cosine", self.cosine),
        ] {
            if value.is_nan() || !(0.0..=1.0).contains(&value) {
                return Err(TierError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }
}

/// Tier 3: refines the merged candidate set into calibrated confidences.
///
/// Pure and in-process; no I/O, no clock reads beyond elapsed measurement.
#[derive(Clone)]
pub struct Reranker {
    weights: RerankWeights,
    vectorizer: NameVectorizer,
}

impl Reranker {
    /// Builds a reranker, validating the weights up front.
    pub fn new(weights: RerankWeights, vectorizer: NameVectorizer) -> Result<Self, TierError> {
        weights.validate()?;
        Ok(Self {
            weights,
            vectorizer,
        })
    }

    #[inline]
    pub fn weights(&self) -> &RerankWeights {
        &self.weights
    }

    /// Annotates candidates with final confidence and sorts them descending.
    ///
    /// Ties break toward candidates carrying identifier or birth-date
    /// evidence, then lexicographic id, so equal inputs always produce the
    /// same order.
    pub fn rerank(&self, entity: &NormalizedEntity, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let input_name = entity.normalized_name();
        let input_surname = entity.surname();
        let input_vector = self.vectorizer.vectorize(&input_name);
        let input_tags: Vec<String> = entity.identifiers.iter().map(|id| id.tag()).collect();
        let input_year = entity.birth_year();

        let mut reranked: Vec<Candidate> = candidates
            .into_iter()
            .map(|mut candidate| {
                let edit = best_edit_similarity(&input_name, &candidate);
                let phonetic = surname_phonetic_feature(input_surname, &candidate);
                let exact_rule = self.exact_rule_feature(&input_tags, input_year, &mut candidate);
                let cos = self.cosine_feature(&input_vector, &candidate);

                let score = self.weights.edit * edit
                    + self.weights.phonetic * phonetic
                    + self.weights.exact_rule * exact_rule
                    + self.weights.cosine * cos;
                candidate.confidence = score.clamp(0.0, 1.0);
                candidate
            })
            .collect();

        reranked.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| evidence_rank(b).cmp(&evidence_rank(a)))
                .then_with(|| a.id.cmp(&b.id))
        });
        reranked
    }

    /// 1.0 on an exact identifier or birth-year hit, refreshing the
    /// candidate's matched fields along the way.
    fn exact_rule_feature(
        &self,
        input_tags: &[String],
        input_year: Option<i32>,
        candidate: &mut Candidate,
    ) -> f32 {
        let mut hit = false;

        if !input_tags.is_empty()
            && candidate
                .metadata
                .identifiers
                .iter()
                .any(|id| input_tags.iter().any(|tag| *tag == id.trim().to_uppercase()))
        {
            candidate.add_matched_field(MatchedField::Identifier);
            hit = true;
        }

        if let (Some(year), Some(record_year)) = (input_year, candidate.metadata.dob_year)
            && year == record_year
        {
            candidate.add_matched_field(MatchedField::BirthDate);
            hit = true;
        }

        if hit { 1.0 } else { 0.0 }
    }

    /// Vector-tier candidates already carry a cosine in `raw_score`; for the
    /// rest it is recomputed locally.
    fn cosine_feature(&self, input_vector: &[f32], candidate: &Candidate) -> f32 {
        if candidate.source_tier == SourceTier::Vector {
            return candidate.raw_score.clamp(0.0, 1.0);
        }
        let candidate_vector = self.vectorizer.vectorize(&candidate.matched_text);
        cosine(input_vector, &candidate_vector).clamp(0.0, 1.0)
    }
}

/// Best of Jaro-Winkler and normalized Levenshtein across the record's name
/// and aliases.
fn best_edit_similarity(input_name: &str, candidate: &Candidate) -> f32 {
    let mut best = edit_pair(input_name, &normalize_name(&candidate.matched_text));
    for alias in &candidate.metadata.aliases {
        best = best.max(edit_pair(input_name, &normalize_name(alias)));
    }
    best
}

fn edit_pair(a: &str, b: &str) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    jaro_winkler(a, b).max(normalized_levenshtein(a, b)) as f32
}

fn surname_phonetic_feature(input_surname: Option<&str>, candidate: &Candidate) -> f32 {
    let Some(surname) = input_surname else {
        return 0.0;
    };
    let candidate_surname = candidate.matched_text.split_whitespace().last();
    match candidate_surname {
        Some(record_surname) if phonetic_eq(surname, record_surname) => 1.0,
        _ => 0.0,
    }
}

/// Identifier or birth-date evidence outranks name-only matches at equal
/// confidence.
fn evidence_rank(candidate: &Candidate) -> u8 {
    u8::from(
        candidate.has_field(MatchedField::Identifier)
            || candidate.has_field(MatchedField::BirthDate),
    )
}

#[async_trait]
impl Tier for Reranker {
    fn kind(&self) -> TierKind {
        TierKind::Rerank
    }

    async fn run(&self, request: &TierRequest<'_>) -> TierOutcome {
        let started = Instant::now();
        let candidates = self.rerank(request.entity, request.candidates.to_vec());

        TierOutcome {
            kind: TierKind::Rerank,
            candidates,
            elapsed: started.elapsed(),
            escalate: false,
            error: None,
            degraded: false,
        }
    }
}
