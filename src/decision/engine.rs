//! Weighted score fusion and risk classification.

use super::config::{RiskThresholds, ScoreWeights};
use super::error::DecisionResult;
use super::types::{Decision, DecisionEvidence, ReasonCode, RequiredField, RiskLevel, ScoreBreakdown};
use crate::candidate::SourceTier;
use crate::entity::PrefilterVerdict;
use std::collections::HashSet;

/// Pure fusion of tier evidence into a [`Decision`].
///
/// Holds only validated weights and thresholds; [`DecisionEngine::decide`]
/// reads no clock, spawns nothing, and touches no I/O, so identical evidence
/// always yields an identical decision, reason order included.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    weights: ScoreWeights,
    thresholds: RiskThresholds,
}

impl DecisionEngine {
    /// Builds an engine, validating weights and thresholds up front.
    pub fn new(weights: ScoreWeights, thresholds: RiskThresholds) -> DecisionResult<Self> {
        weights.validate()?;
        thresholds.validate()?;
        Ok(Self {
            weights,
            thresholds,
        })
    }

    #[inline]
    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    #[inline]
    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Classifies one request from assembled evidence.
    ///
    /// Returns an error only when weights or thresholds are out of range,
    /// which construction-time validation makes unreachable in practice; the
    /// runtime check stays so a corrupted configuration can never classify.
    pub fn decide(&self, evidence: &DecisionEvidence) -> DecisionResult<Decision> {
        self.weights.validate()?;
        self.thresholds.validate()?;

        if evidence.prefilter.verdict == PrefilterVerdict::NoEntity {
            return Ok(Decision {
                risk_score: 0.0,
                risk_level: RiskLevel::Skip,
                breakdown: ScoreBreakdown::default(),
                review_required: false,
                required_additional_fields: Vec::new(),
                decision_reasons: vec![ReasonCode::PrefilterSkip],
            });
        }

        let breakdown = self.breakdown(evidence);
        let risk_score = clamp_unit(breakdown.total());
        let risk_level = if risk_score >= self.thresholds.high {
            RiskLevel::High
        } else if risk_score >= self.thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        // High risk closes without review only on identifier or DOB evidence.
        let evidence_closed = evidence.id_exact_match || evidence.dob_match;
        let (review_required, required_additional_fields) =
            if risk_level == RiskLevel::High && !evidence_closed {
                let mut missing = Vec::new();
                if !evidence.id_exact_match {
                    missing.push(RequiredField::Tin);
                }
                if !evidence.dob_match {
                    missing.push(RequiredField::Dob);
                }
                (true, missing)
            } else {
                (false, Vec::new())
            };

        let decision_reasons = self.reasons(evidence, &breakdown);

        Ok(Decision {
            risk_score,
            risk_level,
            breakdown,
            review_required,
            required_additional_fields,
            decision_reasons,
        })
    }

    fn breakdown(&self, evidence: &DecisionEvidence) -> ScoreBreakdown {
        let prefilter = &evidence.prefilter;
        ScoreBreakdown {
            smartfilter_signal: clamp_unit(self.weights.smartfilter * clamp_unit(prefilter.signal)),
            person_evidence: clamp_unit(
                self.weights.person_evidence * clamp_unit(prefilter.person_evidence),
            ),
            org_evidence: clamp_unit(self.weights.org_evidence * clamp_unit(prefilter.org_evidence)),
            similarity_top: clamp_unit(self.weights.similarity * clamp_unit(evidence.similarity_top)),
            id_exact_match: if evidence.id_exact_match {
                clamp_unit(self.weights.id_exact)
            } else {
                0.0
            },
            dob_match: if evidence.dob_match {
                clamp_unit(self.weights.dob)
            } else {
                0.0
            },
        }
    }

    /// Generation order is fixed: hard evidence, similarity band, signal
    /// components, decisive tier, degradations. Duplicates keep their first
    /// occurrence.
    fn reasons(&self, evidence: &DecisionEvidence, breakdown: &ScoreBreakdown) -> Vec<ReasonCode> {
        let mut reasons = Vec::new();

        if evidence.id_exact_match {
            reasons.push(ReasonCode::IdExactMatch);
        }
        if evidence.dob_match {
            reasons.push(ReasonCode::DobMatch);
        }

        let similarity = clamp_unit(evidence.similarity_top);
        if similarity >= self.thresholds.high {
            reasons.push(ReasonCode::StrongNameSimilarity);
        } else if similarity >= self.thresholds.medium {
            reasons.push(ReasonCode::ModerateNameSimilarity);
        } else if similarity > 0.0 {
            reasons.push(ReasonCode::WeakNameSimilarity);
        }

        if breakdown.smartfilter_signal > 0.0 {
            reasons.push(ReasonCode::SmartfilterSignal);
        }
        if breakdown.person_evidence > 0.0 {
            reasons.push(ReasonCode::PersonEvidence);
        }
        if breakdown.org_evidence > 0.0 {
            reasons.push(ReasonCode::OrgEvidence);
        }

        match evidence.decisive_tier {
            Some(SourceTier::Exact) => reasons.push(ReasonCode::DecisiveExact),
            Some(SourceTier::Blocking) => reasons.push(ReasonCode::DecisiveBlocking),
            Some(SourceTier::Vector) => reasons.push(ReasonCode::DecisiveVector),
            None => reasons.push(ReasonCode::NoCandidates),
        }

        reasons.extend(evidence.degradations.iter().copied());

        let mut seen = HashSet::new();
        reasons.retain(|reason| seen.insert(*reason));
        reasons
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        // Presets are valid by construction.
        Self {
            weights: ScoreWeights::conservative(),
            thresholds: RiskThresholds::default(),
        }
    }
}

/// Clamps to `[0, 1]`, mapping NaN to zero.
#[inline]
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
