//! Tier 1: blocking-key candidate retrieval.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::error::TierError;
use super::{Tier, TierKind, TierOutcome, TierRequest};
use crate::candidate::{Candidate, MatchedField, SourceTier};
use crate::entity::NormalizedEntity;
use crate::index::{BlockingKey, WatchlistIndex};
use crate::matchers::soundex;

/// Blocking keys for an entity: surname phonetic code, first-name initial,
/// and a ±1 window of birth-year keys when a DOB is present.
///
/// Missing pieces simply produce fewer keys; [`key_confidence`] adjusts its
/// denominator to what was actually generated.
pub fn blocking_keys(entity: &NormalizedEntity) -> Vec<BlockingKey> {
    let mut keys = Vec::new();

    if let Some(surname) = entity.surname()
        && let Some(code) = soundex(surname)
    {
        keys.push(BlockingKey::Phonetic(code));
    }
    if let Some(initial) = entity.first_initial()
        && let Some(initial) = initial.to_lowercase().next()
    {
        keys.push(BlockingKey::Initial(initial));
    }
    if let Some(year) = entity.birth_year() {
        for y in [year - 1, year, year + 1] {
            keys.push(BlockingKey::BirthYear(y));
        }
    }

    keys
}

/// Fraction of generated key groups the record's stored keys hit.
///
/// The three year keys form one group: a record has a single birth year, and
/// landing anywhere in the ±1 window counts the group as matched. Text
/// similarity plays no part here.
pub fn key_confidence(generated: &[BlockingKey], stored: &[String]) -> f32 {
    let mut groups = 0u32;
    let mut matched = 0u32;

    let mut tally = |group: &[&BlockingKey]| {
        if group.is_empty() {
            return;
        }
        groups += 1;
        if group
            .iter()
            .any(|key| stored.iter().any(|s| *s == key.as_index_key()))
        {
            matched += 1;
        }
    };

    let phonetic: Vec<&BlockingKey> = generated
        .iter()
        .filter(|k| matches!(k, BlockingKey::Phonetic(_)))
        .collect();
    let initial: Vec<&BlockingKey> = generated
        .iter()
        .filter(|k| matches!(k, BlockingKey::Initial(_)))
        .collect();
    let years: Vec<&BlockingKey> = generated
        .iter()
        .filter(|k| matches!(k, BlockingKey::BirthYear(_)))
        .collect();

    tally(&phonetic);
    tally(&initial);
    tally(&years);

    if groups == 0 {
        0.0
    } else {
        matched as f32 / groups as f32
    }
}

/// Tier 1 retriever: cheap, recall-oriented, bounded.
pub struct Blocker<I> {
    index: Arc<I>,
    limit: u64,
    escalate_below: f32,
}

impl<I> Clone for Blocker<I> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            limit: self.limit,
            escalate_below: self.escalate_below,
        }
    }
}

impl<I: WatchlistIndex> Blocker<I> {
    pub fn new(index: Arc<I>, limit: u64, escalate_below: f32) -> Self {
        Self {
            index,
            limit,
            escalate_below,
        }
    }

    async fn retrieve(
        &self,
        entity: &NormalizedEntity,
    ) -> (Vec<Candidate>, bool, Option<TierError>) {
        let keys = blocking_keys(entity);
        if keys.is_empty() {
            return (Vec::new(), true, None);
        }

        match self.index.blocking_search(&keys, self.limit).await {
            Ok(records) => {
                let mut candidates: Vec<Candidate> = records
                    .iter()
                    .map(|record| {
                        let raw = key_confidence(&keys, &record.blocking_keys);
                        record
                            .to_candidate(SourceTier::Blocking, raw)
                            .with_matched_field(MatchedField::BlockingKey)
                    })
                    .collect();

                candidates.sort_by(|a, b| {
                    b.raw_score
                        .partial_cmp(&a.raw_score)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.id.cmp(&b.id))
                });

                let best = candidates.first().map(|c| c.raw_score).unwrap_or(0.0);
                let escalate = candidates.is_empty() || best < self.escalate_below;
                (candidates, escalate, None)
            }
            Err(err) => {
                warn!(error = %err, "blocking search failed; escalating");
                (Vec::new(), true, Some(TierError::from(err)))
            }
        }
    }
}

#[async_trait]
impl<I: WatchlistIndex> Tier for Blocker<I> {
    fn kind(&self) -> TierKind {
        TierKind::Blocking
    }

    async fn run(&self, request: &TierRequest<'_>) -> TierOutcome {
        let started = Instant::now();
        let (candidates, escalate, error) = self.retrieve(request.entity).await;
        debug!(
            hits = candidates.len(),
            escalate, "blocking tier complete"
        );

        TierOutcome {
            kind: TierKind::Blocking,
            candidates,
            elapsed: started.elapsed(),
            escalate,
            error,
            degraded: false,
        }
    }
}
