//! Tier 2: approximate nearest-neighbour retrieval over name vectors.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::TierError;
use super::{Tier, TierKind, TierOutcome, TierRequest};
use crate::candidate::{Candidate, MatchedField, SourceTier};
use crate::entity::NormalizedEntity;
use crate::index::WatchlistIndex;
use crate::matchers::NameVectorizer;

/// Tier 2 retriever: the latency-expensive path, invoked on escalation only.
///
/// Every call is boxed by `min(call_timeout, remaining request budget)`; on
/// expiry the tier returns whatever arrived before the deadline (possibly
/// nothing) with a timeout error, never blocking the request past budget.
pub struct VectorSearcher<I> {
    index: Arc<I>,
    vectorizer: NameVectorizer,
    top_k: u64,
    call_timeout: Duration,
}

impl<I> Clone for VectorSearcher<I> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            vectorizer: self.vectorizer.clone(),
            top_k: self.top_k,
            call_timeout: self.call_timeout,
        }
    }
}

impl<I: WatchlistIndex> VectorSearcher<I> {
    pub fn new(
        index: Arc<I>,
        vectorizer: NameVectorizer,
        top_k: u64,
        call_timeout: Duration,
    ) -> Self {
        Self {
            index,
            vectorizer,
            top_k,
            call_timeout,
        }
    }

    #[inline]
    pub fn vectorizer(&self) -> &NameVectorizer {
        &self.vectorizer
    }

    async fn retrieve(
        &self,
        entity: &NormalizedEntity,
        deadline: Option<tokio::time::Instant>,
    ) -> (Vec<Candidate>, Option<TierError>) {
        let mut timeout = self.call_timeout;
        if let Some(deadline) = deadline {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                warn!("request budget exhausted before vector search started");
                return (Vec::new(), Some(TierError::DeadlineExceeded { elapsed_ms: 0 }));
            }
            timeout = timeout.min(remaining);
        }

        let vector = self.vectorizer.vectorize(&entity.joined_name());
        let started = std::time::Instant::now();

        match tokio::time::timeout(timeout, self.index.vector_search(&vector, self.top_k, timeout))
            .await
        {
            Ok(Ok(scored)) => {
                let mut candidates: Vec<Candidate> = scored
                    .iter()
                    .map(|hit| {
                        hit.record
                            .to_candidate(SourceTier::Vector, hit.score.clamp(0.0, 1.0))
                            .with_matched_field(MatchedField::Name)
                    })
                    .collect();

                candidates.sort_by(|a, b| {
                    b.raw_score
                        .partial_cmp(&a.raw_score)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.id.cmp(&b.id))
                });

                (candidates, None)
            }
            Ok(Err(err)) => {
                warn!(error = %err, "vector search failed");
                (Vec::new(), Some(TierError::from(err)))
            }
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                warn!(elapsed_ms, "vector search hit its deadline");
                (Vec::new(), Some(TierError::DeadlineExceeded { elapsed_ms }))
            }
        }
    }
}

#[async_trait]
impl<I: WatchlistIndex> Tier for VectorSearcher<I> {
    fn kind(&self) -> TierKind {
        TierKind::Vector
    }

    async fn run(&self, request: &TierRequest<'_>) -> TierOutcome {
        let started = std::time::Instant::now();
        let (candidates, error) = self.retrieve(request.entity, request.deadline).await;
        debug!(hits = candidates.len(), "vector tier complete");

        TierOutcome {
            kind: TierKind::Vector,
            candidates,
            elapsed: started.elapsed(),
            escalate: false,
            error,
            degraded: false,
        }
    }
}
