//! Shadow mode: best-effort dual execution for funnel calibration.
//!
//! Runs the full funnel with early-stopping disabled against the same input
//! and logs whether the alternate decision agrees with the one already
//! returned. Spawned after the response is complete and never awaited; a
//! slow or failing shadow run costs the caller nothing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use super::error::ScreeningError;
use super::orchestrator::build_evidence;
use crate::candidate::merge_by_id;
use crate::decision::{Decision, DecisionEngine};
use crate::entity::NormalizedEntity;
use crate::index::WatchlistIndex;
use crate::tier::{Blocker, ExactMatcher, Reranker, Tier, TierRequest, VectorSearcher};

/// The alternate funnel: every retrieval tier always runs.
pub(crate) struct ShadowFunnel<I> {
    exact: ExactMatcher<I>,
    blocker: Blocker<I>,
    vector: VectorSearcher<I>,
    reranker: Reranker,
    engine: DecisionEngine,
    max_rerank_candidates: usize,
    budget: Duration,
}

impl<I: WatchlistIndex> ShadowFunnel<I> {
    pub(crate) fn new(
        exact: ExactMatcher<I>,
        blocker: Blocker<I>,
        vector: VectorSearcher<I>,
        reranker: Reranker,
        engine: DecisionEngine,
        max_rerank_candidates: usize,
        budget: Duration,
    ) -> Self {
        Self {
            exact,
            blocker,
            vector,
            reranker,
            engine,
            max_rerank_candidates,
            budget,
        }
    }

    /// Full-funnel decision with no early stop and no cache.
    pub(crate) async fn decide(
        &self,
        entity: &NormalizedEntity,
    ) -> Result<Decision, ScreeningError> {
        let deadline = tokio::time::Instant::now() + self.budget;
        let request = TierRequest::new(entity).with_deadline(deadline);

        let exact = self.exact.run(&request).await;
        let blocking = self.blocker.run(&request).await;
        let vector = self.vector.run(&request).await;

        let mut degradations = Vec::new();
        for outcome in [&exact, &blocking, &vector] {
            if let Some(reason) = outcome.degradation_reason()
                && !degradations.contains(&reason)
            {
                degradations.push(reason);
            }
        }

        let merged = merge_by_id(
            exact
                .candidates
                .into_iter()
                .chain(blocking.candidates)
                .chain(vector.candidates)
                .collect(),
            self.max_rerank_candidates,
        );

        let rerank_request = TierRequest::new(entity)
            .with_candidates(&merged)
            .with_deadline(deadline);
        let ranked = self.reranker.run(&rerank_request).await.candidates;

        let evidence = build_evidence(entity, &ranked, degradations);
        Ok(self.engine.decide(&evidence)?)
    }
}

/// Fires the comparison task and returns immediately.
pub(crate) fn spawn_comparison<I>(
    funnel: Arc<ShadowFunnel<I>>,
    entity: NormalizedEntity,
    primary: Decision,
    audit_id: Uuid,
) where
    I: WatchlistIndex + 'static,
{
    tokio::spawn(async move {
        match funnel.decide(&entity).await {
            Ok(shadow) if shadow.risk_level == primary.risk_level => {
                info!(%audit_id, risk = %primary.risk_level, "shadow comparison agrees");
            }
            Ok(shadow) => {
                let detail = serde_json::to_string(&shadow)
                    .unwrap_or_else(|_| "<unserializable>".to_string());
                warn!(
                    %audit_id,
                    primary_risk = %primary.risk_level,
                    shadow_risk = %shadow.risk_level,
                    primary_score = primary.risk_score,
                    shadow_score = shadow.risk_score,
                    shadow_decision = %detail,
                    "shadow comparison diverged"
                );
            }
            Err(error) => {
                warn!(%audit_id, %error, "shadow run failed");
            }
        }
    });
}
