use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::config::{BudgetConfig, FunnelConfig};
use super::error::ScreeningError;
use super::shadow::{ShadowFunnel, spawn_comparison};
use super::types::{ScreeningResult, TierDiagnostics};
use crate::cache::{CacheMetrics, DecisionCache};
use crate::candidate::{Candidate, MatchedField, merge_by_id};
use crate::config::ScreeningConfig;
use crate::decision::{Decision, DecisionEngine, DecisionEvidence, ReasonCode};
use crate::entity::{NormalizedEntity, PolicyFlag, PrefilterVerdict};
use crate::hashing::{ScreeningKey, key_fingerprint, screening_key};
use crate::index::WatchlistIndex;
use crate::matchers::NameVectorizer;
use crate::tier::{
    Blocker, ExactMatcher, PatternSet, Reranker, Tier, TierError, TierKind, TierOutcome,
    TierRequest, VectorSearcher,
};

/// In-flight `screen_batch` requests.
const BATCH_CONCURRENCY: usize = 8;

/// The screening funnel, wired once at startup and shared across requests.
///
/// Per request, tiers run sequentially: exact lookup, then blocking retrieval
/// unless the exact hit stopped the funnel, then vector search when blocking
/// escalates, then the rerank and the decision. The only shared state between
/// concurrent requests is the immutable pattern set and the synchronized
/// cache. Dropping the future returned by [`screen`](Self::screen) abandons
/// any in-flight backend call.
pub struct ScreeningPipeline<I> {
    exact: ExactMatcher<I>,
    blocker: Blocker<I>,
    vector: VectorSearcher<I>,
    reranker: Reranker,
    engine: DecisionEngine,
    cache: DecisionCache,
    cache_ttl: Duration,
    funnel: FunnelConfig,
    budget: BudgetConfig,
    shadow: Arc<ShadowFunnel<I>>,
    shadow_enabled: bool,
}

impl<I: WatchlistIndex + 'static> ScreeningPipeline<I> {
    /// Builds the funnel from validated configuration, a backend index, and
    /// the compiled exact-match pattern set.
    pub fn new(
        config: &ScreeningConfig,
        index: Arc<I>,
        patterns: Arc<PatternSet>,
    ) -> Result<Self, ScreeningError> {
        config.funnel.validate()?;
        config.budget.validate()?;
        config
            .cache
            .validate()
            .map_err(|err| ScreeningError::InvalidConfig {
                name: "cache",
                value: err.to_string(),
            })?;

        let vectorizer =
            NameVectorizer::new(config.vectorizer).map_err(|err| ScreeningError::InvalidConfig {
                name: "vectorizer",
                value: err.to_string(),
            })?;
        let engine = DecisionEngine::new(config.weights, config.thresholds)?;
        let reranker = Reranker::new(config.rerank, vectorizer.clone()).map_err(|err| {
            ScreeningError::InvalidConfig {
                name: "rerank_weights",
                value: err.to_string(),
            }
        })?;

        let exact = ExactMatcher::new(Arc::clone(&patterns), Arc::clone(&index));
        let blocker = Blocker::new(
            Arc::clone(&index),
            config.funnel.tier1_limit,
            config.funnel.tier1_escalate_below,
        );
        let vector = VectorSearcher::new(
            Arc::clone(&index),
            vectorizer,
            config.funnel.tier2_top_k,
            config.budget.tier2_timeout,
        );

        let shadow = Arc::new(ShadowFunnel::new(
            exact.clone(),
            blocker.clone(),
            vector.clone(),
            reranker.clone(),
            engine.clone(),
            config.funnel.max_rerank_candidates,
            config.budget.request_budget,
        ));

        Ok(Self {
            exact,
            blocker,
            vector,
            reranker,
            engine,
            cache: DecisionCache::with_capacity(config.cache.capacity),
            cache_ttl: config.cache.ttl,
            funnel: config.funnel.clone(),
            budget: config.budget.clone(),
            shadow,
            shadow_enabled: config.shadow_enabled,
        })
    }

    /// Hit/miss/eviction counters of the result cache.
    pub fn cache_metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }

    /// Screens one entity end to end.
    ///
    /// Tier backend failures degrade the funnel and surface as reason codes
    /// on the decision; the returned error is reserved for malformed input
    /// and decision engine failure.
    #[instrument(skip_all)]
    pub async fn screen(
        &self,
        entity: &NormalizedEntity,
    ) -> Result<ScreeningResult, ScreeningError> {
        let started = std::time::Instant::now();
        let deadline = tokio::time::Instant::now() + self.budget.request_budget;
        let audit_id = Uuid::new_v4();

        if entity.has_blank_name() {
            return Err(ScreeningError::MalformedInput {
                reason: "entity has no usable name tokens".to_string(),
            });
        }

        let key = screening_key(entity);
        let no_cache = entity.policy_flags.contains(PolicyFlag::NoCache);
        let mut degradations: Vec<ReasonCode> = Vec::new();

        if no_cache {
            debug!(%audit_id, "cache disabled by policy flag");
        } else {
            match self.cache.get(&key) {
                Ok(Some(mut cached)) => {
                    debug!(%audit_id, key = %key_fingerprint(&key), "cache hit");
                    cached.cache_hit = true;
                    return Ok(cached);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(%audit_id, %error, "cache read failed; proceeding as a miss");
                    degradations.push(ReasonCode::CacheBypassed);
                }
            }
        }

        let mut diagnostics: Vec<TierDiagnostics> = Vec::new();

        // The upstream prefilter already ruled this input out; decide
        // without touching any retrieval tier.
        if entity.prefilter.verdict == PrefilterVerdict::NoEntity {
            for kind in [
                TierKind::Exact,
                TierKind::Blocking,
                TierKind::Vector,
                TierKind::Rerank,
            ] {
                diagnostics.push(TierDiagnostics::skipped(kind));
            }
            let evidence = DecisionEvidence {
                prefilter: entity.prefilter,
                degradations,
                ..DecisionEvidence::default()
            };
            let decision = self.engine.decide(&evidence)?;
            let result = self.finish(audit_id, decision, Vec::new(), diagnostics, started);
            return Ok(self.store(key, result, no_cache));
        }

        let request = TierRequest::new(entity).with_deadline(deadline);

        let exact_outcome = self
            .run_tier(&self.exact, &request, None, &mut diagnostics, &mut degradations)
            .await;
        let early_stop = exact_outcome
            .candidates
            .iter()
            .any(|c| c.raw_score >= self.funnel.exact_score_threshold);

        let pool: Vec<Candidate> = if early_stop {
            debug!(
                %audit_id,
                hits = exact_outcome.candidates.len(),
                "exact match; skipping retrieval tiers"
            );
            diagnostics.push(TierDiagnostics::skipped(TierKind::Blocking));
            diagnostics.push(TierDiagnostics::skipped(TierKind::Vector));
            merge_by_id(exact_outcome.candidates, self.funnel.max_rerank_candidates)
        } else {
            let blocking_disabled = entity.policy_flags.contains(PolicyFlag::DisableBlocking);
            let mut retrieved: Vec<Candidate> = Vec::new();
            let escalate;

            if blocking_disabled {
                debug!(%audit_id, "blocking tier disabled by policy flag");
                diagnostics.push(TierDiagnostics::skipped(TierKind::Blocking));
                escalate = true;
            } else {
                let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                let timeout = self.budget.tier1_timeout.min(remaining);
                let outcome = self
                    .run_tier(
                        &self.blocker,
                        &request,
                        Some(timeout),
                        &mut diagnostics,
                        &mut degradations,
                    )
                    .await;
                let best = outcome.best_raw_score().unwrap_or(0.0);
                escalate = outcome.escalate && best < self.funnel.tier1_sufficient;
                retrieved.extend(outcome.candidates);
            }

            if escalate {
                let outcome = self
                    .run_tier(&self.vector, &request, None, &mut diagnostics, &mut degradations)
                    .await;
                retrieved.extend(outcome.candidates);
            } else {
                diagnostics.push(TierDiagnostics::skipped(TierKind::Vector));
            }

            merge_by_id(retrieved, self.funnel.max_rerank_candidates)
        };

        let rerank_request = TierRequest::new(entity)
            .with_candidates(&pool)
            .with_deadline(deadline);
        let rerank_outcome = self
            .run_tier(
                &self.reranker,
                &rerank_request,
                None,
                &mut diagnostics,
                &mut degradations,
            )
            .await;

        let evidence = build_evidence(entity, &rerank_outcome.candidates, degradations);
        let decision = self.engine.decide(&evidence)?;

        let result = self.finish(
            audit_id,
            decision,
            rerank_outcome.candidates,
            diagnostics,
            started,
        );
        let result = self.store(key, result, no_cache);

        if self.shadow_enabled || entity.policy_flags.contains(PolicyFlag::ShadowCompare) {
            spawn_comparison(
                Arc::clone(&self.shadow),
                entity.clone(),
                result.decision.clone(),
                audit_id,
            );
        }

        info!(
            %audit_id,
            risk = %result.decision.risk_level,
            score = result.decision.risk_score,
            candidates = result.candidates.len(),
            elapsed_ms = result.elapsed_ms,
            "screening complete"
        );
        Ok(result)
    }

    /// Screens a batch with bounded concurrency, preserving input order.
    #[instrument(skip_all, fields(count = entities.len()))]
    pub async fn screen_batch(
        &self,
        entities: &[NormalizedEntity],
    ) -> Vec<Result<ScreeningResult, ScreeningError>> {
        stream::iter(entities)
            .map(|entity| self.screen(entity))
            .buffered(BATCH_CONCURRENCY)
            .collect()
            .await
    }

    /// Runs one tier, records diagnostics, and collects its degradation
    /// reason. `timeout` bounds tiers whose implementation does not enforce
    /// a deadline itself; on expiry the tier contributes nothing and the
    /// funnel escalates.
    async fn run_tier(
        &self,
        tier: &dyn Tier,
        request: &TierRequest<'_>,
        timeout: Option<Duration>,
        diagnostics: &mut Vec<TierDiagnostics>,
        degradations: &mut Vec<ReasonCode>,
    ) -> TierOutcome {
        let outcome = match timeout {
            Some(limit) => {
                let started = std::time::Instant::now();
                match tokio::time::timeout(limit, tier.run(request)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        let elapsed = started.elapsed();
                        let elapsed_ms = elapsed.as_millis() as u64;
                        warn!(kind = %tier.kind(), elapsed_ms, "tier hit its deadline");
                        TierOutcome {
                            kind: tier.kind(),
                            candidates: Vec::new(),
                            elapsed,
                            escalate: true,
                            error: Some(TierError::DeadlineExceeded { elapsed_ms }),
                            degraded: false,
                        }
                    }
                }
            }
            None => tier.run(request).await,
        };

        if let Some(reason) = outcome.degradation_reason()
            && !degradations.contains(&reason)
        {
            degradations.push(reason);
        }
        diagnostics.push(TierDiagnostics::from_outcome(&outcome));
        outcome
    }

    fn finish(
        &self,
        audit_id: Uuid,
        decision: Decision,
        candidates: Vec<Candidate>,
        tier_diagnostics: Vec<TierDiagnostics>,
        started: std::time::Instant,
    ) -> ScreeningResult {
        ScreeningResult {
            audit_id,
            decision,
            candidates,
            tier_diagnostics,
            cache_hit: false,
            screened_at: Utc::now(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Writes the result back unless the policy flag says otherwise. A cache
    /// write failure is survivable; it marks the returned decision instead.
    fn store(
        &self,
        key: ScreeningKey,
        mut result: ScreeningResult,
        no_cache: bool,
    ) -> ScreeningResult {
        if no_cache {
            return result;
        }
        if let Err(error) = self.cache.put(key, result.clone(), self.cache_ttl) {
            warn!(audit_id = %result.audit_id, %error, "cache write failed");
            if !result
                .decision
                .decision_reasons
                .contains(&ReasonCode::CacheBypassed)
            {
                result.decision.decision_reasons.push(ReasonCode::CacheBypassed);
            }
        }
        result
    }
}

/// Decision-engine input assembled from the ranked funnel output.
pub(crate) fn build_evidence(
    entity: &NormalizedEntity,
    ranked: &[Candidate],
    degradations: Vec<ReasonCode>,
) -> DecisionEvidence {
    let best = ranked.first();
    DecisionEvidence {
        prefilter: entity.prefilter,
        similarity_top: best.map(|c| c.confidence).unwrap_or(0.0),
        id_exact_match: best.is_some_and(|c| c.has_field(MatchedField::Identifier)),
        dob_match: best.is_some_and(|c| c.has_field(MatchedField::BirthDate)),
        decisive_tier: best.map(|c| c.source_tier),
        degradations,
    }
}
