use super::vector::VectorSearcher;
use super::{Tier, TierError, TierKind, TierRequest};
use crate::candidate::{EntityType, MatchedField, SourceTier};
use crate::constants::DEFAULT_VECTOR_DIM;
use crate::decision::ReasonCode;
use crate::entity::{Language, NormalizedEntity};
use crate::index::{MockWatchlistIndex, RawRecord};
use crate::matchers::{NameVectorizer, VectorizerConfig};
use std::sync::Arc;
use std::time::Duration;

fn entity(tokens: &[&str]) -> NormalizedEntity {
    NormalizedEntity::new(tokens.iter().map(|t| t.to_string()).collect(), Language::En)
}

fn person(id: &str, name: &str) -> RawRecord {
    RawRecord::new(id, name, EntityType::Person)
}

fn searcher(
    index: Arc<MockWatchlistIndex>,
    top_k: u64,
    call_timeout: Duration,
) -> VectorSearcher<MockWatchlistIndex> {
    let vectorizer = NameVectorizer::new(VectorizerConfig::default())
        .expect("default vectorizer config should build");
    VectorSearcher::new(index, vectorizer, top_k, call_timeout)
}

#[tokio::test]
async fn test_identical_name_scores_near_one() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.seed(person("e-1", "ivan petrov"));

    let tier = searcher(Arc::clone(&index), 10, Duration::from_millis(100));
    let input = entity(&["Ivan", "Petrov"]);
    let outcome = tier.run(&TierRequest::new(&input)).await;

    assert_eq!(outcome.kind, TierKind::Vector);
    assert_eq!(outcome.candidates.len(), 1);
    let hit = &outcome.candidates[0];
    assert_eq!(hit.id, "e-1");
    assert_eq!(hit.source_tier, SourceTier::Vector);
    assert!((hit.raw_score - 1.0).abs() < 1e-4);
    assert!(hit.has_field(MatchedField::Name));
    assert!(outcome.error.is_none());
    assert!(!outcome.escalate);
    assert_eq!(index.vector_calls(), 1);
}

#[tokio::test]
async fn test_results_sorted_by_similarity() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.seed(person("e-2", "qi zhang"));
    index.seed(person("e-1", "ivan petrov"));

    let tier = searcher(index, 10, Duration::from_millis(100));
    let input = entity(&["Ivan", "Petrov"]);
    let outcome = tier.run(&TierRequest::new(&input)).await;

    assert_eq!(outcome.candidates.len(), 2);
    assert_eq!(outcome.candidates[0].id, "e-1");
    assert!(outcome.candidates[0].raw_score > outcome.candidates[1].raw_score);
}

#[tokio::test]
async fn test_top_k_bounds_results() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.seed(person("e-1", "ivan petrov"));
    index.seed(person("e-2", "ivan petroff"));
    index.seed(person("e-3", "ivan petrovich"));

    let tier = searcher(index, 2, Duration::from_millis(100));
    let input = entity(&["Ivan", "Petrov"]);
    let outcome = tier.run(&TierRequest::new(&input)).await;

    assert_eq!(outcome.candidates.len(), 2);
}

#[tokio::test]
async fn test_negative_similarity_clamped_to_zero() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.seed_with_vector(person("e-1", "ivan petrov"), vec![-1.0; DEFAULT_VECTOR_DIM]);

    let tier = searcher(index, 10, Duration::from_millis(100));
    let input = entity(&["Ivan", "Petrov"]);
    let outcome = tier.run(&TierRequest::new(&input)).await;

    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.candidates[0].raw_score, 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_backend_hits_call_timeout() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.seed(person("e-1", "ivan petrov"));
    index.set_vector_delay(Duration::from_millis(500));

    let tier = searcher(Arc::clone(&index), 10, Duration::from_millis(100));
    let input = entity(&["Ivan", "Petrov"]);
    let outcome = tier.run(&TierRequest::new(&input)).await;

    assert!(outcome.candidates.is_empty());
    let error = outcome.error.as_ref().expect("timeout should be reported");
    assert!(error.is_timeout());
    assert!(matches!(error, TierError::DeadlineExceeded { .. }));
    assert_eq!(
        outcome.degradation_reason(),
        Some(ReasonCode::VectorSearchTimeout)
    );
    assert_eq!(index.vector_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_request_deadline_caps_call_timeout() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.seed(person("e-1", "ivan petrov"));
    index.set_vector_delay(Duration::from_millis(200));

    // The generous per-call timeout alone would let the 200ms backend
    // answer; the 50ms request deadline must win.
    let tier = searcher(Arc::clone(&index), 10, Duration::from_secs(10));
    let input = entity(&["Ivan", "Petrov"]);
    let deadline = tokio::time::Instant::now() + Duration::from_millis(50);
    let outcome = tier
        .run(&TierRequest::new(&input).with_deadline(deadline))
        .await;

    assert!(outcome.candidates.is_empty());
    let error = outcome.error.as_ref().expect("timeout should be reported");
    assert!(error.is_timeout());
    assert_eq!(index.vector_calls(), 1);
}

#[tokio::test]
async fn test_exhausted_deadline_skips_backend() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.seed(person("e-1", "ivan petrov"));

    let tier = searcher(Arc::clone(&index), 10, Duration::from_millis(100));
    let input = entity(&["Ivan", "Petrov"]);
    let deadline = tokio::time::Instant::now();
    let outcome = tier
        .run(&TierRequest::new(&input).with_deadline(deadline))
        .await;

    assert!(outcome.candidates.is_empty());
    let error = outcome.error.as_ref().expect("timeout should be reported");
    assert!(matches!(
        error,
        TierError::DeadlineExceeded { elapsed_ms: 0 }
    ));
    assert_eq!(
        outcome.degradation_reason(),
        Some(ReasonCode::VectorSearchTimeout)
    );
    assert_eq!(index.vector_calls(), 0);
}

#[tokio::test]
async fn test_backend_failure_reports_degradation() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.set_fail_vector(true);

    let tier = searcher(Arc::clone(&index), 10, Duration::from_millis(100));
    let input = entity(&["Ivan", "Petrov"]);
    let outcome = tier.run(&TierRequest::new(&input)).await;

    assert!(outcome.candidates.is_empty());
    let error = outcome.error.as_ref().expect("failure should be reported");
    assert!(!error.is_timeout());
    assert_eq!(
        outcome.degradation_reason(),
        Some(ReasonCode::VectorSearchDegraded)
    );
    assert_eq!(index.vector_calls(), 1);
}
