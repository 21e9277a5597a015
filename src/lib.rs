//! Gatehouse library crate (used by services embedding the screening
//! pipeline and by integration tests).
//!
//! # Public API Surface
//!
//! The exports are organized by module:
//!
//! ## Core Types (Stable)
//! - [`ScreeningConfig`], [`ConfigError`] - Aggregate configuration
//! - [`NormalizedEntity`], [`Identifier`], [`PolicyFlags`] - Screening input
//! - [`Candidate`], [`SourceTier`], [`MatchedField`] - Funnel output
//! - [`Decision`], [`RiskLevel`], [`ReasonCode`] - Risk classification
//!
//! ## Pipeline
//! - [`ScreeningPipeline`] - End-to-end orchestration
//! - [`ScreeningResult`], [`TierDiagnostics`] - Per-request audit record
//! - [`FunnelConfig`], [`BudgetConfig`] - Escalation and latency knobs
//!
//! ## Tiers
//! - [`PatternSet`], [`ExactMatcher`] - Tier 0 compiled exact lookup
//! - [`Blocker`] - Tier 1 blocking-key retrieval
//! - [`VectorSearcher`] - Tier 2 vector search
//! - [`Reranker`], [`RerankWeights`] - Tier 3 refinement
//!
//! ## Index Backend
//! - [`WatchlistIndex`] - Backend trait
//! - [`QdrantWatchlistIndex`] - Production Qdrant client
//! - [`RawRecord`], [`ScoredRecord`], [`BlockingKey`] - Backend payloads
//!
//! ## Matching Primitives
//! - [`NameVectorizer`], [`cosine`] - Character n-gram featurization
//! - [`soundex`], [`phonetic_eq`] - Phonetic keys
//!
//! ## Utilities
//! - [`screening_key`], [`key_fingerprint`] - Cache key hashing
//! - [`DecisionCache`], [`CacheMetrics`] - Result caching
//! - Vector dimension constants and validation
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod candidate;
pub mod config;
pub mod constants;
pub mod decision;
pub mod entity;
pub mod hashing;
pub mod index;
pub mod matchers;
pub mod pipeline;
pub mod tier;

pub use cache::{CacheConfig, CacheError, CacheMetrics, CacheResult, DecisionCache};

pub use candidate::{
    Candidate, CandidateMetadata, EntityType, MatchedField, SourceTier, merge_by_id,
};

pub use config::{ConfigError, IndexConfig, ScreeningConfig};

pub use constants::{
    CHAR_NGRAM_MAX, CHAR_NGRAM_MIN, DEFAULT_MAX_RERANK_CANDIDATES, DEFAULT_VECTOR_DIM,
    DimValidationError, WORD_NGRAM_MAX, validate_vector_dim,
};

pub use decision::{
    Decision, DecisionEngine, DecisionError, DecisionEvidence, DecisionResult, ReasonCode,
    RequiredField, RiskLevel, RiskThresholds, ScoreBreakdown, ScoreWeights,
};

pub use entity::{
    IdKind, Identifier, Language, NormalizedEntity, PolicyFlag, PolicyFlags, PrefilterSignal,
    PrefilterVerdict, normalize_name,
};

pub use hashing::{ScreeningKey, hash_to_u64, key_fingerprint, screening_key};

#[cfg(any(test, feature = "mock"))]
pub use index::MockWatchlistIndex;
pub use index::{
    BlockingKey, DEFAULT_COLLECTION, IndexError, IndexResult, QdrantWatchlistIndex, RawRecord,
    ScoredRecord, WatchlistIndex,
};

pub use matchers::{
    NameVectorizer, PhoneticCode, VectorizerConfig, VectorizerError, cosine, phonetic_eq, soundex,
};

pub use pipeline::{
    BudgetConfig, FunnelConfig, ScreeningError, ScreeningPipeline, ScreeningResult,
    TierDiagnostics,
};

pub use tier::{
    Blocker, ExactMatcher, PatternSet, RerankWeights, Reranker, Tier, TierError, TierKind,
    TierOutcome, TierRequest, VectorSearcher, blocking_keys,
};
