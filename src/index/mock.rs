//! In-memory watchlist index for tests.
//!
//! Seeded with records up front, then queried through the same trait the
//! production client implements. Per-operation call counters back the
//! short-circuit and escalation assertions in the pipeline tests; failure
//! flags and artificial latency drive the degradation paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::RwLock;

use super::client::WatchlistIndex;
use super::error::{IndexError, IndexResult};
use super::model::{BlockingKey, RawRecord, ScoredRecord};
use crate::matchers::{NameVectorizer, VectorizerConfig, cosine};

struct SeededRecord {
    record: RawRecord,
    vector: Vec<f32>,
}

/// Deterministic in-memory [`WatchlistIndex`].
pub struct MockWatchlistIndex {
    records: RwLock<Vec<SeededRecord>>,
    vectorizer: NameVectorizer,
    ready: AtomicBool,
    fail_exact: AtomicBool,
    fail_blocking: AtomicBool,
    fail_vector: AtomicBool,
    blocking_delay: RwLock<Option<Duration>>,
    vector_delay: RwLock<Option<Duration>>,
    exact_calls: AtomicUsize,
    blocking_calls: AtomicUsize,
    vector_calls: AtomicUsize,
}

impl Default for MockWatchlistIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWatchlistIndex {
    pub fn new() -> Self {
        let vectorizer = NameVectorizer::new(VectorizerConfig::default())
            .expect("default vectorizer config is valid");
        Self {
            records: RwLock::new(Vec::new()),
            vectorizer,
            ready: AtomicBool::new(true),
            fail_exact: AtomicBool::new(false),
            fail_blocking: AtomicBool::new(false),
            fail_vector: AtomicBool::new(false),
            blocking_delay: RwLock::new(None),
            vector_delay: RwLock::new(None),
            exact_calls: AtomicUsize::new(0),
            blocking_calls: AtomicUsize::new(0),
            vector_calls: AtomicUsize::new(0),
        }
    }

    /// Seeds a record, vectorizing its canonical name with the default
    /// featurization so vector search scores are meaningful.
    pub fn seed(&self, record: RawRecord) {
        let vector = self.vectorizer.vectorize(&record.name);
        self.records.write().push(SeededRecord { record, vector });
    }

    /// Seeds a record with an explicit vector.
    pub fn seed_with_vector(&self, record: RawRecord, vector: Vec<f32>) {
        self.records.write().push(SeededRecord { record, vector });
    }

    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Makes `exact_lookup` fail until reset.
    pub fn set_fail_exact(&self, fail: bool) {
        self.fail_exact.store(fail, Ordering::SeqCst);
    }

    /// Makes `blocking_search` fail until reset.
    pub fn set_fail_blocking(&self, fail: bool) {
        self.fail_blocking.store(fail, Ordering::SeqCst);
    }

    /// Makes `vector_search` fail until reset.
    pub fn set_fail_vector(&self, fail: bool) {
        self.fail_vector.store(fail, Ordering::SeqCst);
    }

    /// Delays `blocking_search` responses, for deadline tests.
    pub fn set_blocking_delay(&self, delay: Duration) {
        *self.blocking_delay.write() = Some(delay);
    }

    /// Delays `vector_search` responses, for deadline tests.
    pub fn set_vector_delay(&self, delay: Duration) {
        *self.vector_delay.write() = Some(delay);
    }

    pub fn exact_calls(&self) -> usize {
        self.exact_calls.load(Ordering::SeqCst)
    }

    pub fn blocking_calls(&self) -> usize {
        self.blocking_calls.load(Ordering::SeqCst)
    }

    pub fn vector_calls(&self) -> usize {
        self.vector_calls.load(Ordering::SeqCst)
    }

    fn injected_failure(&self, op: &str) -> IndexError {
        IndexError::SearchFailed {
            collection: "mock".to_string(),
            message: format!("injected {op} failure"),
        }
    }
}

impl WatchlistIndex for MockWatchlistIndex {
    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn exact_lookup(&self, name: &str, limit: u64) -> IndexResult<Vec<RawRecord>> {
        self.exact_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exact.load(Ordering::SeqCst) {
            return Err(self.injected_failure("exact"));
        }

        let mut hits: Vec<RawRecord> = self
            .records
            .read()
            .iter()
            .filter(|seeded| {
                seeded.record.name == name || seeded.record.aliases.iter().any(|a| a == name)
            })
            .map(|seeded| seeded.record.clone())
            .collect();

        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn blocking_search(
        &self,
        keys: &[BlockingKey],
        limit: u64,
    ) -> IndexResult<Vec<RawRecord>> {
        self.blocking_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.blocking_delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_blocking.load(Ordering::SeqCst) {
            return Err(self.injected_failure("blocking"));
        }

        let index_keys: Vec<String> = keys.iter().map(BlockingKey::as_index_key).collect();
        let mut hits: Vec<RawRecord> = self
            .records
            .read()
            .iter()
            .filter(|seeded| {
                seeded
                    .record
                    .blocking_keys
                    .iter()
                    .any(|k| index_keys.contains(k))
            })
            .map(|seeded| seeded.record.clone())
            .collect();

        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn vector_search(
        &self,
        vector: &[f32],
        top_k: u64,
        _timeout: Duration,
    ) -> IndexResult<Vec<ScoredRecord>> {
        self.vector_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.vector_delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_vector.load(Ordering::SeqCst) {
            return Err(self.injected_failure("vector"));
        }

        if vector.len() != self.vectorizer.dim() {
            return Err(IndexError::InvalidDimension {
                expected: self.vectorizer.dim(),
                actual: vector.len(),
            });
        }

        let mut results: Vec<ScoredRecord> = self
            .records
            .read()
            .iter()
            .map(|seeded| ScoredRecord {
                record: seeded.record.clone(),
                score: cosine(vector, &seeded.vector),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        results.truncate(top_k as usize);
        Ok(results)
    }
}
