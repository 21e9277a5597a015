use std::time::Duration;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{Condition, Filter, ScrollPointsBuilder, SearchPointsBuilder};
use tracing::debug;

use super::error::{IndexError, IndexResult};
use super::model::{BlockingKey, RawRecord, ScoredRecord};

/// Read-only interface to the watchlist index.
///
/// Exactly the three retrieval shapes the funnel needs, nothing else. Index
/// construction and list ingestion live outside this crate.
pub trait WatchlistIndex: Send + Sync {
    /// Liveness of the backing store.
    fn is_ready(&self) -> impl std::future::Future<Output = bool> + Send;

    /// Full-alignment lookup of a normalized name against canonical names
    /// and aliases.
    fn exact_lookup(
        &self,
        name: &str,
        limit: u64,
    ) -> impl std::future::Future<Output = IndexResult<Vec<RawRecord>>> + Send;

    /// Retrieval of records indexed under any of the given blocking keys.
    /// Scoring the hits against the generated keys is the caller's job.
    fn blocking_search(
        &self,
        keys: &[BlockingKey],
        limit: u64,
    ) -> impl std::future::Future<Output = IndexResult<Vec<RawRecord>>> + Send;

    /// Approximate nearest-neighbour search. Implementations should honor
    /// `timeout` themselves; callers still enforce it as a hard deadline.
    fn vector_search(
        &self,
        vector: &[f32],
        top_k: u64,
        timeout: Duration,
    ) -> impl std::future::Future<Output = IndexResult<Vec<ScoredRecord>>> + Send;
}

#[derive(Clone)]
/// Qdrant-backed watchlist index.
pub struct QdrantWatchlistIndex {
    client: Qdrant,
    collection: String,
    url: String,
}

impl QdrantWatchlistIndex {
    /// Creates a client for `url`, reading from `collection`.
    pub async fn new(url: &str, collection: impl Into<String>) -> IndexResult<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| IndexError::ConnectionFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            collection: collection.into(),
            url: url.to_string(),
        })
    }

    /// Returns the configured collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn scroll_filtered(&self, filter: Filter, limit: u64) -> IndexResult<Vec<RawRecord>> {
        let response = self
            .client
            .scroll(
                ScrollPointsBuilder::new(self.collection.as_str())
                    .filter(filter)
                    .limit(limit as u32)
                    .with_payload(true),
            )
            .await
            .map_err(|e| IndexError::SearchFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        let records: Vec<RawRecord> = response
            .result
            .into_iter()
            .filter_map(RawRecord::from_retrieved_point)
            .collect();

        debug!(
            collection = %self.collection,
            records = records.len(),
            "filtered scroll complete"
        );
        Ok(records)
    }
}

impl WatchlistIndex for QdrantWatchlistIndex {
    async fn is_ready(&self) -> bool {
        self.client.health_check().await.is_ok()
    }

    async fn exact_lookup(&self, name: &str, limit: u64) -> IndexResult<Vec<RawRecord>> {
        // Payload keyword match on an array field means "contains", so one
        // condition per field covers canonical names and aliases.
        let filter = Filter::should([
            Condition::matches("name", name.to_string()),
            Condition::matches("aliases", name.to_string()),
        ]);

        self.scroll_filtered(filter, limit).await
    }

    async fn blocking_search(
        &self,
        keys: &[BlockingKey],
        limit: u64,
    ) -> IndexResult<Vec<RawRecord>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let index_keys: Vec<String> = keys.iter().map(BlockingKey::as_index_key).collect();
        let filter = Filter::must([Condition::matches("blocking_keys", index_keys)]);

        self.scroll_filtered(filter, limit).await
    }

    async fn vector_search(
        &self,
        vector: &[f32],
        top_k: u64,
        timeout: Duration,
    ) -> IndexResult<Vec<ScoredRecord>> {
        let request = self.client.search_points(
            SearchPointsBuilder::new(self.collection.as_str(), vector.to_vec(), top_k)
                .with_payload(true),
        );

        let response = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| IndexError::Timeout {
                collection: self.collection.clone(),
                elapsed_ms: timeout.as_millis() as u64,
            })?
            .map_err(|e| IndexError::SearchFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        let records: Vec<ScoredRecord> = response
            .result
            .into_iter()
            .filter_map(ScoredRecord::from_scored_point)
            .collect();

        debug!(
            collection = %self.collection,
            hits = records.len(),
            "vector search complete"
        );
        Ok(records)
    }
}
