//! Tier 0: precompiled exact-match lookup.

use aho_corasick::AhoCorasick;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::error::TierError;
use super::{Tier, TierKind, TierOutcome, TierRequest};
use crate::candidate::{Candidate, MatchedField, SourceTier};
use crate::entity::{NormalizedEntity, normalize_name};
use crate::index::{RawRecord, WatchlistIndex};

/// Record cap for the backend fallback when no pattern set is loaded.
const FALLBACK_LOOKUP_LIMIT: u64 = 32;

/// Multi-pattern automaton over every known name, alias, and transliteration,
/// plus an exact map over identifier tags.
///
/// Compiled once at startup from the full record set and shared by `Arc`;
/// lookup cost depends on input length, not corpus size. Never mutated after
/// construction.
pub struct PatternSet {
    automaton: Option<AhoCorasick>,
    /// Record index and matched field, parallel to automaton pattern ids.
    pattern_sources: Vec<(usize, MatchedField)>,
    /// `KIND:VALUE` identifier tag to indices of records carrying it.
    identifier_index: HashMap<String, Vec<usize>>,
    records: Vec<RawRecord>,
}

impl PatternSet {
    /// Compiles the automaton and identifier map from the full record set.
    pub fn compile(records: Vec<RawRecord>) -> Result<Self, TierError> {
        let mut patterns: Vec<String> = Vec::new();
        let mut pattern_sources = Vec::new();
        let mut identifier_index: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, record) in records.iter().enumerate() {
            let name = normalize_name(&record.name);
            if !name.is_empty() {
                patterns.push(name);
                pattern_sources.push((idx, MatchedField::Name));
            }
            for alias in &record.aliases {
                let alias = normalize_name(alias);
                if !alias.is_empty() {
                    patterns.push(alias);
                    pattern_sources.push((idx, MatchedField::Alias));
                }
            }
            for identifier in &record.identifiers {
                let tag = identifier.trim().to_uppercase();
                if !tag.is_empty() {
                    identifier_index.entry(tag).or_default().push(idx);
                }
            }
        }

        let automaton = if patterns.is_empty() {
            None
        } else {
            Some(AhoCorasick::new(&patterns)?)
        };

        Ok(Self {
            automaton,
            pattern_sources,
            identifier_index,
            records,
        })
    }

    /// A set with nothing loaded; every lookup misses.
    pub fn empty() -> Self {
        Self {
            automaton: None,
            pattern_sources: Vec::new(),
            identifier_index: HashMap::new(),
            records: Vec::new(),
        }
    }

    /// `true` when no records have been loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of compiled name/alias patterns.
    #[inline]
    pub fn pattern_count(&self) -> usize {
        self.pattern_sources.len()
    }

    /// Number of records backing the set.
    #[inline]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Full-alignment lookup of an entity against the compiled patterns.
    ///
    /// An automaton hit counts only when it spans the entire joined input;
    /// interior substring hits are discarded. Identifier hits come from the
    /// tag map. Every returned candidate carries `raw_score = 1.0`, ordered
    /// by entry id.
    pub fn match_exact(&self, entity: &NormalizedEntity) -> Vec<Candidate> {
        let joined = entity.normalized_name();
        let mut hits: BTreeMap<usize, Vec<MatchedField>> = BTreeMap::new();

        if let Some(automaton) = &self.automaton
            && !joined.is_empty()
        {
            for found in automaton.find_overlapping_iter(&joined) {
                if found.start() == 0 && found.end() == joined.len() {
                    let (idx, field) = self.pattern_sources[found.pattern().as_usize()];
                    hits.entry(idx).or_default().push(field);
                }
            }
        }

        for identifier in &entity.identifiers {
            if let Some(indices) = self.identifier_index.get(&identifier.tag()) {
                for &idx in indices {
                    hits.entry(idx).or_default().push(MatchedField::Identifier);
                }
            }
        }

        let mut candidates: Vec<Candidate> = hits
            .into_iter()
            .map(|(idx, fields)| {
                let mut candidate = self.records[idx].to_candidate(SourceTier::Exact, 1.0);
                for field in fields {
                    candidate.add_matched_field(field);
                }
                candidate
            })
            .collect();

        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        candidates
    }
}

impl std::fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternSet")
            .field("records", &self.records.len())
            .field("patterns", &self.pattern_sources.len())
            .field("identifiers", &self.identifier_index.len())
            .finish()
    }
}

/// Tier 0 matcher: compiled patterns with a backend fallback.
pub struct ExactMatcher<I> {
    patterns: Arc<PatternSet>,
    index: Arc<I>,
}

impl<I> Clone for ExactMatcher<I> {
    fn clone(&self) -> Self {
        Self {
            patterns: Arc::clone(&self.patterns),
            index: Arc::clone(&self.index),
        }
    }
}

impl<I: WatchlistIndex> ExactMatcher<I> {
    pub fn new(patterns: Arc<PatternSet>, index: Arc<I>) -> Self {
        Self { patterns, index }
    }

    #[inline]
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// In-process pattern lookup, no I/O.
    #[inline]
    pub fn match_exact(&self, entity: &NormalizedEntity) -> Vec<Candidate> {
        self.patterns.match_exact(entity)
    }

    async fn lookup(&self, entity: &NormalizedEntity) -> (Vec<Candidate>, Option<TierError>, bool) {
        if !self.patterns.is_empty() {
            return (self.patterns.match_exact(entity), None, false);
        }

        // No pattern set loaded yet; the backend answers instead.
        let joined = entity.normalized_name();
        match self
            .index
            .exact_lookup(&joined, FALLBACK_LOOKUP_LIMIT)
            .await
        {
            Ok(records) => {
                let mut candidates: Vec<Candidate> = records
                    .iter()
                    .filter_map(|record| {
                        full_alignment_field(record, &joined).map(|field| {
                            record
                                .to_candidate(SourceTier::Exact, 1.0)
                                .with_matched_field(field)
                        })
                    })
                    .collect();
                candidates.sort_by(|a, b| a.id.cmp(&b.id));
                (candidates, None, true)
            }
            Err(err) => {
                warn!(error = %err, "exact lookup fallback failed");
                (Vec::new(), Some(TierError::from(err)), true)
            }
        }
    }
}

/// Which field of `record` aligns with the whole joined input, if any.
fn full_alignment_field(record: &RawRecord, joined: &str) -> Option<MatchedField> {
    if joined.is_empty() {
        return None;
    }
    if normalize_name(&record.name) == joined {
        return Some(MatchedField::Name);
    }
    record
        .aliases
        .iter()
        .any(|alias| normalize_name(alias) == joined)
        .then_some(MatchedField::Alias)
}

#[async_trait]
impl<I: WatchlistIndex> Tier for ExactMatcher<I> {
    fn kind(&self) -> TierKind {
        TierKind::Exact
    }

    async fn run(&self, request: &TierRequest<'_>) -> TierOutcome {
        let started = Instant::now();
        let (candidates, error, degraded) = self.lookup(request.entity).await;
        debug!(hits = candidates.len(), degraded, "exact tier complete");

        TierOutcome {
            kind: TierKind::Exact,
            candidates,
            elapsed: started.elapsed(),
            escalate: false,
            error,
            degraded,
        }
    }
}
