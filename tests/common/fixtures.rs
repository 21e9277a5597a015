//! Shared builders for pipeline integration tests.

use std::sync::Arc;

use gatehouse::{
    EntityType, Language, MockWatchlistIndex, NormalizedEntity, PatternSet, PrefilterSignal,
    PrefilterVerdict, RawRecord, ScreeningConfig, ScreeningPipeline,
};

/// An entity that the upstream prefilter judged to be a screenable person.
pub fn screening_entity(tokens: &[&str]) -> NormalizedEntity {
    NormalizedEntity::new(
        tokens.iter().map(|t| (*t).to_string()).collect(),
        Language::En,
    )
    .with_prefilter(PrefilterSignal {
        verdict: PrefilterVerdict::Entity,
        signal: 0.9,
        person_evidence: 0.8,
        org_evidence: 0.1,
    })
}

pub fn person(id: &str, name: &str) -> RawRecord {
    RawRecord::new(id, name, EntityType::Person)
}

/// A fully populated watchlist entry: aliases, identifier, birth year, and
/// the blocking keys ingestion would derive for it.
pub fn listed_person() -> RawRecord {
    person("OFAC-10001", "Ivan Petrov")
        .with_aliases(vec!["Ivan Petroff".into()])
        .with_identifiers(vec!["INN:1234567890".into()])
        .with_dob_year(1980)
        .with_source("OFAC")
        .with_program("SDN")
        .with_blocking_keys(vec!["sx:P361".into(), "fi:i".into(), "by:1980".into()])
}

/// A compiled set that cannot match the entities under test.
pub fn unrelated_patterns() -> Arc<PatternSet> {
    Arc::new(PatternSet::compile(vec![person("X-1", "Zz Qq")]).expect("should compile"))
}

pub fn pipeline_with(
    config: &ScreeningConfig,
    index: &Arc<MockWatchlistIndex>,
    patterns: Arc<PatternSet>,
) -> ScreeningPipeline<MockWatchlistIndex> {
    ScreeningPipeline::new(config, Arc::clone(index), patterns)
        .expect("should build the pipeline")
}

pub fn default_pipeline(
    index: &Arc<MockWatchlistIndex>,
    patterns: Arc<PatternSet>,
) -> ScreeningPipeline<MockWatchlistIndex> {
    pipeline_with(&ScreeningConfig::default(), index, patterns)
}
