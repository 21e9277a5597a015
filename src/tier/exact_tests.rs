use super::exact::{ExactMatcher, PatternSet};
use super::{Tier, TierKind, TierRequest};
use crate::candidate::{EntityType, MatchedField, SourceTier};
use crate::decision::ReasonCode;
use crate::entity::{IdKind, Identifier, Language, NormalizedEntity};
use crate::index::{MockWatchlistIndex, RawRecord};
use std::sync::Arc;

fn entity(tokens: &[&str]) -> NormalizedEntity {
    NormalizedEntity::new(tokens.iter().map(|t| t.to_string()).collect(), Language::En)
}

fn person(id: &str, name: &str) -> RawRecord {
    RawRecord::new(id, name, EntityType::Person)
}

fn compiled(records: Vec<RawRecord>) -> PatternSet {
    PatternSet::compile(records).expect("pattern set should compile")
}

#[test]
fn test_compile_counts_patterns_and_records() {
    let patterns = compiled(vec![
        person("e-1", "Ivan Petrov").with_aliases(vec!["I. Petrov".into(), "Vanya Petrov".into()]),
        person("e-2", "Maria Sidorova"),
    ]);

    assert!(!patterns.is_empty());
    assert_eq!(patterns.record_count(), 2);
    assert_eq!(patterns.pattern_count(), 4);
}

#[test]
fn test_full_span_name_match() {
    let patterns = compiled(vec![person("e-1", "Ivan Petrov")]);
    let hits = patterns.match_exact(&entity(&["Ivan", "Petrov"]));

    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.id, "e-1");
    assert_eq!(hit.source_tier, SourceTier::Exact);
    assert_eq!(hit.raw_score, 1.0);
    assert!(hit.has_field(MatchedField::Name));
}

#[test]
fn test_interior_substring_hit_discarded() {
    // "petrov" occurs inside "ivan petrov" but does not cover the whole
    // input, so it must not surface.
    let patterns = compiled(vec![person("e-1", "Petrov")]);
    let hits = patterns.match_exact(&entity(&["Ivan", "Petrov"]));

    assert!(hits.is_empty());
}

#[test]
fn test_alias_full_span_match() {
    let record =
        person("e-1", "Ivan Petrovich Petrov").with_aliases(vec!["Ivan Petrov".into()]);
    let patterns = compiled(vec![record]);
    let hits = patterns.match_exact(&entity(&["Ivan", "Petrov"]));

    assert_eq!(hits.len(), 1);
    assert!(hits[0].has_field(MatchedField::Alias));
    assert!(!hits[0].has_field(MatchedField::Name));
    assert_eq!(hits[0].matched_text, "Ivan Petrovich Petrov");
}

#[test]
fn test_identifier_tag_hit_without_name_match() {
    let record = person("e-1", "Ivan Petrov").with_identifiers(vec!["inn:1234567890".into()]);
    let patterns = compiled(vec![record]);

    let input = entity(&["Maria", "Sidorova"])
        .with_identifier(Identifier::new(IdKind::Inn, "1234567890"));
    let hits = patterns.match_exact(&input);

    assert_eq!(hits.len(), 1);
    assert!(hits[0].has_field(MatchedField::Identifier));
    assert!(!hits[0].has_field(MatchedField::Name));
}

#[test]
fn test_name_and_identifier_hits_combine_on_one_candidate() {
    let record = person("e-1", "Ivan Petrov").with_identifiers(vec!["INN:1234567890".into()]);
    let patterns = compiled(vec![record]);

    let input = entity(&["Ivan", "Petrov"])
        .with_identifier(Identifier::new(IdKind::Inn, "1234567890"));
    let hits = patterns.match_exact(&input);

    assert_eq!(hits.len(), 1);
    assert!(hits[0].has_field(MatchedField::Name));
    assert!(hits[0].has_field(MatchedField::Identifier));
}

#[test]
fn test_hits_ordered_by_entry_id() {
    let patterns = compiled(vec![
        person("e-9", "Ivan Petrov"),
        person("e-1", "Ivan Petrov"),
    ]);
    let hits = patterns.match_exact(&entity(&["Ivan", "Petrov"]));

    let ids: Vec<&str> = hits.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["e-1", "e-9"]);
}

#[test]
fn test_empty_set_never_matches() {
    let patterns = PatternSet::empty();

    assert!(patterns.is_empty());
    assert_eq!(patterns.pattern_count(), 0);
    assert!(patterns.match_exact(&entity(&["Ivan", "Petrov"])).is_empty());
}

#[test]
fn test_blank_input_never_matches() {
    let patterns = compiled(vec![person("e-1", "Ivan Petrov")]);
    assert!(patterns.match_exact(&entity(&[])).is_empty());
}

#[tokio::test]
async fn test_compiled_set_answers_without_backend() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.seed(person("backend-only", "ivan petrov"));

    let patterns = Arc::new(compiled(vec![person("e-1", "Ivan Petrov")]));
    let matcher = ExactMatcher::new(patterns, Arc::clone(&index));

    let input = entity(&["Ivan", "Petrov"]);
    let outcome = matcher.run(&TierRequest::new(&input)).await;

    assert_eq!(outcome.kind, TierKind::Exact);
    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.candidates[0].id, "e-1");
    assert!(!outcome.degraded);
    assert!(!outcome.escalate);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.degradation_reason(), None);
    assert_eq!(index.exact_calls(), 0);
}

#[tokio::test]
async fn test_unloaded_set_falls_back_to_backend() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.seed(person("e-1", "ivan petrov"));

    let matcher = ExactMatcher::new(Arc::new(PatternSet::empty()), Arc::clone(&index));

    let input = entity(&["Ivan", "Petrov"]);
    let outcome = matcher.run(&TierRequest::new(&input)).await;

    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.candidates[0].id, "e-1");
    assert!(outcome.candidates[0].has_field(MatchedField::Name));
    assert!(outcome.degraded);
    assert!(outcome.error.is_none());
    assert_eq!(
        outcome.degradation_reason(),
        Some(ReasonCode::ExactLookupDegraded)
    );
    assert_eq!(index.exact_calls(), 1);
}

#[tokio::test]
async fn test_fallback_maps_alias_hits() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.seed(person("e-1", "Ivan Petrovich Petrov").with_aliases(vec!["ivan petrov".into()]));

    let matcher = ExactMatcher::new(Arc::new(PatternSet::empty()), index);

    let input = entity(&["Ivan", "Petrov"]);
    let outcome = matcher.run(&TierRequest::new(&input)).await;

    assert_eq!(outcome.candidates.len(), 1);
    assert!(outcome.candidates[0].has_field(MatchedField::Alias));
}

#[tokio::test]
async fn test_fallback_failure_reports_degradation() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.set_fail_exact(true);

    let matcher = ExactMatcher::new(Arc::new(PatternSet::empty()), Arc::clone(&index));

    let input = entity(&["Ivan", "Petrov"]);
    let outcome = matcher.run(&TierRequest::new(&input)).await;

    assert!(outcome.candidates.is_empty());
    let error = outcome.error.as_ref().expect("failure should be reported");
    assert!(!error.is_timeout());
    assert_eq!(
        outcome.degradation_reason(),
        Some(ReasonCode::ExactLookupDegraded)
    );
    assert_eq!(index.exact_calls(), 1);
}
