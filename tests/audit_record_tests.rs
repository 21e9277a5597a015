//! Shape and stability of the per-request audit record.
//!
//! Downstream case-management systems consume serialized screening results;
//! these tests pin the wire shape they depend on.

mod common;

use std::sync::Arc;

use common::fixtures::{default_pipeline, listed_person, screening_entity, unrelated_patterns};
use gatehouse::{
    Identifier, IdKind, MockWatchlistIndex, PatternSet, ReasonCode, RequiredField, RiskLevel,
    ScreeningResult, TierKind,
};

#[tokio::test]
async fn test_result_survives_serialization_round_trip() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.seed(listed_person());
    let pipeline = default_pipeline(&index, unrelated_patterns());

    let entity = screening_entity(&["Ivan", "Petroff"]);
    let result = pipeline.screen(&entity).await.expect("should screen");

    let json = serde_json::to_string(&result).expect("should serialize");
    let restored: ScreeningResult = serde_json::from_str(&json).expect("should deserialize");

    assert_eq!(restored, result);
}

#[tokio::test]
async fn test_diagnostics_cover_every_tier_in_funnel_order() {
    let index = Arc::new(MockWatchlistIndex::new());
    index.seed(listed_person());
    let pipeline = default_pipeline(&index, unrelated_patterns());

    let entity = screening_entity(&["Ivan", "Petroff"]);
    let result = pipeline.screen(&entity).await.expect("should screen");

    let kinds: Vec<TierKind> = result.tier_diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TierKind::Exact,
            TierKind::Blocking,
            TierKind::Vector,
            TierKind::Rerank,
        ]
    );
}

#[tokio::test]
async fn test_audit_ids_distinguish_recomputed_requests() {
    let index = Arc::new(MockWatchlistIndex::new());
    let pipeline = default_pipeline(&index, unrelated_patterns());

    let first = pipeline
        .screen(&screening_entity(&["Ivan", "Petrov"]))
        .await
        .expect("should screen");
    let second = pipeline
        .screen(&screening_entity(&["Petr", "Sidorov"]))
        .await
        .expect("should screen");

    assert_ne!(first.audit_id, second.audit_id);
}

#[tokio::test]
async fn test_result_wire_field_names() {
    let index = Arc::new(MockWatchlistIndex::new());
    let patterns = Arc::new(PatternSet::compile(vec![listed_person()]).expect("should compile"));
    let pipeline = default_pipeline(&index, patterns);

    let entity = screening_entity(&["Ivan", "Petrov"])
        .with_identifier(Identifier::new(IdKind::Inn, "1234567890"));
    let result = pipeline.screen(&entity).await.expect("should screen");

    let value = serde_json::to_value(&result).expect("should serialize");
    for field in [
        "audit_id",
        "decision",
        "candidates",
        "tier_diagnostics",
        "cache_hit",
        "screened_at",
        "elapsed_ms",
    ] {
        assert!(value.get(field).is_some(), "missing field {field}");
    }

    let decision = &value["decision"];
    assert_eq!(decision["risk_level"], "high");
    assert!(decision["risk_score"].as_f64().expect("should be a number") > 0.9);
    assert_eq!(decision["review_required"], false);

    let candidate = &value["candidates"][0];
    assert_eq!(candidate["id"], "OFAC-10001");
    assert_eq!(candidate["source_tier"], "exact");
    assert!(
        candidate["matched_fields"]
            .as_array()
            .expect("should be an array")
            .iter()
            .any(|f| f == "identifier")
    );
}

#[tokio::test]
async fn test_reason_codes_and_required_fields_wire_forms() {
    let reason = serde_json::to_value(ReasonCode::IdExactMatch).expect("should serialize");
    assert_eq!(reason, "id_exact_match");

    let timeout = serde_json::to_value(ReasonCode::VectorSearchTimeout).expect("should serialize");
    assert_eq!(timeout, "vector_search_timeout");

    let skip = serde_json::to_value(RiskLevel::Skip).expect("should serialize");
    assert_eq!(skip, "skip");

    let tin = serde_json::to_value(RequiredField::Tin).expect("should serialize");
    assert_eq!(tin, "TIN");

    let dob = serde_json::to_value(RequiredField::Dob).expect("should serialize");
    assert_eq!(dob, "DOB");
}
