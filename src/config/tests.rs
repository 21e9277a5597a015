use super::*;
use serial_test::serial;
use std::env;
use std::time::Duration;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_gatehouse_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("GATEHOUSE_CACHE_CAPACITY");
        env::remove_var("GATEHOUSE_CACHE_TTL_SECS");
        env::remove_var("GATEHOUSE_SCORE_PRESET");
        env::remove_var("GATEHOUSE_THRESHOLD_HIGH");
        env::remove_var("GATEHOUSE_THRESHOLD_MEDIUM");
        env::remove_var("GATEHOUSE_VECTOR_DIM");
        env::remove_var("GATEHOUSE_EXACT_SCORE_THRESHOLD");
        env::remove_var("GATEHOUSE_TIER1_ESCALATE_BELOW");
        env::remove_var("GATEHOUSE_TIER1_SUFFICIENT");
        env::remove_var("GATEHOUSE_TIER1_LIMIT");
        env::remove_var("GATEHOUSE_TIER2_TOP_K");
        env::remove_var("GATEHOUSE_MAX_RERANK_CANDIDATES");
        env::remove_var("GATEHOUSE_REQUEST_BUDGET_MS");
        env::remove_var("GATEHOUSE_TIER1_TIMEOUT_MS");
        env::remove_var("GATEHOUSE_TIER2_TIMEOUT_MS");
        env::remove_var("GATEHOUSE_INDEX_URL");
        env::remove_var("GATEHOUSE_INDEX_COLLECTION");
        env::remove_var("GATEHOUSE_SHADOW_ENABLED");
    }
}

#[test]
fn test_default_config() {
    let config = ScreeningConfig::default();

    assert_eq!(config.cache.capacity, 50_000);
    assert_eq!(config.cache.ttl, Duration::from_secs(600));
    assert_eq!(config.weights, ScoreWeights::conservative());
    assert_eq!(config.thresholds.high, 0.85);
    assert_eq!(config.thresholds.medium, 0.60);
    assert_eq!(config.funnel.tier1_limit, 200);
    assert_eq!(config.funnel.tier2_top_k, 50);
    assert_eq!(config.budget.request_budget, Duration::from_millis(250));
    assert_eq!(config.index.url, "http://localhost:6334");
    assert_eq!(config.index.collection, "watchlist_entries");
    assert!(!config.shadow_enabled);
}

#[test]
fn test_default_config_validates() {
    ScreeningConfig::default()
        .validate()
        .expect("should accept the default configuration");
}

#[test]
#[serial]
fn test_from_env_without_overrides() {
    clear_gatehouse_env();

    let config = ScreeningConfig::from_env();

    assert_eq!(config, ScreeningConfig::default());
}

#[test]
#[serial]
fn test_from_env_reads_cache_section() {
    clear_gatehouse_env();

    let config = with_env_vars(
        &[
            ("GATEHOUSE_CACHE_CAPACITY", "1234"),
            ("GATEHOUSE_CACHE_TTL_SECS", "90"),
        ],
        ScreeningConfig::from_env,
    );

    assert_eq!(config.cache.capacity, 1234);
    assert_eq!(config.cache.ttl, Duration::from_secs(90));
}

#[test]
#[serial]
fn test_from_env_selects_score_preset() {
    clear_gatehouse_env();

    let config = with_env_vars(
        &[("GATEHOUSE_SCORE_PRESET", "recall_tuned")],
        ScreeningConfig::from_env,
    );

    assert_eq!(config.weights, ScoreWeights::recall_tuned());
}

#[test]
#[serial]
fn test_from_env_reads_thresholds() {
    clear_gatehouse_env();

    let config = with_env_vars(
        &[
            ("GATEHOUSE_THRESHOLD_HIGH", "0.9"),
            ("GATEHOUSE_THRESHOLD_MEDIUM", "0.5"),
        ],
        ScreeningConfig::from_env,
    );

    assert_eq!(config.thresholds.high, 0.9);
    assert_eq!(config.thresholds.medium, 0.5);
}

#[test]
#[serial]
fn test_from_env_reads_funnel_and_budget() {
    clear_gatehouse_env();

    let config = with_env_vars(
        &[
            ("GATEHOUSE_EXACT_SCORE_THRESHOLD", "0.97"),
            ("GATEHOUSE_TIER1_ESCALATE_BELOW", "0.5"),
            ("GATEHOUSE_TIER1_SUFFICIENT", "0.8"),
            ("GATEHOUSE_TIER1_LIMIT", "64"),
            ("GATEHOUSE_TIER2_TOP_K", "16"),
            ("GATEHOUSE_MAX_RERANK_CANDIDATES", "32"),
            ("GATEHOUSE_REQUEST_BUDGET_MS", "400"),
            ("GATEHOUSE_TIER1_TIMEOUT_MS", "70"),
            ("GATEHOUSE_TIER2_TIMEOUT_MS", "150"),
        ],
        ScreeningConfig::from_env,
    );

    assert_eq!(config.funnel.exact_score_threshold, 0.97);
    assert_eq!(config.funnel.tier1_escalate_below, 0.5);
    assert_eq!(config.funnel.tier1_sufficient, 0.8);
    assert_eq!(config.funnel.tier1_limit, 64);
    assert_eq!(config.funnel.tier2_top_k, 16);
    assert_eq!(config.funnel.max_rerank_candidates, 32);
    assert_eq!(config.budget.request_budget, Duration::from_millis(400));
    assert_eq!(config.budget.tier1_timeout, Duration::from_millis(70));
    assert_eq!(config.budget.tier2_timeout, Duration::from_millis(150));
}

#[test]
#[serial]
fn test_from_env_reads_index_endpoint() {
    clear_gatehouse_env();

    let config = with_env_vars(
        &[
            ("GATEHOUSE_INDEX_URL", "http://qdrant.internal:6334"),
            ("GATEHOUSE_INDEX_COLLECTION", "ofac_sdn"),
        ],
        ScreeningConfig::from_env,
    );

    assert_eq!(config.index.url, "http://qdrant.internal:6334");
    assert_eq!(config.index.collection, "ofac_sdn");
}

#[test]
#[serial]
fn test_shadow_flag_accepts_common_forms() {
    clear_gatehouse_env();

    for (value, expected) in [("1", true), ("true", true), ("0", false), ("false", false)] {
        let config = with_env_vars(
            &[("GATEHOUSE_SHADOW_ENABLED", value)],
            ScreeningConfig::from_env,
        );
        assert_eq!(config.shadow_enabled, expected, "value {value:?}");
    }
}

#[test]
#[serial]
fn test_unparseable_override_falls_back_to_default() {
    clear_gatehouse_env();

    let config = with_env_vars(
        &[
            ("GATEHOUSE_CACHE_CAPACITY", "plenty"),
            ("GATEHOUSE_SHADOW_ENABLED", "yes"),
        ],
        ScreeningConfig::from_env,
    );

    assert_eq!(config.cache.capacity, 50_000);
    assert!(!config.shadow_enabled);
}

#[test]
fn test_validate_rejects_empty_index_url() {
    let config = ScreeningConfig::default().with_index(IndexConfig::default().with_url("  "));

    let error = config
        .validate()
        .expect_err("should reject a blank index url");

    assert!(matches!(error, ConfigError::EmptyIndexUrl));
}

#[test]
fn test_validate_rejects_empty_collection() {
    let config = ScreeningConfig::default().with_index(IndexConfig::default().with_collection(""));

    let error = config
        .validate()
        .expect_err("should reject a blank collection name");

    assert!(matches!(error, ConfigError::EmptyIndexCollection));
}

#[test]
fn test_validate_surfaces_decision_section_errors() {
    let mut config = ScreeningConfig::default();
    config.thresholds.medium = 0.9;
    config.thresholds.high = 0.6;

    let error = config
        .validate()
        .expect_err("should reject inverted thresholds");

    assert!(matches!(error, ConfigError::Decision { .. }));
}

#[test]
fn test_validate_surfaces_funnel_section_errors() {
    let mut config = ScreeningConfig::default();
    config.funnel.tier1_escalate_below = 0.95;
    config.funnel.tier1_sufficient = 0.9;

    let error = config
        .validate()
        .expect_err("should reject an inverted escalation band");

    assert!(matches!(error, ConfigError::Pipeline { .. }));
}

#[test]
fn test_index_builders() {
    let index = IndexConfig::default()
        .with_url("http://10.0.0.5:6334")
        .with_collection("eu_consolidated");

    assert_eq!(index.url, "http://10.0.0.5:6334");
    assert_eq!(index.collection, "eu_consolidated");
    index.validate().expect("should accept a populated endpoint");
}
