//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `GATEHOUSE_*` environment
//! variables. [`ScreeningConfig`] gathers every section the pipeline needs;
//! each section also exposes its own `from_env` and `validate` so callers
//! can assemble partial configurations in tests and tools.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;

use crate::cache::CacheConfig;
use crate::decision::{RiskThresholds, ScoreWeights};
use crate::index::DEFAULT_COLLECTION;
use crate::matchers::VectorizerConfig;
use crate::pipeline::{BudgetConfig, FunnelConfig};
use crate::tier::RerankWeights;

/// Connection settings for the watchlist index backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Index endpoint URL. Default: `http://localhost:6334`.
    pub url: String,

    /// Collection holding the watchlist entries. Default: `watchlist_entries`.
    pub collection: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl IndexConfig {
    const ENV_URL: &'static str = "GATEHOUSE_INDEX_URL";
    const ENV_COLLECTION: &'static str = "GATEHOUSE_INDEX_COLLECTION";

    /// Reads `GATEHOUSE_INDEX_*` overrides on top of the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env::var(Self::ENV_URL).unwrap_or(defaults.url),
            collection: env::var(Self::ENV_COLLECTION).unwrap_or(defaults.collection),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::EmptyIndexUrl);
        }
        if self.collection.trim().is_empty() {
            return Err(ConfigError::EmptyIndexCollection);
        }
        Ok(())
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }
}

/// Everything the screening pipeline reads, assembled in one place.
///
/// Use [`ScreeningConfig::from_env`] to read `GATEHOUSE_*` overrides on top
/// of defaults, then [`ScreeningConfig::validate`] before constructing the
/// pipeline. The rerank weights have no environment override; adjust them
/// through the struct when a deployment needs different feature emphasis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreeningConfig {
    /// Decision cache sizing and TTL.
    pub cache: CacheConfig,

    /// Evidence weights for the decision engine.
    pub weights: ScoreWeights,

    /// Risk level cut lines.
    pub thresholds: RiskThresholds,

    /// Feature weights for candidate reranking.
    pub rerank: RerankWeights,

    /// Name vectorizer dimensions and n-gram ranges.
    pub vectorizer: VectorizerConfig,

    /// Escalation thresholds and per-tier caps.
    pub funnel: FunnelConfig,

    /// Request and per-tier time budgets.
    pub budget: BudgetConfig,

    /// Watchlist index endpoint.
    pub index: IndexConfig,

    /// Run the early-stop-disabled shadow funnel after every request.
    /// Default: `false`.
    pub shadow_enabled: bool,
}

impl ScreeningConfig {
    const ENV_SHADOW_ENABLED: &'static str = "GATEHOUSE_SHADOW_ENABLED";

    /// Reads `GATEHOUSE_*` overrides on top of the defaults.
    ///
    /// Unparseable values fall back to their defaults; use
    /// [`ScreeningConfig::validate`] to reject inconsistent combinations.
    pub fn from_env() -> Self {
        Self {
            cache: CacheConfig::from_env(),
            weights: ScoreWeights::from_env(),
            thresholds: RiskThresholds::from_env(),
            rerank: RerankWeights::default(),
            vectorizer: VectorizerConfig::from_env(),
            funnel: FunnelConfig::from_env(),
            budget: BudgetConfig::from_env(),
            index: IndexConfig::from_env(),
            shadow_enabled: parse_bool_from_env(Self::ENV_SHADOW_ENABLED, false),
        }
    }

    /// Validates every section, reporting the first rejection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        self.weights.validate()?;
        self.thresholds.validate()?;
        self.rerank.validate()?;
        self.vectorizer.validate()?;
        self.funnel.validate()?;
        self.budget.validate()?;
        self.index.validate()?;
        Ok(())
    }

    #[must_use]
    pub fn with_shadow_enabled(mut self, enabled: bool) -> Self {
        self.shadow_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: IndexConfig) -> Self {
        self.index = index;
        self
    }
}

fn parse_bool_from_env(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .and_then(|value| match value.trim() {
            "1" => Some(true),
            "0" => Some(false),
            other => other.parse().ok(),
        })
        .unwrap_or(default)
}
