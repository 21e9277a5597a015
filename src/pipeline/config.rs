use std::env;
use std::time::Duration;

use crate::constants::DEFAULT_MAX_RERANK_CANDIDATES;

use super::error::ScreeningError;

/// Funnel shape: thresholds and caps steering tier invocation.
///
/// Use [`FunnelConfig::from_env`] to read `GATEHOUSE_*` overrides on top of
/// defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FunnelConfig {
    /// Tier 0 candidates at or above this raw score stop the funnel early.
    /// Default: `1.0` (full-alignment hits only).
    pub exact_score_threshold: f32,

    /// Tier 1 best key-confidence below this escalates to Tier 2.
    /// Default: `0.6`.
    pub tier1_escalate_below: f32,

    /// Tier 1 best key-confidence at or above this never escalates.
    /// Default: `0.9`.
    pub tier1_sufficient: f32,

    /// Record cap for the Tier 1 backend call. Default: `200`.
    pub tier1_limit: u64,

    /// Nearest neighbours requested from Tier 2. Default: `50`.
    pub tier2_top_k: u64,

    /// Merged candidate cap handed to the reranker. Default: `64`.
    pub max_rerank_candidates: usize,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            exact_score_threshold: 1.0,
            tier1_escalate_below: 0.6,
            tier1_sufficient: 0.9,
            tier1_limit: 200,
            tier2_top_k: 50,
            max_rerank_candidates: DEFAULT_MAX_RERANK_CANDIDATES,
        }
    }
}

impl FunnelConfig {
    const ENV_EXACT_SCORE_THRESHOLD: &'static str = "GATEHOUSE_EXACT_SCORE_THRESHOLD";
    const ENV_TIER1_ESCALATE_BELOW: &'static str = "GATEHOUSE_TIER1_ESCALATE_BELOW";
    const ENV_TIER1_SUFFICIENT: &'static str = "GATEHOUSE_TIER1_SUFFICIENT";
    const ENV_TIER1_LIMIT: &'static str = "GATEHOUSE_TIER1_LIMIT";
    const ENV_TIER2_TOP_K: &'static str = "GATEHOUSE_TIER2_TOP_K";
    const ENV_MAX_RERANK_CANDIDATES: &'static str = "GATEHOUSE_MAX_RERANK_CANDIDATES";

    /// Loads the configuration from environment variables (falling back to
    /// defaults).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            exact_score_threshold: parse_f32_from_env(
                Self::ENV_EXACT_SCORE_THRESHOLD,
                defaults.exact_score_threshold,
            ),
            tier1_escalate_below: parse_f32_from_env(
                Self::ENV_TIER1_ESCALATE_BELOW,
                defaults.tier1_escalate_below,
            ),
            tier1_sufficient: parse_f32_from_env(
                Self::ENV_TIER1_SUFFICIENT,
                defaults.tier1_sufficient,
            ),
            tier1_limit: parse_u64_from_env(Self::ENV_TIER1_LIMIT, defaults.tier1_limit),
            tier2_top_k: parse_u64_from_env(Self::ENV_TIER2_TOP_K, defaults.tier2_top_k),
            max_rerank_candidates: parse_u64_from_env(
                Self::ENV_MAX_RERANK_CANDIDATES,
                defaults.max_rerank_candidates as u64,
            ) as usize,
        }
    }

    /// Rejects thresholds outside `[0, 1]`, an escalation band that inverts,
    /// and zero caps.
    pub fn validate(&self) -> Result<(), ScreeningError> {
        for (name, value) in [
            ("exact_score_threshold", self.exact_score_threshold),
            ("tier1_escalate_below", self.tier1_escalate_below),
            ("tier1_sufficient", self.tier1_sufficient),
        ] {
            if value.is_nan() || !(0.0..=1.0).contains(&value) {
                return Err(ScreeningError::InvalidConfig {
                    name,
                    value: value.to_string(),
                });
            }
        }
        if self.tier1_escalate_below > self.tier1_sufficient {
            return Err(ScreeningError::InvalidConfig {
                name: "tier1_escalate_below",
                value: format!(
                    "{} exceeds tier1_sufficient {}",
                    self.tier1_escalate_below, self.tier1_sufficient
                ),
            });
        }
        if self.tier1_limit == 0 {
            return Err(ScreeningError::InvalidConfig {
                name: "tier1_limit",
                value: "0".to_string(),
            });
        }
        if self.tier2_top_k == 0 {
            return Err(ScreeningError::InvalidConfig {
                name: "tier2_top_k",
                value: "0".to_string(),
            });
        }
        if self.max_rerank_candidates == 0 {
            return Err(ScreeningError::InvalidConfig {
                name: "max_rerank_candidates",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn with_exact_score_threshold(mut self, threshold: f32) -> Self {
        self.exact_score_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_tier1_escalate_below(mut self, threshold: f32) -> Self {
        self.tier1_escalate_below = threshold;
        self
    }

    #[must_use]
    pub fn with_tier1_sufficient(mut self, threshold: f32) -> Self {
        self.tier1_sufficient = threshold;
        self
    }

    #[must_use]
    pub fn with_tier1_limit(mut self, limit: u64) -> Self {
        self.tier1_limit = limit;
        self
    }

    #[must_use]
    pub fn with_tier2_top_k(mut self, top_k: u64) -> Self {
        self.tier2_top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_max_rerank_candidates(mut self, cap: usize) -> Self {
        self.max_rerank_candidates = cap;
        self
    }
}

/// Latency budget: the global per-request deadline and the per-backend-call
/// timeouts carved out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetConfig {
    /// Hard deadline for one screening request. Default: `250ms`.
    pub request_budget: Duration,

    /// Cap on the Tier 1 backend call. Default: `100ms`.
    pub tier1_timeout: Duration,

    /// Cap on the Tier 2 backend call, the most expensive path.
    /// Default: `120ms`.
    pub tier2_timeout: Duration,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            request_budget: Duration::from_millis(250),
            tier1_timeout: Duration::from_millis(100),
            tier2_timeout: Duration::from_millis(120),
        }
    }
}

impl BudgetConfig {
    const ENV_REQUEST_BUDGET_MS: &'static str = "GATEHOUSE_REQUEST_BUDGET_MS";
    const ENV_TIER1_TIMEOUT_MS: &'static str = "GATEHOUSE_TIER1_TIMEOUT_MS";
    const ENV_TIER2_TIMEOUT_MS: &'static str = "GATEHOUSE_TIER2_TIMEOUT_MS";

    /// Loads the configuration from environment variables (falling back to
    /// defaults).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            request_budget: parse_millis_from_env(
                Self::ENV_REQUEST_BUDGET_MS,
                defaults.request_budget,
            ),
            tier1_timeout: parse_millis_from_env(
                Self::ENV_TIER1_TIMEOUT_MS,
                defaults.tier1_timeout,
            ),
            tier2_timeout: parse_millis_from_env(
                Self::ENV_TIER2_TIMEOUT_MS,
                defaults.tier2_timeout,
            ),
        }
    }

    /// A zero budget or timeout would fail every request before it starts.
    pub fn validate(&self) -> Result<(), ScreeningError> {
        for (name, value) in [
            ("request_budget", self.request_budget),
            ("tier1_timeout", self.tier1_timeout),
            ("tier2_timeout", self.tier2_timeout),
        ] {
            if value.is_zero() {
                return Err(ScreeningError::InvalidConfig {
                    name,
                    value: "0ms".to_string(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn with_request_budget(mut self, budget: Duration) -> Self {
        self.request_budget = budget;
        self
    }

    #[must_use]
    pub fn with_tier1_timeout(mut self, timeout: Duration) -> Self {
        self.tier1_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_tier2_timeout(mut self, timeout: Duration) -> Self {
        self.tier2_timeout = timeout;
        self
    }
}

fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
    env::var(var_name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_f32_from_env(var_name: &str, default: f32) -> f32 {
    env::var(var_name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_millis_from_env(var_name: &str, default: Duration) -> Duration {
    env::var(var_name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
