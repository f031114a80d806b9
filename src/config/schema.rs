//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Defaults
//! carry the engine's fixed policy constants: 5-minute cache TTL, 1-second
//! request spacing, 3 retry rounds, 10-second attempt timeout, 300-ms
//! debounce quiet period.

use serde::{Deserialize, Serialize};

/// Root configuration for the rate resolution engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Upstream rate provider endpoints.
    pub providers: ProviderConfig,

    /// Cache TTL settings.
    pub cache: CacheConfig,

    /// Retry round settings.
    pub retry: RetryConfig,

    /// Outbound request spacing.
    pub rate_limit: RateLimitConfig,

    /// Per-attempt timeout settings.
    pub timeouts: TimeoutConfig,

    /// Request debounce settings.
    pub debounce: DebounceConfig,

    /// Durable store location.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Upstream provider endpoints, primary first. The base currency is
/// appended as a path segment: `{url}/{BASE}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Primary endpoint template.
    pub primary_url: String,

    /// Fallback endpoint template, tried after the primary each round.
    pub fallback_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            primary_url: "https://open.er-api.com/v6/latest".to_string(),
            fallback_url: "https://api.exchangerate-api.com/v4/latest".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Ordered endpoint list for the fetch pipeline.
    pub fn endpoints(&self) -> Vec<String> {
        vec![self.primary_url.clone(), self.fallback_url.clone()]
    }
}

/// Cache freshness settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds. Entries older than 2×TTL are swept.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Number of rounds through the full endpoint list.
    pub max_rounds: u32,

    /// Base delay for the linear inter-round backoff, milliseconds.
    /// Round N sleeps N × base.
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            backoff_base_ms: 1000,
        }
    }
}

/// Outbound request spacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum spacing between the starts of consecutive network attempts,
    /// milliseconds.
    pub min_interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-attempt deadline in seconds, covering send through body read.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 10 }
    }
}

/// Debounce configuration for rapid trigger bursts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Quiet period after the last trigger before the pipeline fires,
    /// milliseconds.
    pub quiet_period_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 300,
        }
    }
}

/// Durable store location.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON store file. The CLI falls back to `fx-cache.json`
    /// in the working directory when unset.
    pub path: Option<String>,
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log level for this crate (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
