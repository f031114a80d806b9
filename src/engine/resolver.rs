//! Rate resolution with a fallback chain.
//!
//! # Decision policy, in order
//! 1. Fresh cache hit (unless a refresh is forced) → `cache`
//! 2. Connectivity known down → stale cache (`offline_cache`) or the static
//!    table (`static_fallback`); the network is never touched
//! 3. Fetch pipeline → success writes the cache and yields `network`;
//!    failure falls back to any cache entry (`error_cache_fallback`) or the
//!    static table (`error_static_fallback`)
//!
//! `resolve` has no error path by contract: every branch yields a usable
//! table, and degradation travels as a warning string plus provenance tag.

use crate::cache::rate_cache::RateCache;
use crate::fetch::pipeline::FetchPipeline;
use crate::observability::metrics::MetricsCollector;
use crate::rates::fallback::fallback_for_base;
use crate::rates::table::{CurrencyCode, Provenance, ResolutionResult};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::watch;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Orchestrates cache, connectivity, fetch pipeline and fallback tiers.
pub struct ResolutionEngine {
    cache: RateCache,
    pipeline: FetchPipeline,
    metrics: Arc<MetricsCollector>,
    online: watch::Receiver<bool>,
}

impl ResolutionEngine {
    pub fn new(
        cache: RateCache,
        pipeline: FetchPipeline,
        metrics: Arc<MetricsCollector>,
        online: watch::Receiver<bool>,
    ) -> Self {
        Self {
            cache,
            pipeline,
            metrics,
            online,
        }
    }

    /// Resolve the rate table for `base`. Always succeeds.
    pub async fn resolve(&self, base: CurrencyCode, force_refresh: bool) -> ResolutionResult {
        let started = Instant::now();

        if !force_refresh {
            if let Some(entry) = self.cache.get(base, false) {
                self.metrics.record_cache_hit(started.elapsed());
                tracing::debug!(base = %base, "serving fresh cached rates");
                return ResolutionResult {
                    table: entry.rates,
                    fetched_at: entry.inserted_at,
                    provenance: Provenance::Cache,
                    warning: None,
                };
            }
        }

        if !*self.online.borrow() {
            return self.offline_result(base);
        }

        match self.pipeline.fetch(base).await {
            Ok(table) => {
                self.cache.put(base, &table);
                self.metrics.record_success(started.elapsed());
                tracing::info!(base = %base, currencies = table.len(), "rates refreshed from network");
                ResolutionResult {
                    table,
                    fetched_at: now_millis(),
                    provenance: Provenance::Network,
                    warning: None,
                }
            }
            Err(e) => {
                self.metrics.record_error(started.elapsed(), e.reason());
                tracing::warn!(base = %base, error = %e, "all providers failed, walking fallback chain");

                if let Some(entry) = self.cache.get(base, true) {
                    ResolutionResult {
                        table: entry.rates,
                        fetched_at: entry.inserted_at,
                        provenance: Provenance::ErrorCacheFallback,
                        warning: Some(format!("live rates unavailable ({e}); using cached rates")),
                    }
                } else {
                    ResolutionResult {
                        table: fallback_for_base(base),
                        fetched_at: now_millis(),
                        provenance: Provenance::ErrorStaticFallback,
                        warning: Some(format!(
                            "live rates unavailable ({e}); using approximate built-in rates"
                        )),
                    }
                }
            }
        }
    }

    /// Offline tiers: stale cache first, then the static table. No network,
    /// no metrics beyond what the caller records.
    fn offline_result(&self, base: CurrencyCode) -> ResolutionResult {
        if let Some(entry) = self.cache.get(base, true) {
            tracing::debug!(base = %base, "offline, serving cached rates");
            ResolutionResult {
                table: entry.rates,
                fetched_at: entry.inserted_at,
                provenance: Provenance::OfflineCache,
                warning: Some("offline; using cached rates".to_string()),
            }
        } else {
            tracing::debug!(base = %base, "offline with empty cache, serving built-in rates");
            ResolutionResult {
                table: fallback_for_base(base),
                fetched_at: now_millis(),
                provenance: Provenance::StaticFallback,
                warning: Some("offline; using approximate built-in rates".to_string()),
            }
        }
    }
}
