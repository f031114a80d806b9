//! Resolution metrics.
//!
//! Counters accumulate for the process lifetime and are resettable on
//! demand. Updates are lock-free atomic increments; `snapshot` derives the
//! averages. Each record also emits to the `metrics` facade so a host can
//! attach any recorder it likes without the engine knowing.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Point-in-time view of the accumulated counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub network_success_count: u64,
    pub cache_hit_count: u64,
    pub error_count: u64,
    /// Count of conversions that defaulted a missing code to rate 1.0.
    pub identity_fallback_count: u64,
    /// Sum of recorded latencies, microseconds.
    pub cumulative_latency_us: u64,
    /// Mean latency over all recorded requests, microseconds.
    pub average_latency_us: f64,
    /// cache_hit_count / (network_success_count + cache_hit_count).
    pub cache_hit_rate: f64,
}

/// Accumulates resolution counters and latencies.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    network_success: AtomicU64,
    cache_hits: AtomicU64,
    errors: AtomicU64,
    identity_fallbacks: AtomicU64,
    cumulative_latency_us: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, latency: Duration) {
        self.network_success.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
        metrics::counter!("fx_resolutions_total", "outcome" => "network").increment(1);
    }

    pub fn record_cache_hit(&self, latency: Duration) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
        metrics::counter!("fx_resolutions_total", "outcome" => "cache_hit").increment(1);
    }

    pub fn record_error(&self, latency: Duration, reason: &'static str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
        metrics::counter!("fx_resolutions_total", "outcome" => "error").increment(1);
        metrics::counter!("fx_resolution_errors_total", "reason" => reason).increment(1);
    }

    /// A conversion silently defaulted a missing currency to rate 1.0.
    pub fn record_identity_fallback(&self) {
        self.identity_fallbacks.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("fx_identity_fallbacks_total").increment(1);
    }

    fn record_latency(&self, latency: Duration) {
        self.cumulative_latency_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        metrics::histogram!("fx_resolution_duration_seconds").record(latency.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let network_success_count = self.network_success.load(Ordering::Relaxed);
        let cache_hit_count = self.cache_hits.load(Ordering::Relaxed);
        let error_count = self.errors.load(Ordering::Relaxed);
        let identity_fallback_count = self.identity_fallbacks.load(Ordering::Relaxed);
        let cumulative_latency_us = self.cumulative_latency_us.load(Ordering::Relaxed);

        let total_requests = network_success_count + cache_hit_count + error_count;
        let average_latency_us = if total_requests > 0 {
            cumulative_latency_us as f64 / total_requests as f64
        } else {
            0.0
        };

        let lookups = network_success_count + cache_hit_count;
        let cache_hit_rate = if lookups > 0 {
            cache_hit_count as f64 / lookups as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            network_success_count,
            cache_hit_count,
            error_count,
            identity_fallback_count,
            cumulative_latency_us,
            average_latency_us,
            cache_hit_rate,
        }
    }

    pub fn reset(&self) {
        self.network_success.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.identity_fallbacks.store(0, Ordering::Relaxed);
        self.cumulative_latency_us.store(0, Ordering::Relaxed);
    }
}
