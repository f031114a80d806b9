//! End-to-end tests for the resolution engine against mock providers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use fx_engine::{CurrencyCode, EngineConfig, MemoryStore, Provenance, RateService, Shutdown};

mod common;

fn code(s: &str) -> CurrencyCode {
    s.parse().unwrap()
}

fn service_with(config: &EngineConfig) -> (RateService, Shutdown) {
    let shutdown = Shutdown::new();
    let service = RateService::new(
        config,
        Arc::new(MemoryStore::new()),
        code("USD"),
        &shutdown,
    );
    (service, shutdown)
}

#[tokio::test]
async fn test_network_success_then_cache_hit() {
    let primary = common::start_fixed_provider(200, common::rates_body()).await;
    let fallback = common::start_fixed_provider(500, String::new()).await;
    let config = common::test_config(primary, fallback);
    let (service, _shutdown) = service_with(&config);

    let result = service.resolve(code("USD"), false).await;
    assert_eq!(result.provenance, Provenance::Network);
    assert_eq!(result.table.get(code("EUR")), Some(0.9));
    assert!(result.warning.is_none());

    let state = service.state();
    assert!(!state.loading);
    assert_eq!(state.provenance, Some(Provenance::Network));
    assert_eq!(state.rates.get(code("GBP")), Some(0.8));
    assert!(state.last_update.is_some());

    // Second request within TTL comes from the cache.
    let result = service.resolve(code("USD"), false).await;
    assert_eq!(result.provenance, Provenance::Cache);

    let metrics = service.metrics();
    assert_eq!(metrics.network_success_count, 1);
    assert_eq!(metrics.cache_hit_count, 1);
    assert!((metrics.cache_hit_rate - 0.5).abs() < f64::EPSILON);

    let stats = service.cache_stats();
    assert_eq!(stats.entry_count, 1);
}

#[tokio::test]
async fn test_conversion_rates_alias_is_accepted() {
    let primary = common::start_fixed_provider(200, common::conversion_rates_body()).await;
    let fallback = common::start_fixed_provider(500, String::new()).await;
    let config = common::test_config(primary, fallback);
    let (service, _shutdown) = service_with(&config);

    let result = service.resolve(code("USD"), false).await;
    assert_eq!(result.provenance, Provenance::Network);
    assert_eq!(result.table.get(code("EUR")), Some(0.9));
}

#[tokio::test]
async fn test_fallback_endpoint_used_when_primary_fails() {
    let primary_calls = Arc::new(AtomicU32::new(0));
    let pc = primary_calls.clone();
    let primary = common::start_provider(move || {
        let pc = pc.clone();
        async move {
            pc.fetch_add(1, Ordering::SeqCst);
            (503, "unavailable".to_string())
        }
    })
    .await;
    let fallback = common::start_fixed_provider(200, common::rates_body()).await;
    let config = common::test_config(primary, fallback);
    let (service, _shutdown) = service_with(&config);

    let result = service.resolve(code("USD"), false).await;
    assert_eq!(result.provenance, Provenance::Network);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retry_rounds_until_success() {
    let primary_calls = Arc::new(AtomicU32::new(0));
    let pc = primary_calls.clone();
    // Fails twice, succeeds on the third round.
    let primary = common::start_provider(move || {
        let pc = pc.clone();
        async move {
            let count = pc.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                (503, "unavailable".to_string())
            } else {
                (200, common::rates_body())
            }
        }
    })
    .await;
    let fallback = common::start_fixed_provider(500, String::new()).await;
    let mut config = common::test_config(primary, fallback);
    config.retry.max_rounds = 3;
    let (service, _shutdown) = service_with(&config);

    let result = service.resolve(code("USD"), false).await;
    assert_eq!(result.provenance, Provenance::Network);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_all_providers_down_without_cache_uses_static_table() {
    let primary = common::start_fixed_provider(500, String::new()).await;
    let fallback = common::start_fixed_provider(502, String::new()).await;
    let config = common::test_config(primary, fallback);
    let (service, _shutdown) = service_with(&config);

    let result = service.resolve(code("USD"), false).await;
    assert_eq!(result.provenance, Provenance::ErrorStaticFallback);
    assert!(!result.table.is_empty());
    assert!(result.warning.is_some());

    let state = service.state();
    assert!(state.error.is_some());
    assert_eq!(service.metrics().error_count, 1);
}

#[tokio::test]
async fn test_all_providers_down_with_cache_prefers_cached_rates() {
    let healthy = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let h = healthy.clone();
    let primary = common::start_provider(move || {
        let h = h.clone();
        async move {
            if h.load(Ordering::SeqCst) {
                (200, common::rates_body())
            } else {
                (500, "down".to_string())
            }
        }
    })
    .await;
    let fallback = common::start_fixed_provider(500, String::new()).await;
    let config = common::test_config(primary, fallback);
    let (service, _shutdown) = service_with(&config);

    // Seed the cache, then take the providers down.
    service.resolve(code("USD"), false).await;
    healthy.store(false, Ordering::SeqCst);

    let result = service.resolve(code("USD"), true).await;
    assert_eq!(result.provenance, Provenance::ErrorCacheFallback);
    assert_eq!(result.table.get(code("EUR")), Some(0.9));
    assert!(result.warning.is_some());
}

#[tokio::test]
async fn test_malformed_body_walks_fallback_chain() {
    let primary =
        common::start_fixed_provider(200, r#"{"unexpected": {"EUR": 0.9}}"#.to_string()).await;
    let fallback = common::start_fixed_provider(200, r#"not even json"#.to_string()).await;
    let config = common::test_config(primary, fallback);
    let (service, _shutdown) = service_with(&config);

    let result = service.resolve(code("USD"), false).await;
    assert_eq!(result.provenance, Provenance::ErrorStaticFallback);
    assert!(!result.table.is_empty());
}

#[tokio::test]
async fn test_attempts_respect_minimum_spacing() {
    let attempt_times = Arc::new(Mutex::new(Vec::new()));

    let t = attempt_times.clone();
    let primary = common::start_provider(move || {
        t.lock().unwrap().push(Instant::now());
        async move { (500, "down".to_string()) }
    })
    .await;
    let t = attempt_times.clone();
    let fallback = common::start_provider(move || {
        t.lock().unwrap().push(Instant::now());
        async move { (500, "down".to_string()) }
    })
    .await;

    let mut config = common::test_config(primary, fallback);
    config.rate_limit.min_interval_ms = 300;
    let (service, _shutdown) = service_with(&config);

    service.resolve(code("USD"), false).await;

    let times = attempt_times.lock().unwrap();
    assert_eq!(times.len(), 2, "one round across two endpoints");
    assert!(
        times[1].duration_since(times[0]) >= Duration::from_millis(290),
        "attempts must be spaced by the rate limiter"
    );
}

#[tokio::test]
async fn test_debounce_collapses_burst_to_last_request() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let primary = common::start_provider(move || {
        let c = c.clone();
        async move {
            c.fetch_add(1, Ordering::SeqCst);
            (200, common::rates_body())
        }
    })
    .await;
    let fallback = common::start_fixed_provider(500, String::new()).await;
    let mut config = common::test_config(primary, fallback);
    config.debounce.quiet_period_ms = 150;
    let (service, _shutdown) = service_with(&config);

    for base in ["USD", "GBP", "JPY", "EUR"] {
        service.resolve_debounced(code(base), true);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1, "burst collapses to one fetch");
    assert_eq!(service.state().base, code("EUR"), "last trigger wins");
}

#[tokio::test]
async fn test_offline_replay_on_reconnect() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let primary = common::start_provider(move || {
        let c = c.clone();
        async move {
            c.fetch_add(1, Ordering::SeqCst);
            (200, common::rates_body())
        }
    })
    .await;
    let fallback = common::start_fixed_provider(500, String::new()).await;
    let config = common::test_config(primary, fallback);
    let (service, _shutdown) = service_with(&config);

    service.set_online(false);
    let result = service.resolve(code("USD"), false).await;
    assert_eq!(result.provenance, Provenance::StaticFallback);
    assert_eq!(calls.load(Ordering::SeqCst), 0, "offline never touches the network");

    service.set_online(true);
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1, "queued request replays once");
    let state = service.state();
    assert!(state.online);
    assert_eq!(state.provenance, Some(Provenance::Network));
    assert_eq!(state.rates.get(code("EUR")), Some(0.9));
}
