//! Presentation-facing service facade.
//!
//! The complete surface a consumer may call: subscribe, resolve (direct or
//! debounced), convert, metrics, cache maintenance, connectivity. The
//! service owns its collaborators by construction — no global singletons —
//! and its background driver exits on the shared shutdown signal.

use crate::cache::rate_cache::{CacheStats, RateCache};
use crate::cache::store::KvStore;
use crate::config::schema::EngineConfig;
use crate::engine::connectivity::{EngineDriver, ResolveRequest};
use crate::engine::resolver::ResolutionEngine;
use crate::engine::state::{EngineState, StateBroadcaster, StateUpdate, Subscription};
use crate::fetch::pipeline::FetchPipeline;
use crate::fetch::rate_limit::RateLimiter;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics::{MetricsCollector, MetricsSnapshot};
use crate::rates::convert::{convert, Conversion};
use crate::rates::table::{CurrencyCode, ResolutionResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Shared internals: everything the facade and the background driver both
/// need.
pub(crate) struct ServiceCore {
    engine: ResolutionEngine,
    broadcaster: Arc<StateBroadcaster>,
    cache: RateCache,
    metrics: Arc<MetricsCollector>,
    online_rx: watch::Receiver<bool>,
    /// Requests that arrived while offline, awaiting FIFO replay.
    offline_queue: Mutex<VecDeque<ResolveRequest>>,
    /// Base of the most recent resolution, for forced refresh on reconnect.
    last_base: Mutex<Option<CurrencyCode>>,
}

impl ServiceCore {
    /// Run one full resolution: loading state → engine → final state.
    ///
    /// Requests made while offline are additionally queued for replay once
    /// connectivity returns; the immediate answer still comes from the
    /// engine's offline tiers.
    pub(crate) async fn resolve_now(
        &self,
        base: CurrencyCode,
        force_refresh: bool,
    ) -> ResolutionResult {
        *self.last_base.lock().expect("last base mutex poisoned") = Some(base);

        if !*self.online_rx.borrow() {
            self.queue_offline_request(base);
        }

        self.broadcaster.update(StateUpdate {
            loading: Some(true),
            error: Some(None),
            base: Some(base),
            ..Default::default()
        });

        let result = self.engine.resolve(base, force_refresh).await;

        self.broadcaster.update(StateUpdate {
            loading: Some(false),
            error: Some(result.warning.clone()),
            base: Some(base),
            rates: Some(result.table.clone()),
            last_update: Some(result.fetched_at),
            provenance: Some(Some(result.provenance)),
            ..Default::default()
        });

        result
    }

    fn queue_offline_request(&self, base: CurrencyCode) {
        let mut queue = self.offline_queue.lock().expect("offline queue mutex poisoned");
        if queue.iter().all(|r| r.base != base) {
            queue.push_back(ResolveRequest {
                base,
                force_refresh: true,
            });
            tracing::debug!(base = %base, queued = queue.len(), "queued request for replay after reconnect");
        }
    }

    pub(crate) fn pop_offline_request(&self) -> Option<ResolveRequest> {
        self.offline_queue
            .lock()
            .expect("offline queue mutex poisoned")
            .pop_front()
    }

    pub(crate) fn last_base(&self) -> Option<CurrencyCode> {
        *self.last_base.lock().expect("last base mutex poisoned")
    }

    pub(crate) fn publish_online(&self, online: bool) {
        self.broadcaster.update(StateUpdate {
            online: Some(online),
            ..Default::default()
        });
    }
}

/// The engine's public entry point.
///
/// Construct one per session inside a tokio runtime; the constructor spawns
/// the debounce/replay driver, which stops when `shutdown` triggers.
pub struct RateService {
    core: Arc<ServiceCore>,
    online_tx: watch::Sender<bool>,
    trigger_tx: mpsc::UnboundedSender<ResolveRequest>,
}

impl RateService {
    pub fn new(
        config: &EngineConfig,
        store: Arc<dyn KvStore>,
        initial_base: CurrencyCode,
        shutdown: &Shutdown,
    ) -> Self {
        let metrics = Arc::new(MetricsCollector::new());
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
            config.rate_limit.min_interval_ms,
        )));
        let cache = RateCache::new(store, Duration::from_secs(config.cache.ttl_secs));
        let pipeline = FetchPipeline::new(
            config.providers.endpoints(),
            limiter,
            config.retry.max_rounds,
            Duration::from_secs(config.timeouts.request_secs),
            Duration::from_millis(config.retry.backoff_base_ms),
        );

        let (online_tx, online_rx) = watch::channel(true);
        let engine = ResolutionEngine::new(
            cache.clone(),
            pipeline,
            metrics.clone(),
            online_rx.clone(),
        );
        let broadcaster = StateBroadcaster::new(EngineState::initial(initial_base));

        let core = Arc::new(ServiceCore {
            engine,
            broadcaster,
            cache,
            metrics,
            online_rx: online_rx.clone(),
            offline_queue: Mutex::new(VecDeque::new()),
            last_base: Mutex::new(None),
        });

        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let driver = EngineDriver::new(
            core.clone(),
            trigger_rx,
            online_rx,
            Duration::from_millis(config.debounce.quiet_period_ms),
        );
        tokio::spawn(driver.run(shutdown.subscribe()));

        Self {
            core,
            online_tx,
            trigger_tx,
        }
    }

    /// Register a state observer. Dropping the handle unsubscribes.
    pub fn subscribe(
        &self,
        callback: impl Fn(&EngineState) + Send + Sync + 'static,
    ) -> Subscription {
        self.core.broadcaster.subscribe(callback)
    }

    /// Current state snapshot.
    pub fn state(&self) -> EngineState {
        self.core.broadcaster.current()
    }

    /// Resolve rates for `base` immediately, updating observable state.
    /// Never fails; degradation arrives as provenance + warning.
    pub async fn resolve(&self, base: CurrencyCode, force_refresh: bool) -> ResolutionResult {
        self.core.resolve_now(base, force_refresh).await
    }

    /// Request a resolution after the debounce quiet period. A burst of
    /// calls collapses to the most recent one.
    pub fn resolve_debounced(&self, base: CurrencyCode, force_refresh: bool) {
        let _ = self.trigger_tx.send(ResolveRequest {
            base,
            force_refresh,
        });
    }

    /// Convert against the current state's table. Conversions that default
    /// a missing code to the identity rate are counted as a warning metric.
    pub fn convert(&self, amount: f64, from: CurrencyCode, to: CurrencyCode) -> Conversion {
        let state = self.core.broadcaster.current();
        let conversion = convert(amount, from, to, state.base, &state.rates);
        if conversion.used_identity_fallback {
            self.core.metrics.record_identity_fallback();
            tracing::warn!(
                from = %from,
                to = %to,
                base = %state.base,
                "conversion defaulted a missing currency to rate 1.0"
            );
        }
        conversion
    }

    /// Report the host's connectivity signal. Transitions to online trigger
    /// replay of offline-queued requests.
    pub fn set_online(&self, online: bool) {
        let _ = self.online_tx.send(online);
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.core.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.core.metrics.reset();
    }

    pub fn clear_cache(&self) {
        self.core.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.core.cache.stats()
    }
}
