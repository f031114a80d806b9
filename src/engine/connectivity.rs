//! Connectivity transitions, offline replay and request debouncing.
//!
//! One background task owns all deferred work:
//! - Debounce: a burst of triggers collapses to the last one, which fires
//!   after a quiet period with no further triggers. Superseded triggers are
//!   never executed.
//! - Replay: when connectivity returns, requests that arrived while offline
//!   are re-resolved in FIFO order, then the last-known base gets a forced
//!   refresh if the replay did not already cover it.
//!
//! The task exits on shutdown or when the service side hangs up.

use crate::engine::service::ServiceCore;
use crate::rates::table::CurrencyCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};

/// One deferred resolution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolveRequest {
    pub base: CurrencyCode,
    pub force_refresh: bool,
}

/// Background loop driving debounced resolution and offline replay.
pub(crate) struct EngineDriver {
    core: Arc<ServiceCore>,
    trigger_rx: mpsc::UnboundedReceiver<ResolveRequest>,
    online_rx: watch::Receiver<bool>,
    quiet_period: Duration,
}

impl EngineDriver {
    pub(crate) fn new(
        core: Arc<ServiceCore>,
        trigger_rx: mpsc::UnboundedReceiver<ResolveRequest>,
        online_rx: watch::Receiver<bool>,
        quiet_period: Duration,
    ) -> Self {
        Self {
            core,
            trigger_rx,
            online_rx,
            quiet_period,
        }
    }

    pub(crate) async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::debug!(quiet_period_ms = self.quiet_period.as_millis() as u64, "engine driver started");
        let mut pending: Option<ResolveRequest> = None;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::debug!("engine driver received shutdown signal");
                    break;
                }
                changed = self.online_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let online = *self.online_rx.borrow();
                    tracing::info!(online, "connectivity changed");
                    self.core.publish_online(online);
                    if online {
                        self.replay_offline_requests().await;
                    }
                }
                trigger = self.trigger_rx.recv() => {
                    match trigger {
                        // Supersedes any earlier pending trigger; the quiet
                        // period restarts from now.
                        Some(request) => pending = Some(request),
                        None => break,
                    }
                }
                _ = tokio::time::sleep(self.quiet_period), if pending.is_some() => {
                    let request = pending.take().expect("guarded by is_some");
                    tracing::debug!(base = %request.base, "debounce quiet period elapsed");
                    self.core.resolve_now(request.base, request.force_refresh).await;
                }
            }
        }
    }

    /// Drain the offline queue in FIFO order, then force-refresh the
    /// last-known base unless the replay already covered it.
    async fn replay_offline_requests(&self) {
        let mut replayed: Vec<CurrencyCode> = Vec::new();

        while let Some(request) = self.core.pop_offline_request() {
            tracing::info!(base = %request.base, "replaying request queued while offline");
            self.core.resolve_now(request.base, true).await;
            replayed.push(request.base);
        }

        if let Some(base) = self.core.last_base() {
            if !replayed.contains(&base) {
                tracing::info!(base = %base, "connectivity restored, forcing re-resolution");
                self.core.resolve_now(base, true).await;
            }
        }
    }
}
