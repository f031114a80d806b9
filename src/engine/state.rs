//! Observable engine state.
//!
//! A single canonical [`EngineState`] lives behind a mutex. Every mutation
//! is a whole-state merge followed by a snapshot; subscribers only ever see
//! complete states, never a half-applied update. The lock is released before
//! callbacks run, so a callback may re-enter (subscribe, unsubscribe, read
//! state) without deadlocking.

use crate::rates::table::{CurrencyCode, Provenance, RateTable};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Canonical mutable state consumed by the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct EngineState {
    /// A resolution is in flight.
    pub loading: bool,
    /// Degradation notice from the most recent resolution, if any.
    pub error: Option<String>,
    /// Base currency of the current table.
    pub base: CurrencyCode,
    /// Current rate table; empty until the first resolution lands.
    pub rates: RateTable,
    /// When the current table was produced, unix milliseconds.
    pub last_update: Option<u64>,
    /// Last known connectivity.
    pub online: bool,
    /// Which fallback tier produced the current table.
    pub provenance: Option<Provenance>,
}

impl EngineState {
    pub fn initial(base: CurrencyCode) -> Self {
        Self {
            loading: false,
            error: None,
            base,
            rates: RateTable::new(),
            last_update: None,
            online: true,
            provenance: None,
        }
    }
}

/// A partial state change; `None` fields are left untouched by the merge.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub loading: Option<bool>,
    /// `Some(None)` clears the error, `Some(Some(_))` sets it.
    pub error: Option<Option<String>>,
    pub base: Option<CurrencyCode>,
    pub rates: Option<RateTable>,
    pub last_update: Option<u64>,
    pub online: Option<bool>,
    pub provenance: Option<Option<Provenance>>,
}

type Callback = Arc<dyn Fn(&EngineState) + Send + Sync>;

/// Holds the canonical state and notifies subscribers on each mutation.
pub struct StateBroadcaster {
    state: Mutex<EngineState>,
    subscribers: Mutex<Vec<(u64, Callback)>>,
    next_id: AtomicU64,
}

impl StateBroadcaster {
    pub fn new(initial: EngineState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(initial),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Merge `update` into the state and notify every subscriber with the
    /// resulting snapshot, in subscription order.
    ///
    /// The callback list is snapshotted before the first invocation:
    /// unsubscribing mid-round does not affect callbacks already scheduled
    /// for that round.
    pub fn update(&self, update: StateUpdate) {
        let snapshot = {
            let mut state = self.state.lock().expect("state mutex poisoned");
            if let Some(loading) = update.loading {
                state.loading = loading;
            }
            if let Some(error) = update.error {
                state.error = error;
            }
            if let Some(base) = update.base {
                state.base = base;
            }
            if let Some(rates) = update.rates {
                state.rates = rates;
            }
            if let Some(last_update) = update.last_update {
                state.last_update = Some(last_update);
            }
            if let Some(online) = update.online {
                state.online = online;
            }
            if let Some(provenance) = update.provenance {
                state.provenance = provenance;
            }
            state.clone()
        };

        let callbacks: Vec<Callback> = {
            let subscribers = self.subscribers.lock().expect("subscriber mutex poisoned");
            subscribers.iter().map(|(_, cb)| cb.clone()).collect()
        };

        for callback in callbacks {
            callback(&snapshot);
        }
    }

    /// Current state snapshot.
    pub fn current(&self) -> EngineState {
        self.state.lock().expect("state mutex poisoned").clone()
    }

    /// Register a callback invoked on every state change.
    ///
    /// Dropping the returned handle (or calling `unsubscribe`) removes it.
    pub fn subscribe(
        self: &Arc<Self>,
        callback: impl Fn(&EngineState) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .expect("subscriber mutex poisoned")
            .push((id, Arc::new(callback)));
        Subscription {
            id,
            broadcaster: Arc::downgrade(self),
        }
    }

    fn remove_subscriber(&self, id: u64) {
        self.subscribers
            .lock()
            .expect("subscriber mutex poisoned")
            .retain(|(sub_id, _)| *sub_id != id);
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

/// Typed unsubscribe handle for one registered callback.
pub struct Subscription {
    id: u64,
    broadcaster: Weak<StateBroadcaster>,
}

impl Subscription {
    /// Remove the callback now. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(broadcaster) = self.broadcaster.upgrade() {
            broadcaster.remove_subscriber(self.id);
        }
    }
}
