//! Resolution engine and its observable state.
//!
//! # Data Flow
//! ```text
//! caller / debounced trigger
//!     → service.rs (facade: resolve, convert, metrics, clear_cache)
//!         → resolver.rs (cache → connectivity → pipeline → fallback chain)
//!         → state.rs (merge + snapshot + notify subscribers)
//!     → connectivity.rs (debounce loop, offline replay on reconnect)
//! ```

pub mod connectivity;
pub mod resolver;
pub mod service;
pub mod state;

pub use resolver::ResolutionEngine;
pub use service::RateService;
pub use state::{EngineState, StateBroadcaster, StateUpdate, Subscription};
