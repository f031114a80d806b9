//! Durable caching subsystem.
//!
//! # Data Flow
//! ```text
//! ResolutionEngine
//!     → rate_cache.rs (TTL + staleness policy, sweep, stats)
//!         → store.rs (string key/value persistence: memory or JSON file)
//! ```
//!
//! Store failures are never fatal: a read error is a cache miss, a write
//! error is a logged warning. The cache is an optimization tier, not a
//! source of truth.

pub mod rate_cache;
pub mod store;

pub use rate_cache::{CacheEntry, CacheStats, RateCache};
pub use store::{FileStore, KvStore, MemoryStore, StoreError};
