//! Resilient currency exchange-rate resolution engine.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌───────────────────────────────────────────────┐
//!                       │                RATE ENGINE                    │
//!                       │                                               │
//!   resolve(base) ──────┼─▶ service ──▶ resolver ──▶ cache (TTL)        │
//!                       │      │           │                            │
//!                       │      │           ├─▶ fetch pipeline           │
//!                       │      │           │     rate limit · retry ·   │
//!                       │      │           │     timeout · validation   │
//!                       │      │           └─▶ fallback chain           │
//!                       │      │                 stale cache → static   │
//!                       │      ▼                                        │
//!   subscribe() ◀───────┼── state broadcaster (loading/rates/warning)   │
//!                       │                                               │
//!                       │  Cross-cutting: config · observability ·      │
//!                       │  lifecycle · connectivity/debounce            │
//!                       └───────────────────────────────────────────────┘
//! ```
//!
//! The engine's central guarantee: resolution never fails. Every request
//! yields a usable rate table tagged with the fallback tier that produced it
//! (`network`, `cache`, `offline_cache`, `static_fallback`,
//! `error_cache_fallback`, `error_static_fallback`) plus an optional warning.

// Core subsystems
pub mod cache;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod rates;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use cache::{CacheStats, FileStore, KvStore, MemoryStore, RateCache};
pub use config::EngineConfig;
pub use engine::{EngineState, RateService, Subscription};
pub use fetch::FetchError;
pub use lifecycle::Shutdown;
pub use observability::MetricsSnapshot;
pub use rates::{Conversion, CurrencyCode, CurrencyError, Provenance, RateTable, ResolutionResult};
