//! Upstream fetch subsystem.
//!
//! # Data Flow
//! ```text
//! ResolutionEngine
//!     → pipeline.rs (endpoint ordering, rounds, validation)
//!         → rate_limit.rs (global min spacing between attempts)
//!         → backoff.rs (inter-round delay)
//!         → reqwest (HTTP transport, bounded by per-attempt timeout)
//! ```
//!
//! The pipeline is transport + validation + retry only; it never touches the
//! cache and never decides fallback policy.

pub mod backoff;
pub mod error;
pub mod pipeline;
pub mod rate_limit;

pub use error::FetchError;
pub use pipeline::FetchPipeline;
pub use rate_limit::RateLimiter;
