//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine subsystems produce:
//!     → tracing macros (structured log events, inline at call sites)
//!     → metrics.rs (request counters, latency, hit rate)
//!
//! Consumers:
//!     → Log output (stdout via tracing-subscriber, see logging.rs)
//!     → MetricsSnapshot (pull-based, exposed through the service facade)
//!     → `metrics` facade (whatever recorder the host installs)
//! ```

pub mod logging;
pub mod metrics;

pub use metrics::{MetricsCollector, MetricsSnapshot};
