//! Engine lifecycle management.
//!
//! Startup order: config → store → service (which spawns the debounce and
//! replay driver). Shutdown broadcasts once; the driver drains and exits,
//! leaving no outstanding timers.

pub mod shutdown;

pub use shutdown::Shutdown;
