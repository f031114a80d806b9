//! Outbound request throttling.
//!
//! One global limiter is shared by every fetch attempt; it enforces a
//! minimum spacing between the starts of consecutive acquired windows.
//! Waiters suspend cooperatively and resume in FIFO lock order.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval limiter for outbound network attempts.
pub struct RateLimiter {
    min_interval: Duration,
    /// Start of the most recently acquired window.
    last_window: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_window: Mutex::new(None),
        }
    }

    /// Suspend until at least `min_interval` has elapsed since the start of
    /// the previous acquired window, then claim a new window.
    ///
    /// The sleep happens while holding the lock, so queued waiters are
    /// released one window at a time in arrival order.
    pub async fn acquire(&self) {
        let mut last = self.last_window.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
