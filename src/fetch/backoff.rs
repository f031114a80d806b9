//! Linear inter-round backoff.

use std::time::Duration;

/// Delay to sleep after exhausting every endpoint in `round`.
///
/// Linear in the round index: round 1 → base, round 2 → 2×base, and so on.
/// No jitter; the global rate limiter already spaces individual attempts.
pub fn round_delay(round: u32, base: Duration) -> Duration {
    base * round
}
