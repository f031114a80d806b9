//! Multi-endpoint fetch pipeline with retry.
//!
//! # Responsibilities
//! - Try each configured endpoint in order, primary first
//! - Bound every attempt with a fixed timeout
//! - Validate and normalize provider responses
//! - Back off linearly between rounds, fail with the last observed error
//!
//! The attempt schedule is an explicit state machine ([`AttemptPlan`]) so
//! ordering and termination are testable without any network.

use crate::fetch::backoff;
use crate::fetch::error::FetchError;
use crate::fetch::rate_limit::RateLimiter;
use crate::rates::table::{CurrencyCode, RateTable};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// One step of the retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Try endpoint `endpoint` (index into the ordered list) in `round`.
    Attempt { round: u32, endpoint: usize },
    /// Every endpoint in `after_round` failed; sleep before the next round.
    Backoff { after_round: u32 },
}

/// Iterates rounds × endpoints: all endpoints of round 1 in order, a backoff
/// step, all endpoints of round 2, and so on. Terminates after the last
/// endpoint of the last round with no trailing backoff.
#[derive(Debug)]
pub(crate) struct AttemptPlan {
    max_rounds: u32,
    endpoint_count: usize,
    round: u32,
    endpoint: usize,
}

impl AttemptPlan {
    pub(crate) fn new(max_rounds: u32, endpoint_count: usize) -> Self {
        Self {
            max_rounds,
            endpoint_count,
            round: 1,
            endpoint: 0,
        }
    }

    pub(crate) fn next(&mut self) -> Option<Step> {
        if self.endpoint_count == 0 || self.round > self.max_rounds {
            return None;
        }

        if self.endpoint < self.endpoint_count {
            let step = Step::Attempt {
                round: self.round,
                endpoint: self.endpoint,
            };
            self.endpoint += 1;
            return Some(step);
        }

        let finished = self.round;
        self.round += 1;
        self.endpoint = 0;
        if self.round > self.max_rounds {
            None
        } else {
            Some(Step::Backoff {
                after_round: finished,
            })
        }
    }
}

/// Fetches a rate table from an ordered list of provider endpoints.
///
/// Purely transport + validation + retry: no caching, no fallback policy.
#[derive(Clone)]
pub struct FetchPipeline {
    client: reqwest::Client,
    /// Base URLs, primary first; `{BASE}` is appended as a path segment.
    endpoints: Vec<String>,
    limiter: Arc<RateLimiter>,
    max_rounds: u32,
    attempt_timeout: Duration,
    backoff_base: Duration,
}

impl FetchPipeline {
    pub fn new(
        endpoints: Vec<String>,
        limiter: Arc<RateLimiter>,
        max_rounds: u32,
        attempt_timeout: Duration,
        backoff_base: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
            limiter,
            max_rounds,
            attempt_timeout,
            backoff_base,
        }
    }

    /// Fetch rates for `base`, walking endpoints and rounds until the first
    /// success. Exhaustion fails with the last observed error.
    pub async fn fetch(&self, base: CurrencyCode) -> Result<RateTable, FetchError> {
        let mut plan = AttemptPlan::new(self.max_rounds, self.endpoints.len());
        let mut last_error = FetchError::NoEndpoints;

        while let Some(step) = plan.next() {
            match step {
                Step::Backoff { after_round } => {
                    let delay = backoff::round_delay(after_round, self.backoff_base);
                    tracing::debug!(
                        round = after_round,
                        delay_ms = delay.as_millis() as u64,
                        "round exhausted, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Step::Attempt { round, endpoint } => {
                    let url = endpoint_url(&self.endpoints[endpoint], base);
                    self.limiter.acquire().await;

                    let attempt = self.attempt(&url);
                    let result = match timeout(self.attempt_timeout, attempt).await {
                        Ok(result) => result,
                        Err(_) => Err(FetchError::Timeout(self.attempt_timeout)),
                    };

                    match result {
                        Ok(table) => {
                            tracing::debug!(base = %base, endpoint = %url, round, "rates fetched");
                            return Ok(table);
                        }
                        Err(e) => {
                            tracing::warn!(
                                base = %base,
                                endpoint = %url,
                                round,
                                error = %e,
                                "rate fetch attempt failed"
                            );
                            last_error = e;
                        }
                    }
                }
            }
        }

        Err(last_error)
    }

    async fn attempt(&self, url: &str) -> Result<RateTable, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FetchError::Validation(format!("body is not JSON: {e}")))?;

        parse_rate_table(&body)
    }
}

fn endpoint_url(endpoint: &str, base: CurrencyCode) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), base)
}

/// Extract a normalized table from a provider body.
///
/// Two shapes are accepted: `{"rates": {...}}` and
/// `{"conversion_rates": {...}}`. Anything else is a validation failure, as
/// is a table that filters down to empty.
fn parse_rate_table(body: &serde_json::Value) -> Result<RateTable, FetchError> {
    let field = ["rates", "conversion_rates"]
        .iter()
        .find_map(|name| body.get(*name).and_then(|v| v.as_object()))
        .ok_or_else(|| {
            FetchError::Validation("no 'rates' or 'conversion_rates' object in body".to_string())
        })?;

    let mut raw = HashMap::with_capacity(field.len());
    for (code, value) in field {
        if let Some(rate) = value.as_f64() {
            raw.insert(code.clone(), rate);
        }
    }

    let table = RateTable::from_raw(raw);
    if table.is_empty() {
        return Err(FetchError::Validation(
            "rate table contained no usable entries".to_string(),
        ));
    }
    Ok(table)
}
