//! Token-bucket admission control.
//!
//! One bucket for the whole process, not per category: the upstream's
//! courtesy limit applies to the caller as a whole, so partitioning the
//! budget would let hot categories exceed it in aggregate.
//!
//! Tokens are fractional and accrue continuously; only the "at least one
//! full token" check is integral. The bucket never waits more than once
//! per acquisition: under sustained overload, callers fail with
//! [`JaburuError::RateLimited`] instead of piling up in a queue.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use crate::telemetry;
use crate::{JaburuError, Result};

/// Configuration for the rate limiter.
///
/// Deserialized from the `[rate_limit]` config section, or built in code:
///
/// ```rust
/// # use jaburu::resilience::RateLimitSettings;
/// let settings = RateLimitSettings::new()
///     .requests_per_minute(100.0)
///     .burst(20);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Whether rate limiting is active. Disabled: `acquire` always
    /// grants immediately. Default: true.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Sustained throughput bound. Default: 100.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: f64,
    /// Burst bound — the bucket's token cap. Default: 20.
    #[serde(default = "default_burst")]
    pub burst: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: default_requests_per_minute(),
            burst: default_burst(),
        }
    }
}

impl RateLimitSettings {
    /// Create settings with the defaults (100/min, burst 20).
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable rate limiting (every `acquire` grants immediately).
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set the sustained per-minute rate.
    pub fn requests_per_minute(mut self, rate: f64) -> Self {
        self.requests_per_minute = rate;
        self
    }

    /// Set the burst cap.
    pub fn burst(mut self, burst: u32) -> Self {
        self.burst = burst;
        self
    }

    fn refill_per_second(&self) -> f64 {
        self.requests_per_minute / 60.0
    }
}

fn default_enabled() -> bool {
    true
}

fn default_requests_per_minute() -> f64 {
    100.0
}

fn default_burst() -> u32 {
    20
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    /// Accrue tokens for the elapsed wall-clock time, clamped to the cap.
    fn refill(&mut self, max_tokens: f64, refill_per_second: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_per_second).min(max_tokens);
        self.last_refill = now;
    }
}

/// Process-wide token bucket.
///
/// Invariant: `0 ≤ tokens ≤ max_tokens` at every observation point.
/// Tokens increase only via time-proportional refill and decrease only by
/// exactly 1 per granted acquisition. The state lock is released before
/// the bounded wait so concurrent callers keep draining and refilling.
pub struct TokenBucket {
    enabled: bool,
    max_tokens: f64,
    refill_per_second: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Build a full bucket from settings.
    pub fn new(settings: &RateLimitSettings) -> Self {
        Self {
            enabled: settings.enabled,
            max_tokens: f64::from(settings.burst),
            refill_per_second: settings.refill_per_second(),
            state: Mutex::new(BucketState {
                tokens: f64::from(settings.burst),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Acquire one token.
    ///
    /// Grants immediately when a full token is available. Otherwise waits
    /// exactly long enough for one token to accrue, re-checks once, and
    /// fails with [`JaburuError::RateLimited`] if concurrent callers
    /// drained the refill in the meantime — a single bounded wait, never
    /// a retry loop.
    pub async fn acquire(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let wait = {
            let mut state = self.state.lock().await;
            state.refill(self.max_tokens, self.refill_per_second);
            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                return Ok(());
            }
            // Padded a millisecond so nanosecond rounding of the sleep
            // cannot leave the refill a hair under one full token.
            Duration::from_secs_f64((1.0 - state.tokens) / self.refill_per_second)
                + Duration::from_millis(1)
        };

        tokio::time::sleep(wait).await;

        let mut state = self.state.lock().await;
        state.refill(self.max_tokens, self.refill_per_second);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            return Ok(());
        }

        metrics::counter!(telemetry::RATE_LIMITED_TOTAL).increment(1);
        warn!(
            waited_ms = wait.as_millis() as u64,
            "rate limit exhausted after bounded wait"
        );
        Err(JaburuError::RateLimited { waited: wait })
    }

    /// Current token count after refill, for observability.
    ///
    /// A disabled bucket reports its cap.
    pub async fn available(&self) -> f64 {
        if !self.enabled {
            return self.max_tokens;
        }
        let mut state = self.state.lock().await;
        state.refill(self.max_tokens, self.refill_per_second);
        state.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn refill_clamps_at_cap() {
        let mut state = BucketState {
            tokens: 19.5,
            last_refill: Instant::now(),
        };
        tokio::time::advance(Duration::from_secs(3600)).await;
        state.refill(20.0, 100.0 / 60.0);
        assert_eq!(state.tokens, 20.0);
    }

    #[tokio::test(start_paused = true)]
    async fn refill_is_time_proportional() {
        let mut state = BucketState {
            tokens: 0.0,
            last_refill: Instant::now(),
        };
        tokio::time::advance(Duration::from_secs(6)).await;
        state.refill(20.0, 0.5);
        assert!((state.tokens - 3.0).abs() < 1e-9);
    }

    #[test]
    fn settings_refill_rate_from_per_minute() {
        let settings = RateLimitSettings::new().requests_per_minute(100.0);
        assert!((settings.refill_per_second() - 1.666_7).abs() < 0.001);
    }
}
