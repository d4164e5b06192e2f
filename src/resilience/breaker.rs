//! Three-state circuit breaker around upstream calls.
//!
//! One breaker guards all endpoints uniformly: the upstream is a single
//! service, and when it degrades it degrades as a whole. Repeated
//! failures trip the breaker open so the process stops spending
//! connections and latency on a dead dependency; a timed half-open probe
//! discovers recovery without any external signal.
//!
//! The breaker never masks errors. A rejected call fails with
//! [`JaburuError::BreakerOpen`] before the wrapped future is polled; an
//! admitted call's own error is returned unchanged after being counted.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::telemetry;
use crate::{JaburuError, Result};

/// Consecutive half-open successes required to close the breaker.
const SUCCESS_THRESHOLD: u32 = 3;

/// Configuration for the circuit breaker.
///
/// Deserialized from the `[circuit_breaker]` config section, or built in
/// code:
///
/// ```rust
/// # use jaburu::resilience::BreakerSettings;
/// # use std::time::Duration;
/// let settings = BreakerSettings::new()
///     .failure_threshold(5)
///     .reset_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerSettings {
    /// Whether the breaker is active. Disabled: `execute` is a pure
    /// passthrough with no accounting. Default: true.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Consecutive failures that trip the breaker open. Default: 5.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// How long the breaker stays open before the next call may probe.
    /// Default: 30.
    #[serde(default = "default_reset_timeout_secs")]
    pub reset_timeout_secs: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: default_failure_threshold(),
            reset_timeout_secs: default_reset_timeout_secs(),
        }
    }
}

impl BreakerSettings {
    /// Create settings with the defaults (threshold 5, reset 30s).
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable the breaker (pure passthrough).
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set the consecutive-failure threshold.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the open-state reset window.
    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout_secs = timeout.as_secs();
        self
    }
}

fn default_enabled() -> bool {
    true
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout_secs() -> u64 {
    30
}

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation — all calls pass through.
    Closed,
    /// Failing fast — calls are rejected without touching the network.
    Open,
    /// Probing recovery — calls pass through on limited trust.
    HalfOpen,
}

impl BreakerState {
    fn as_str(self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

/// Counter snapshot for observability.
#[derive(Debug, Clone, Copy)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
}

struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    last_failure_at: Option<Instant>,
}

impl BreakerInner {
    fn transition(&mut self, to: BreakerState) {
        metrics::counter!(telemetry::BREAKER_TRANSITIONS_TOTAL, "state" => to.as_str())
            .increment(1);
        match to {
            BreakerState::Open => warn!(
                failures = self.consecutive_failures,
                "circuit breaker opened"
            ),
            BreakerState::HalfOpen => info!("circuit breaker half-open, probing upstream"),
            BreakerState::Closed => info!("circuit breaker closed"),
        }
        self.state = to;
    }
}

/// Process-wide circuit breaker.
///
/// State lives behind a synchronous mutex that is taken twice per call —
/// once for admission, once to record the outcome — and never held across
/// the awaited upstream call.
pub struct CircuitBreaker {
    enabled: bool,
    failure_threshold: u32,
    reset_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Build a closed breaker from settings.
    pub fn new(settings: &BreakerSettings) -> Self {
        Self {
            enabled: settings.enabled,
            failure_threshold: settings.failure_threshold,
            reset_timeout: Duration::from_secs(settings.reset_timeout_secs),
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                consecutive_successes: 0,
                last_failure_at: None,
            }),
        }
    }

    /// Run `fut` under the breaker.
    ///
    /// While open and inside the reset window, fails with
    /// [`JaburuError::BreakerOpen`] without polling `fut` at all. Once
    /// the window elapses the next call transitions to half-open and
    /// probes. The call's own error is returned unchanged on failure —
    /// the breaker only decides whether to attempt the call.
    pub async fn execute<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if !self.enabled {
            return fut.await;
        }
        self.admit()?;
        match fut.await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(err)
            }
        }
    }

    /// Current state (admission-time decay from Open to HalfOpen is not
    /// applied here — only an actual call attempt transitions).
    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    /// Counter snapshot for observability.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            consecutive_successes: inner.consecutive_successes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        // No code path panics while holding the lock.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn admit(&self) -> Result<()> {
        let mut inner = self.lock();
        if inner.state == BreakerState::Open {
            let elapsed = inner
                .last_failure_at
                .map(|at| at.elapsed())
                .unwrap_or(self.reset_timeout);
            if elapsed < self.reset_timeout {
                metrics::counter!(telemetry::BREAKER_REJECTIONS_TOTAL).increment(1);
                return Err(JaburuError::BreakerOpen {
                    retry_in: self.reset_timeout - elapsed,
                });
            }
            inner.transition(BreakerState::HalfOpen);
        }
        Ok(())
    }

    fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            // Success fully forgives prior failures rather than decaying them.
            BreakerState::Closed => inner.consecutive_failures = 0,
            BreakerState::HalfOpen => {
                inner.consecutive_successes += 1;
                if inner.consecutive_successes >= SUCCESS_THRESHOLD {
                    inner.consecutive_failures = 0;
                    inner.consecutive_successes = 0;
                    inner.transition(BreakerState::Closed);
                }
            }
            // A call admitted before the trip finished after it; the trip stands.
            BreakerState::Open => {}
        }
    }

    fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        inner.consecutive_successes = 0;
        inner.last_failure_at = Some(Instant::now());
        // Half-open failures accumulate toward the same threshold; the
        // counter is still primed from the trip, so one failure normally
        // reopens immediately.
        if inner.state != BreakerState::Open && inner.consecutive_failures >= self.failure_threshold
        {
            inner.transition(BreakerState::Open);
        }
    }
}
