//! Telemetry metric name constants.
//!
//! Centralised metric names for jaburu operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `jaburu_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `category` — cache category of the request (e.g. "deputados")
//! - `outcome` — pipeline outcome: "cache_hit", "upstream_success",
//!   "upstream_error", "rate_limited", "breaker_open"
//! - `state` — breaker state entered: "closed", "open", "half_open"

/// Total requests through the pipeline.
///
/// Labels: `category`, `outcome`.
pub const REQUESTS_TOTAL: &str = "jaburu_requests_total";

/// Upstream request duration in seconds (cache hits excluded).
///
/// Labels: `category`.
pub const REQUEST_DURATION_SECONDS: &str = "jaburu_request_duration_seconds";

/// Total cache hits.
///
/// Labels: `category`.
pub const CACHE_HITS_TOTAL: &str = "jaburu_cache_hits_total";

/// Total cache misses.
///
/// Labels: `category`.
pub const CACHE_MISSES_TOTAL: &str = "jaburu_cache_misses_total";

/// Total acquisitions rejected by the rate limiter.
pub const RATE_LIMITED_TOTAL: &str = "jaburu_rate_limited_total";

/// Total calls rejected fast by an open circuit breaker.
pub const BREAKER_REJECTIONS_TOTAL: &str = "jaburu_breaker_rejections_total";

/// Total circuit breaker state transitions.
///
/// Labels: `state` (the state entered).
pub const BREAKER_TRANSITIONS_TOTAL: &str = "jaburu_breaker_transitions_total";
