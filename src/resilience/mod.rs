//! Resilience primitives guarding the upstream API.
//!
//! Two independent gates sit between a cache miss and the network:
//!
//! - [`TokenBucket`] — admission control. Tokens accrue continuously up
//!   to a burst cap; each admitted request consumes exactly one. A caller
//!   with no token waits once, for exactly as long as one token takes to
//!   accrue, then either proceeds or fails — bounded wait, no queue.
//!
//! - [`CircuitBreaker`] — failure isolation. Consecutive upstream
//!   failures trip the breaker open; while open, calls fail fast without
//!   touching the network. After a reset window the next call probes the
//!   upstream (half-open), and sustained success closes the breaker
//!   again.
//!
//! Both are process-wide singletons shared by every in-flight pipeline
//! call. Each owns its state behind a lock that is never held across a
//! suspension point, so mutations interleave but never overlap.

mod breaker;
mod rate_limit;

pub use breaker::{BreakerSettings, BreakerSnapshot, BreakerState, CircuitBreaker};
pub use rate_limit::{RateLimitSettings, TokenBucket};
