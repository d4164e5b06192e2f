//! Request pipeline composing cache, rate limiter, and circuit breaker
//! around the upstream call.
//!
//! Every tool handler goes through [`Pipeline::request`] (or
//! [`Pipeline::request_paginated`]); the pipeline is the only place the
//! three resilience pieces meet:
//!
//! ```text
//! request(category, endpoint, params)
//!         │
//!         ▼
//! ┌────────────────┐  hit
//! │   CacheStore   │ ─────► return immediately (no limiter, no breaker)
//! └───────┬────────┘
//!         │ miss
//!         ▼
//! ┌────────────────┐  no token after bounded wait
//! │  TokenBucket   │ ─────► RateLimited
//! └───────┬────────┘
//!         │ token
//!         ▼
//! ┌────────────────┐  open, window not elapsed
//! │ CircuitBreaker │ ─────► BreakerOpen
//! └───────┬────────┘
//!         │ admitted
//!         ▼
//!   CamaraClient::get ──► cache envelope, return payload
//! ```
//!
//! # Concurrent misses
//!
//! There is no in-flight request coalescing: two concurrent calls for the
//! same uncached key both miss, both take a token, and both hit the
//! upstream. Late arrivals re-fetch rather than attaching to the first
//! caller's outcome, so each caller sees its own error (or success)
//! rather than an inherited one.
//!
//! # Error policy
//!
//! The pipeline classifies but never swallows and never retries: every
//! failure reaches the caller typed, and retry policy belongs to the
//! caller. The one silent degradation is the cache itself — a value that
//! cannot be cached is simply not cached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheSettings, CacheStats, CacheStore};
use crate::client::{self, CamaraClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, Link};
use crate::config::Config;
use crate::resilience::{
    BreakerSettings, BreakerSnapshot, BreakerState, CircuitBreaker, RateLimitSettings, TokenBucket,
};
use crate::telemetry;
use crate::{JaburuError, Result};

/// Outcome tag for a completed pipeline call.
///
/// Used for metrics labels and logging only; derivable from the
/// pipeline's own control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    CacheHit,
    UpstreamSuccess,
    UpstreamError,
    RateLimited,
    BreakerOpen,
}

impl RequestOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestOutcome::CacheHit => "cache_hit",
            RequestOutcome::UpstreamSuccess => "upstream_success",
            RequestOutcome::UpstreamError => "upstream_error",
            RequestOutcome::RateLimited => "rate_limited",
            RequestOutcome::BreakerOpen => "breaker_open",
        }
    }
}

impl From<&JaburuError> for RequestOutcome {
    fn from(err: &JaburuError) -> Self {
        match err {
            JaburuError::RateLimited { .. } => RequestOutcome::RateLimited,
            JaburuError::BreakerOpen { .. } => RequestOutcome::BreakerOpen,
            _ => RequestOutcome::UpstreamError,
        }
    }
}

/// One page of a paginated listing: the `dados` payload plus the
/// envelope's pagination links. The links come from the same response —
/// no extra request is made for them.
#[derive(Debug, Clone)]
pub struct Page {
    pub dados: Arc<Value>,
    pub links: Vec<Link>,
}

/// Derive the deterministic cache key for a request.
///
/// Parameter pairs are sorted by key, then value, so semantically
/// identical parameter sets produce identical keys regardless of
/// construction order. The key stays human-readable (`endpoint?k=v&...`)
/// because it shows up in logs.
fn cache_key(endpoint: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return endpoint.to_owned();
    }
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();
    let query: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{}?{}", endpoint, query.join("&"))
}

/// The request pipeline. One instance per process, shared via `Arc` by
/// every tool handler.
pub struct Pipeline {
    client: CamaraClient,
    cache: CacheStore,
    limiter: TokenBucket,
    breaker: CircuitBreaker,
}

impl Pipeline {
    /// Create a builder with production defaults.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Build a pipeline straight from a loaded [`Config`].
    pub fn from_config(config: &Config) -> Self {
        Self::builder()
            .base_url(config.upstream.base_url.as_str())
            .timeout(config.upstream.timeout())
            .cache(config.cache.clone())
            .rate_limit(config.rate_limit.clone())
            .circuit_breaker(config.circuit_breaker.clone())
            .build()
    }

    /// Fetch an endpoint's `dados` payload, through cache and resilience.
    ///
    /// A cache hit returns immediately without touching the rate limiter
    /// or the circuit breaker. All failures are typed and propagate
    /// unchanged; nothing is retried here.
    pub async fn request(
        &self,
        category: &str,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<Arc<Value>> {
        let envelope = self.fetch(category, endpoint, params).await?;
        let dados = envelope.get("dados").cloned().unwrap_or(Value::Null);
        Ok(Arc::new(dados))
    }

    /// Like [`request`](Self::request), additionally surfacing the
    /// envelope's pagination links.
    ///
    /// Shares cache entries with `request`: the full envelope is cached
    /// under the same key, so either variant can serve the other's hit.
    pub async fn request_paginated(
        &self,
        category: &str,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<Page> {
        let envelope = self.fetch(category, endpoint, params).await?;
        let links = client::parse_links(&envelope, endpoint)?;
        let dados = envelope.get("dados").cloned().unwrap_or(Value::Null);
        Ok(Page {
            dados: Arc::new(dados),
            links,
        })
    }

    /// Cache-aside core shared by both request variants: returns the full
    /// upstream envelope, from cache or freshly fetched.
    async fn fetch(
        &self,
        category: &str,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<Arc<Value>> {
        let key = cache_key(endpoint, params);

        if let Some(envelope) = self.cache.get(category, &key) {
            debug!(category, key, "cache hit");
            record_outcome(category, RequestOutcome::CacheHit);
            return Ok(envelope);
        }
        debug!(category, key, "cache miss");

        let started = Instant::now();
        let result = self.guarded_get(endpoint, params).await;

        match result {
            Ok(body) => {
                let envelope = Arc::new(body);
                self.cache.set(category, &key, Arc::clone(&envelope), None);
                metrics::histogram!(
                    telemetry::REQUEST_DURATION_SECONDS,
                    "category" => category.to_owned(),
                )
                .record(started.elapsed().as_secs_f64());
                record_outcome(category, RequestOutcome::UpstreamSuccess);
                Ok(envelope)
            }
            Err(err) => {
                record_outcome(category, RequestOutcome::from(&err));
                Err(err)
            }
        }
    }

    /// Rate-limit acquisition followed by the breaker-guarded HTTP call.
    async fn guarded_get(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value> {
        self.limiter.acquire().await?;
        self.breaker.execute(self.client.get(endpoint, params)).await
    }

    /// Drop every cached entry in one category.
    pub fn invalidate(&self, category: &str) {
        self.cache.clear(Some(category));
    }

    /// Drop every cached entry in every category.
    pub fn invalidate_all(&self) {
        self.cache.clear(None);
    }

    /// Size/capacity snapshot for one cache category.
    pub fn cache_stats(&self, category: &str) -> Option<CacheStats> {
        self.cache.stats(category)
    }

    /// Current circuit breaker state.
    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    /// Full breaker counter snapshot.
    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }

    /// Tokens currently available in the rate limiter.
    pub async fn available_tokens(&self) -> f64 {
        self.limiter.available().await
    }
}

fn record_outcome(category: &str, outcome: RequestOutcome) {
    metrics::counter!(
        telemetry::REQUESTS_TOTAL,
        "category" => category.to_owned(),
        "outcome" => outcome.as_str(),
    )
    .increment(1);
}

/// Builder for configuring pipeline instances.
pub struct PipelineBuilder {
    base_url: String,
    timeout: Duration,
    cache: CacheSettings,
    rate_limit: RateLimitSettings,
    breaker: BreakerSettings,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            cache: CacheSettings::default(),
            rate_limit: RateLimitSettings::default(),
            breaker: BreakerSettings::default(),
        }
    }

    /// Point the pipeline at a different upstream (for testing with
    /// wiremock).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the upstream request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the cache settings.
    pub fn cache(mut self, settings: CacheSettings) -> Self {
        self.cache = settings;
        self
    }

    /// Replace the rate limiter settings.
    pub fn rate_limit(mut self, settings: RateLimitSettings) -> Self {
        self.rate_limit = settings;
        self
    }

    /// Replace the circuit breaker settings.
    pub fn circuit_breaker(mut self, settings: BreakerSettings) -> Self {
        self.breaker = settings;
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            client: CamaraClient::with_base_url(self.base_url, self.timeout),
            cache: CacheStore::new(&self.cache),
            limiter: TokenBucket::new(&self.rate_limit),
            breaker: CircuitBreaker::new(&self.breaker),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
