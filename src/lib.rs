//! Jaburu - resilient gateway for the Câmara dos Deputados open-data API
//!
//! This crate provides the [`Pipeline`] that tool handlers call to reach
//! the upstream API. Every request flows through a per-category TTL
//! cache, a token-bucket rate limiter, and a circuit breaker before (or
//! instead of) touching the network; every failure comes back typed.
//!
//! # Example
//!
//! ```rust,no_run
//! use jaburu::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> jaburu::Result<()> {
//!     let pipeline = Pipeline::builder().build();
//!
//!     let dados = pipeline
//!         .request(
//!             "deputados",
//!             "/deputados",
//!             &[("siglaUf".into(), "SP".into())],
//!         )
//!         .await?;
//!
//!     println!("{dados}");
//!     Ok(())
//! }
//! ```
//!
//! # Paginated listings
//!
//! ```rust,no_run
//! # use jaburu::Pipeline;
//! # #[tokio::main]
//! # async fn main() -> jaburu::Result<()> {
//! # let pipeline = Pipeline::builder().build();
//! let page = pipeline
//!     .request_paginated("proposicoes", "/proposicoes", &[])
//!     .await?;
//!
//! for link in &page.links {
//!     println!("{} -> {}", link.rel, link.href);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod resilience;
pub mod telemetry;

// Re-export main types at crate root
pub use error::{JaburuError, Result};
pub use pipeline::{Page, Pipeline, PipelineBuilder, RequestOutcome};

// Re-export configuration surface
pub use cache::{CacheSettings, CategoryConfig};
pub use client::{CamaraClient, Link};
pub use config::Config;
pub use resilience::{BreakerSettings, BreakerState, RateLimitSettings};
