//! Caching subsystem.
//!
//! One [`CacheStore`] holds a fixed set of **categories**, each backed by
//! its own bounded LRU + TTL cache (moka). Categories partition the key
//! space by upstream resource type because volatility differs wildly:
//! reference tables (parties, legislatures) are stable for days, while
//! vote tallies go stale in minutes. A single global TTL would either
//! stale the critical data or thrash the cacheable static data; a
//! per-category capacity bound keeps one hot resource type from starving
//! another's headroom.
//!
//! The category set, TTLs, and capacity bounds are fixed when the store
//! is built from [`CacheSettings`] and immutable afterwards.
//!
//! The store is a pure performance optimization, never a correctness
//! signal: `get` answers `None` identically for "never set", "expired",
//! "evicted", and "unknown category", and `set` silently degrades to
//! "not cached" rather than failing.

mod store;

pub use store::{CacheStats, CacheStore};

use serde::Deserialize;

/// Configuration for the cache store.
///
/// Deserialized from the `[cache]` section of the config file, or built
/// in code for tests:
///
/// ```rust
/// # use jaburu::cache::{CacheSettings, CategoryConfig};
/// let settings = CacheSettings::new()
///     .touch_on_read(false)
///     .category(CategoryConfig::new("votacoes").ttl_secs(300));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Whether caching is active at all. Disabled: every `get` misses,
    /// every `set` is dropped. Default: true.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Whether a `get` hit resets the entry's age. Presence checks via
    /// `contains` never do, regardless of this flag. Default: true.
    #[serde(default = "default_enabled")]
    pub touch_on_read: bool,
    /// TTL for categories without an explicit `ttl_secs`. Default: 1800.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
    /// Capacity for categories without an explicit `max_entries`.
    /// Default: 1,000.
    #[serde(default = "default_max_entries")]
    pub default_max_entries: u64,
    /// The category table. Defaults to [`default_categories`].
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryConfig>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            touch_on_read: true,
            default_ttl_secs: default_ttl_secs(),
            default_max_entries: default_max_entries(),
            categories: default_categories(),
        }
    }
}

impl CacheSettings {
    /// Create settings with the default category table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable caching entirely.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Enable or disable age refresh on read.
    pub fn touch_on_read(mut self, enabled: bool) -> Self {
        self.touch_on_read = enabled;
        self
    }

    /// Replace the category table entirely.
    pub fn categories(mut self, categories: Vec<CategoryConfig>) -> Self {
        self.categories = categories;
        self
    }

    /// Add (or override) a single category.
    pub fn category(mut self, config: CategoryConfig) -> Self {
        self.categories.retain(|c| c.name != config.name);
        self.categories.push(config);
        self
    }
}

/// One cache category: a name plus optional TTL/capacity overrides.
///
/// Missing fields fall back to the store-wide defaults in
/// [`CacheSettings`].
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
    #[serde(default)]
    pub max_entries: Option<u64>,
}

impl CategoryConfig {
    /// Create a category with store-default TTL and capacity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ttl_secs: None,
            max_entries: None,
        }
    }

    /// Set the TTL for this category.
    pub fn ttl_secs(mut self, secs: u64) -> Self {
        self.ttl_secs = Some(secs);
        self
    }

    /// Set the max entry count for this category.
    pub fn max_entries(mut self, max: u64) -> Self {
        self.max_entries = Some(max);
        self
    }
}

fn default_enabled() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    1800
}

fn default_max_entries() -> u64 {
    1_000
}

/// The standard category table for the Câmara dos Deputados API.
///
/// TTLs track upstream volatility: vote tallies change within minutes
/// during a session, member and proposition data within the hour,
/// reference tables rarely.
pub fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new("deputados").ttl_secs(3_600).max_entries(2_000),
        CategoryConfig::new("proposicoes").ttl_secs(1_800).max_entries(2_000),
        CategoryConfig::new("votacoes").ttl_secs(300).max_entries(1_000),
        CategoryConfig::new("eventos").ttl_secs(600).max_entries(1_000),
        CategoryConfig::new("orgaos").ttl_secs(86_400).max_entries(500),
        CategoryConfig::new("partidos").ttl_secs(86_400).max_entries(200),
        CategoryConfig::new("blocos").ttl_secs(86_400).max_entries(200),
        CategoryConfig::new("frentes").ttl_secs(43_200).max_entries(500),
        CategoryConfig::new("legislaturas").ttl_secs(86_400).max_entries(100),
        CategoryConfig::new("referencias").ttl_secs(86_400).max_entries(500),
    ]
}
