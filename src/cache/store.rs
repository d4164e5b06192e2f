//! Per-category response store backed by moka.
//!
//! Each category owns a `moka::sync::Cache` with an [`Expiry`] policy
//! that reads the TTL out of the stored entry itself. That is what makes
//! per-entry TTL overrides possible on top of moka's cache-wide policy
//! knobs: the default TTL is baked into every entry at insert time unless
//! the caller overrides it.
//!
//! All operations are synchronous and non-suspending. Values are stored
//! and returned as `Arc<serde_json::Value>`, so a returned hit shares the
//! stored copy immutably — callers cannot mutate what later hits will
//! see.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;
use serde_json::Value;
use tracing::debug;

use super::CacheSettings;
use crate::telemetry;

/// A stored value plus the TTL it was inserted with.
#[derive(Clone)]
struct Entry {
    value: Arc<Value>,
    ttl: Duration,
}

/// Expiry policy: entries live for their own `ttl`, reset on overwrite,
/// and optionally reset on read (touch-on-read).
///
/// `contains_key` is not a read under this policy, so presence checks
/// never refresh entry age regardless of `touch_on_read`.
struct EntryExpiry {
    touch_on_read: bool,
}

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_read(
        &self,
        _key: &String,
        entry: &Entry,
        _read_at: Instant,
        duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        if self.touch_on_read {
            Some(entry.ttl)
        } else {
            duration_until_expiry
        }
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

struct Category {
    cache: Cache<String, Entry>,
    ttl: Duration,
    max_entries: u64,
}

/// Size snapshot for one category, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: u64,
    pub max_size: u64,
}

/// Per-category TTL + capacity bounded store.
///
/// Built once from [`CacheSettings`]; the category set is immutable
/// afterwards. See the [module docs](super) for the category rationale.
pub struct CacheStore {
    enabled: bool,
    categories: HashMap<String, Category>,
}

impl CacheStore {
    /// Build the store from settings.
    pub fn new(settings: &CacheSettings) -> Self {
        let mut categories = HashMap::new();
        for config in &settings.categories {
            let ttl = Duration::from_secs(config.ttl_secs.unwrap_or(settings.default_ttl_secs));
            let max_entries = config.max_entries.unwrap_or(settings.default_max_entries);
            let cache = Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryExpiry {
                    touch_on_read: settings.touch_on_read,
                })
                .build();
            categories.insert(
                config.name.clone(),
                Category {
                    cache,
                    ttl,
                    max_entries,
                },
            );
        }
        Self {
            enabled: settings.enabled,
            categories,
        }
    }

    /// Look up a cached value.
    ///
    /// `None` covers never-set, expired, evicted, unknown category, and
    /// disabled store alike. Emits hit/miss counters for known
    /// categories.
    pub fn get(&self, category: &str, key: &str) -> Option<Arc<Value>> {
        if !self.enabled {
            return None;
        }
        let cat = self.categories.get(category)?;
        match cat.cache.get(key) {
            Some(entry) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "category" => category.to_owned())
                    .increment(1);
                Some(entry.value)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "category" => category.to_owned())
                    .increment(1);
                None
            }
        }
    }

    /// Insert (or overwrite) a value under `category`/`key`.
    ///
    /// `ttl_override` replaces the category default for this entry only.
    /// Never fails: an unknown category or a disabled store drops the
    /// value silently.
    pub fn set(&self, category: &str, key: &str, value: Arc<Value>, ttl_override: Option<Duration>) {
        if !self.enabled {
            return;
        }
        let Some(cat) = self.categories.get(category) else {
            debug!(category, key, "dropping set into unknown cache category");
            return;
        };
        let ttl = ttl_override.unwrap_or(cat.ttl);
        cat.cache.insert(key.to_owned(), Entry { value, ttl });
    }

    /// Whether an unexpired entry exists, without refreshing its age.
    pub fn contains(&self, category: &str, key: &str) -> bool {
        self.enabled
            && self
                .categories
                .get(category)
                .is_some_and(|cat| cat.cache.contains_key(key))
    }

    /// Remove a single entry.
    pub fn remove(&self, category: &str, key: &str) {
        if let Some(cat) = self.categories.get(category) {
            cat.cache.invalidate(key);
        }
    }

    /// Clear one category, or every category when `None`.
    pub fn clear(&self, category: Option<&str>) {
        match category {
            Some(name) => {
                if let Some(cat) = self.categories.get(name) {
                    cat.cache.invalidate_all();
                }
            }
            None => {
                for cat in self.categories.values() {
                    cat.cache.invalidate_all();
                }
            }
        }
    }

    /// Size and capacity of one category.
    ///
    /// Runs moka's pending maintenance first so the reported size
    /// reflects completed inserts and expirations.
    pub fn stats(&self, category: &str) -> Option<CacheStats> {
        let cat = self.categories.get(category)?;
        cat.cache.run_pending_tasks();
        Some(CacheStats {
            size: cat.cache.entry_count(),
            max_size: cat.max_entries,
        })
    }

    /// Names of all configured categories, in no particular order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}
