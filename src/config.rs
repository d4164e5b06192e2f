//! Configuration loading for jaburu.
//!
//! Configuration is loaded from TOML files with the following resolution
//! order:
//! 1. explicit path (CLI flag or caller-provided)
//! 2. `~/.jaburu/config.toml` (user)
//! 3. `/etc/jaburu/config.toml` (system)
//!
//! Every section and field has a default, so an empty file (or none at
//! all, via `Config::default()`) yields a working production setup. The
//! upstream API is public; there are no secrets to manage.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::CacheSettings;
use crate::client::DEFAULT_BASE_URL;
use crate::resilience::{BreakerSettings, RateLimitSettings};
use crate::{JaburuError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub circuit_breaker: BreakerSettings,
}

/// Upstream API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the open-data API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.jaburu/config.toml`
    /// 3. `/etc/jaburu/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            JaburuError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            JaburuError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(JaburuError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".jaburu").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/jaburu/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(JaburuError::Configuration(
            "No config file found. Create ~/.jaburu/config.toml or /etc/jaburu/config.toml"
                .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.upstream.timeout_secs, 30);
        assert!(config.cache.enabled);
        assert!(config.cache.touch_on_read);
        assert_eq!(config.rate_limit.requests_per_minute, 100.0);
        assert_eq!(config.rate_limit.burst, 20);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.reset_timeout_secs, 30);
    }

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert!(config.rate_limit.enabled);
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [upstream]
            timeout_secs = 10
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.upstream.timeout_secs, 10);
        // Defaults preserved
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.cache.default_max_entries, 1_000);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [upstream]
            base_url = "http://localhost:8080/api/v2"
            timeout_secs = 5

            [cache]
            touch_on_read = false
            default_ttl_secs = 600

            [[cache.categories]]
            name = "votacoes"
            ttl_secs = 120
            max_entries = 50

            [rate_limit]
            requests_per_minute = 30.0
            burst = 5

            [circuit_breaker]
            failure_threshold = 3
            reset_timeout_secs = 60
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.upstream.base_url, "http://localhost:8080/api/v2");
        assert!(!config.cache.touch_on_read);
        assert_eq!(config.cache.default_ttl_secs, 600);
        assert_eq!(config.cache.categories.len(), 1);
        assert_eq!(config.cache.categories[0].name, "votacoes");
        assert_eq!(config.cache.categories[0].ttl_secs, Some(120));
        assert_eq!(config.rate_limit.requests_per_minute, 30.0);
        assert_eq!(config.rate_limit.burst, 5);
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert_eq!(config.circuit_breaker.reset_timeout_secs, 60);
    }

    #[test]
    fn disabled_sections_parse() {
        let toml = r#"
            [cache]
            enabled = false

            [rate_limit]
            enabled = false

            [circuit_breaker]
            enabled = false
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.cache.enabled);
        assert!(!config.rate_limit.enabled);
        assert!(!config.circuit_breaker.enabled);
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[upstream]\ntimeout_secs = 7\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.upstream.timeout_secs, 7);
    }
}
