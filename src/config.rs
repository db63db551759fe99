//! Configuration Module
//!
//! Handles loading cache, retry and catalog settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{CacheOptions, DEFAULT_PREFIX, DEFAULT_TTL};
use crate::retry::{RetryOptions, Retryable, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES};

/// Data layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace prefix for cache keys
    pub cache_prefix: String,
    /// Default entry TTL in milliseconds
    pub default_ttl_ms: u64,
    /// Path of the file-backed store
    pub cache_file: PathBuf,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds
    pub base_delay_ms: u64,
    /// Root URL of the product API
    pub catalog_base_url: String,
    /// Per-request timeout in seconds
    pub catalog_timeout: u64,
    /// Cache age in seconds after which catalog data is refetched
    pub stale_after: u64,
    /// Interval in seconds between catalog refreshes
    pub refresh_interval: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_PREFIX` - Cache key namespace (default: `@cache_`)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 1800000)
    /// - `CACHE_FILE` - Store file path (default: `shop_cache.json`)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    /// - `RETRY_MAX_RETRIES` - Retries after the first attempt (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - First backoff delay in milliseconds (default: 1000)
    /// - `CATALOG_BASE_URL` - Product API root (default: `https://fakestoreapi.com`)
    /// - `CATALOG_TIMEOUT_SECS` - Request timeout in seconds (default: 10)
    /// - `CATALOG_STALE_AFTER_SECS` - Refetch threshold in seconds (default: 300)
    /// - `REFRESH_INTERVAL` - Catalog refresh frequency in seconds (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_prefix: env::var("CACHE_PREFIX").unwrap_or(defaults.cache_prefix),
            default_ttl_ms: env_or("CACHE_DEFAULT_TTL_MS", defaults.default_ttl_ms),
            cache_file: env::var("CACHE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_file),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            max_retries: env_or("RETRY_MAX_RETRIES", defaults.max_retries),
            base_delay_ms: env_or("RETRY_BASE_DELAY_MS", defaults.base_delay_ms),
            catalog_base_url: env::var("CATALOG_BASE_URL").unwrap_or(defaults.catalog_base_url),
            catalog_timeout: env_or("CATALOG_TIMEOUT_SECS", defaults.catalog_timeout),
            stale_after: env_or("CATALOG_STALE_AFTER_SECS", defaults.stale_after),
            refresh_interval: env_or("REFRESH_INTERVAL", defaults.refresh_interval),
        }
    }

    /// Cache construction options derived from this config.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            prefix: self.cache_prefix.clone(),
            default_ttl: Duration::from_millis(self.default_ttl_ms),
        }
    }

    /// Retry options with the default predicate for `E`.
    pub fn retry_options<E: Retryable + 'static>(&self) -> RetryOptions<E> {
        RetryOptions::default()
            .with_max_retries(self.max_retries)
            .with_base_delay(Duration::from_millis(self.base_delay_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_prefix: DEFAULT_PREFIX.to_string(),
            default_ttl_ms: DEFAULT_TTL.as_millis() as u64,
            cache_file: PathBuf::from("shop_cache.json"),
            cleanup_interval: 60,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY.as_millis() as u64,
            catalog_base_url: "https://fakestoreapi.com".to_string(),
            catalog_timeout: 10,
            stale_after: 300,
            refresh_interval: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_prefix, "@cache_");
        assert_eq!(config.default_ttl_ms, 1_800_000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.cleanup_interval, 60);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the environment to avoid races between tests
        for name in [
            "CACHE_PREFIX",
            "CACHE_DEFAULT_TTL_MS",
            "CACHE_FILE",
            "CLEANUP_INTERVAL",
            "RETRY_BASE_DELAY_MS",
            "CATALOG_BASE_URL",
            "CATALOG_TIMEOUT_SECS",
            "CATALOG_STALE_AFTER_SECS",
            "REFRESH_INTERVAL",
        ] {
            env::remove_var(name);
        }
        env::set_var("RETRY_MAX_RETRIES", "5");
        env::set_var("CACHE_DEFAULT_TTL_MS", "not-a-number");

        let config = Config::from_env();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.default_ttl_ms, 1_800_000);
        assert_eq!(config.cache_file, PathBuf::from("shop_cache.json"));
        assert_eq!(config.catalog_base_url, "https://fakestoreapi.com");

        env::remove_var("RETRY_MAX_RETRIES");
        env::remove_var("CACHE_DEFAULT_TTL_MS");
    }

    #[test]
    fn test_derived_options() {
        let config = Config {
            default_ttl_ms: 5_000,
            max_retries: 1,
            base_delay_ms: 250,
            ..Config::default()
        };

        let cache = config.cache_options();
        assert_eq!(cache.default_ttl, Duration::from_secs(5));

        let retry: RetryOptions<FetchError> = config.retry_options();
        assert_eq!(retry.max_retries, 1);
        assert_eq!(retry.delay_for(1), Duration::from_millis(500));
    }
}
