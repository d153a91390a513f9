//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum total size of cached documents in bytes
    pub cache_max_bytes: u64,
    /// Maximum number of cached documents
    pub cache_max_entries: usize,
    /// Document TTL in milliseconds
    pub cache_ttl_ms: u64,
    /// Interval in seconds between expiry sweeps
    pub sweep_interval: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DOC_CACHE_MAX_BYTES` - Maximum cached bytes (default: 104857600)
    /// - `DOC_CACHE_MAX_ENTRIES` - Maximum cached documents (default: 50)
    /// - `DOC_CACHE_TTL_MS` - Document TTL in milliseconds (default: 1800000)
    /// - `CACHE_SWEEP_INTERVAL_SECS` - Expiry sweep frequency (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from `lookup`, which maps a variable name to its value.
    ///
    /// Missing or unparseable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            cache_max_bytes: parse_or(lookup("DOC_CACHE_MAX_BYTES"), defaults.cache_max_bytes),
            cache_max_entries: parse_or(lookup("DOC_CACHE_MAX_ENTRIES"), defaults.cache_max_entries),
            cache_ttl_ms: parse_or(lookup("DOC_CACHE_TTL_MS"), defaults.cache_ttl_ms),
            sweep_interval: parse_or(lookup("CACHE_SWEEP_INTERVAL_SECS"), defaults.sweep_interval),
            server_port: parse_or(lookup("SERVER_PORT"), defaults.server_port),
        }
    }

    /// Cache bounds derived from this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_bytes: self.cache_max_bytes,
            max_entries: self.cache_max_entries,
            ttl: Duration::from_millis(self.cache_ttl_ms),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            cache_max_bytes: cache.max_bytes,
            cache_max_entries: cache.max_entries,
            cache_ttl_ms: cache.ttl.as_millis() as u64,
            sweep_interval: 300,
            server_port: 3000,
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
