//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// How much detail 4xx responses may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorExposure {
    /// Messages name the offending field and value
    Detailed,
    /// Messages are replaced by generic text
    Generic,
}

impl ErrorExposure {
    pub fn is_detailed(&self) -> bool {
        matches!(self, ErrorExposure::Detailed)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in seconds for read-through cache entries
    pub cache_ttl_seconds: u64,
    /// Maximum number of entries the cache can hold before LRU eviction
    pub cache_max_items: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Background expired-entry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Postgres connection string; the in-memory repository is used when absent
    pub database_url: Option<String>,
    /// Connection pool size
    pub database_max_connections: u32,
    /// Error detail policy for client errors
    pub error_exposure: ErrorExposure,
    pub log_format: LogFormat,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECONDS` - Default cache TTL in seconds (default: 300)
    /// - `CACHE_MAX_ITEMS` - Maximum cache entries (default: 100)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `DATABASE_URL` - Postgres URL (default: unset, in-memory storage)
    /// - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 5)
    /// - `APP_ENV` - `production` hides error details (default: development)
    /// - `LOG_FORMAT` - `json` or `text` (default: text)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            cache_ttl_seconds: parse_positive(&lookup, "CACHE_TTL_SECONDS")
                .unwrap_or(defaults.cache_ttl_seconds),
            cache_max_items: parse_positive(&lookup, "CACHE_MAX_ITEMS")
                .unwrap_or(defaults.cache_max_items),
            server_port: parse_positive(&lookup, "SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_positive(&lookup, "CLEANUP_INTERVAL")
                .unwrap_or(defaults.cleanup_interval),
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            database_max_connections: parse_positive(&lookup, "DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            error_exposure: match lookup("APP_ENV").as_deref().map(str::trim) {
                Some(env) if env.eq_ignore_ascii_case("production") => ErrorExposure::Generic,
                _ => ErrorExposure::Detailed,
            },
            log_format: match lookup("LOG_FORMAT").as_deref().map(str::trim) {
                Some(fmt) if fmt.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        }
    }

    /// Default cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

/// Parses a strictly positive number; zero, garbage and absence all yield None.
fn parse_positive<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default,
{
    lookup(name)
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: 300,
            cache_max_items: 100,
            server_port: 3000,
            cleanup_interval: 60,
            database_url: None,
            database_max_connections: 5,
            error_exposure: ErrorExposure::Detailed,
            log_format: LogFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.cache_max_items, 100);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 60);
        assert!(config.database_url.is_none());
        assert_eq!(config.error_exposure, ErrorExposure::Detailed);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_config_empty_source_uses_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.cache_max_items, 100);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_config_reads_values() {
        let config = from_pairs(&[
            ("CACHE_TTL_SECONDS", "60"),
            ("CACHE_MAX_ITEMS", "500"),
            ("SERVER_PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/pessoas"),
            ("APP_ENV", "production"),
            ("LOG_FORMAT", "json"),
        ]);
        assert_eq!(config.cache_ttl_seconds, 60);
        assert_eq!(config.cache_max_items, 500);
        assert_eq!(config.server_port, 8080);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/pessoas")
        );
        assert_eq!(config.error_exposure, ErrorExposure::Generic);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_config_rejects_zero_and_garbage() {
        let config = from_pairs(&[
            ("CACHE_TTL_SECONDS", "0"),
            ("CACHE_MAX_ITEMS", "lots"),
            ("DATABASE_URL", "  "),
        ]);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.cache_max_items, 100);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_non_production_env_keeps_details() {
        let config = from_pairs(&[("APP_ENV", "staging")]);
        assert!(config.error_exposure.is_detailed());
    }
}
