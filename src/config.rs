//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::cache::TtlPolicy;

/// Cache and admin server configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the LMDB environment
    pub cache_dir: PathBuf,
    /// LMDB map size in megabytes
    pub map_size_mb: usize,
    /// Profile TTL in seconds
    pub profile_ttl: u64,
    /// Category list TTL in seconds
    pub categories_ttl: u64,
    /// Product page TTL in seconds
    pub products_ttl: u64,
    /// Review page TTL in seconds
    pub reviews_ttl: u64,
    /// Expiry sweeper interval in seconds
    pub sweep_interval: u64,
    /// Admin HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - LMDB directory (default: ./data/storefront-cache)
    /// - `CACHE_MAP_SIZE_MB` - LMDB map size (default: 64)
    /// - `PROFILE_TTL` - Profile TTL in seconds (default: 3600)
    /// - `CATEGORIES_TTL` - Category list TTL in seconds (default: 1800)
    /// - `PRODUCTS_TTL` - Product page TTL in seconds (default: 600)
    /// - `REVIEWS_TTL` - Review page TTL in seconds (default: 600)
    /// - `SWEEP_INTERVAL` - Sweeper frequency in seconds (default: 300)
    /// - `SERVER_PORT` - Admin HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            map_size_mb: parse_var("CACHE_MAP_SIZE_MB").unwrap_or(defaults.map_size_mb),
            profile_ttl: parse_var("PROFILE_TTL").unwrap_or(defaults.profile_ttl),
            categories_ttl: parse_var("CATEGORIES_TTL").unwrap_or(defaults.categories_ttl),
            products_ttl: parse_var("PRODUCTS_TTL").unwrap_or(defaults.products_ttl),
            reviews_ttl: parse_var("REVIEWS_TTL").unwrap_or(defaults.reviews_ttl),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// TTL table from the configured values. Zero or mis-ordered TTLs fall
    /// back to the defaults.
    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy::from_secs(
            self.profile_ttl,
            self.categories_ttl,
            self.products_ttl,
            self.reviews_ttl,
        )
        .unwrap_or_else(|e| {
            warn!("Invalid TTL configuration ({}), using defaults", e);
            TtlPolicy::default()
        })
    }

    /// Sweeper interval, at least one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        let ttl = TtlPolicy::default();
        Self {
            cache_dir: PathBuf::from("./data/storefront-cache"),
            map_size_mb: 64,
            profile_ttl: ttl.ttl(crate::cache::EntityKind::Profile).as_secs(),
            categories_ttl: ttl.ttl(crate::cache::EntityKind::Categories).as_secs(),
            products_ttl: ttl.ttl(crate::cache::EntityKind::Products).as_secs(),
            reviews_ttl: ttl.ttl(crate::cache::EntityKind::Reviews).as_secs(),
            sweep_interval: 300,
            server_port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EntityKind;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.map_size_mb, 64);
        assert_eq!(config.profile_ttl, 3600);
        assert_eq!(config.categories_ttl, 1800);
        assert_eq!(config.products_ttl, 600);
        assert_eq!(config.reviews_ttl, 600);
        assert_eq!(config.sweep_interval, 300);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "CACHE_DIR",
            "CACHE_MAP_SIZE_MB",
            "PROFILE_TTL",
            "CATEGORIES_TTL",
            "PRODUCTS_TTL",
            "REVIEWS_TTL",
            "SWEEP_INTERVAL",
            "SERVER_PORT",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.cache_dir, PathBuf::from("./data/storefront-cache"));
        assert_eq!(config.map_size_mb, 64);
        assert_eq!(config.sweep_interval, 300);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_ttl_policy_from_config() {
        let config = Config {
            profile_ttl: 120,
            categories_ttl: 60,
            products_ttl: 30,
            reviews_ttl: 20,
            ..Config::default()
        };

        let policy = config.ttl_policy();
        assert_eq!(policy.ttl(EntityKind::Profile), Duration::from_secs(120));
        assert_eq!(policy.ttl(EntityKind::Reviews), Duration::from_secs(20));
    }

    #[test]
    fn test_invalid_ttl_ordering_falls_back() {
        let config = Config {
            profile_ttl: 10,
            categories_ttl: 60,
            ..Config::default()
        };

        assert_eq!(config.ttl_policy(), TtlPolicy::default());
    }

    #[test]
    fn test_sweep_interval_minimum() {
        let config = Config {
            sweep_interval: 0,
            ..Config::default()
        };
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
