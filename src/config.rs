//! Configuration Module
//!
//! Handles loading and validating server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Lifetime of a cached entry in milliseconds
    pub cache_max_age_ms: u64,
    /// Maximum number of live cache entries
    pub cache_max_size: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Unparseable values fall back to the defaults.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_AGE_MS` - Entry lifetime in milliseconds (default: 60000)
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 100)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_max_age_ms: env_or("CACHE_MAX_AGE_MS", defaults.cache_max_age_ms),
            cache_max_size: env_or("CACHE_MAX_SIZE", defaults.cache_max_size),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    /// Rejects values the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_max_age_ms == 0 {
            return Err(AppError::InvalidConfig(
                "CACHE_MAX_AGE_MS must be positive".to_string(),
            ));
        }
        if self.cache_max_size == 0 {
            return Err(AppError::InvalidConfig(
                "CACHE_MAX_SIZE must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Entry lifetime as a Duration.
    pub fn cache_max_age(&self) -> Duration {
        Duration::from_millis(self.cache_max_age_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_max_age_ms: 60_000,
            cache_max_size: 100,
            server_port: 3000,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
