//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Upper bound for `CACHE_TTL_SECS` and `CLEANUP_INTERVAL_SECS` (one year).
/// Larger values overflow instant arithmetic on some platforms.
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Lifetime of a cached user in seconds
    pub cache_ttl: u64,
    /// Expiry sweeper interval in seconds
    pub cleanup_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// PostgreSQL connection string; the in-memory store is used when unset
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections
    pub db_max_connections: u32,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECS` - Cache entry lifetime in seconds (default: 600)
    /// - `CLEANUP_INTERVAL_SECS` - Sweeper frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `DATABASE_URL` - PostgreSQL URL (default: unset, in-memory store)
    /// - `DB_MAX_CONNECTIONS` - Pool size (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_ttl: parse_var("CACHE_TTL_SECS").unwrap_or(defaults.cache_ttl),
            cleanup_interval: parse_var("CLEANUP_INTERVAL_SECS")
                .unwrap_or(defaults.cleanup_interval),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS")
                .unwrap_or(defaults.db_max_connections),
        }
    }

    /// Both the TTL and the sweep interval must lie in `1..=MAX_DURATION_SECS`.
    pub fn validate(&self) -> Result<()> {
        check_duration("CACHE_TTL_SECS", self.cache_ttl)?;
        check_duration("CLEANUP_INTERVAL_SECS", self.cleanup_interval)?;
        if self.db_max_connections == 0 {
            return Err(Error::Config(
                "DB_MAX_CONNECTIONS must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl: 600,
            cleanup_interval: 60,
            server_port: 8080,
            database_url: None,
            db_max_connections: 10,
        }
    }
}

fn check_duration(name: &str, secs: u64) -> Result<()> {
    if secs == 0 {
        return Err(Error::Config(format!("{} must be positive", name)));
    }
    if secs > MAX_DURATION_SECS {
        return Err(Error::Config(format!(
            "{} must not exceed {} seconds",
            name, MAX_DURATION_SECS
        )));
    }
    Ok(())
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
