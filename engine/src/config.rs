//! Configuration management for the DogSpa engine.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Malformed values are reported with the name of the offending variable.

use crate::availability::BusinessHours;
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable present but unparseable
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    Invalid {
        /// Environment variable name
        name: &'static str,
        /// Raw value
        value: String,
        /// What was expected
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Engine configuration
    pub engine: EngineConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Metrics server host (for Prometheus scraping)
    pub metrics_host: String,
    /// Metrics server port
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on waiting for exclusive access
    pub lock_timeout: Duration,
    /// Facility opening hours
    pub business_hours: BusinessHours,
    /// Catalog seed file; `None` uses the built-in demo catalog
    pub catalog_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(2000),
            business_hours: BusinessHours::default(),
            catalog_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first malformed variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first malformed variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let server = ServerConfig {
            host: text("HOST", "0.0.0.0"),
            port: parse(&lookup, "PORT", 8080)?,
            log_level: text("RUST_LOG", "info"),
            metrics_host: text("METRICS_HOST", "0.0.0.0"),
            metrics_port: parse(&lookup, "METRICS_PORT", 9090)?,
            shutdown_timeout: parse(&lookup, "SHUTDOWN_TIMEOUT", 30)?,
        };

        let lock_timeout_ms: u64 = parse(&lookup, "DOGSPA_LOCK_TIMEOUT_MS", 2000)?;
        if lock_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "DOGSPA_LOCK_TIMEOUT_MS",
                "0",
                "must be greater than zero",
            ));
        }

        let tz = match lookup("DOGSPA_TIMEZONE") {
            Some(raw) => raw
                .parse::<Tz>()
                .map_err(|e| ConfigError::invalid("DOGSPA_TIMEZONE", &raw, e.to_string()))?,
            None => chrono_tz::America::Santiago,
        };
        let opens = time_of_day(&lookup, "DOGSPA_OPENS_AT", (9, 0))?;
        let closes = time_of_day(&lookup, "DOGSPA_CLOSES_AT", (18, 0))?;
        let business_hours = BusinessHours::new(tz, opens, closes).map_err(|e| {
            ConfigError::invalid("DOGSPA_CLOSES_AT", &closes.format("%H:%M").to_string(), e.to_string())
        })?;

        let engine = EngineConfig {
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            business_hours,
            catalog_path: lookup("DOGSPA_CATALOG_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        };

        Ok(Self { server, engine })
    }
}

fn parse<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(name, &raw, e.to_string())),
        None => Ok(default),
    }
}

fn time_of_day<F>(lookup: &F, name: &'static str, default: (u32, u32)) -> Result<NaiveTime, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map_err(|_| ConfigError::invalid(name, &raw, "expected HH:MM")),
        None => NaiveTime::from_hms_opt(default.0, default.1, 0)
            .ok_or_else(|| ConfigError::invalid(name, "", "default out of range")),
    }
}
