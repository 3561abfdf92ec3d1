//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! duel-arena engine, including environment variable loading, TOML file
//! loading, and validation.

use crate::config::rating::EloSettings;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub matchmaking: MatchmakingSettings,
    pub rating: EloSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for the metrics and health endpoints
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchmakingSettings {
    /// Rating range applied when a join request does not declare one
    pub default_rating_range: i32,
    /// Seconds of estimated wait attributed to each entry ahead in the queue
    pub wait_estimate_seconds_per_entry: u64,
    /// Name of the season created at startup by the static provider
    pub season_name: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "duel-arena".to_string(),
            log_level: "info".to_string(),
            metrics_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            default_rating_range: 200,
            wait_estimate_seconds_per_entry: 5,
            season_name: "Season 1".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(port) = env::var("METRICS_PORT") {
            config.service.metrics_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid METRICS_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Matchmaking settings
        if let Ok(range) = env::var("DEFAULT_RATING_RANGE") {
            config.matchmaking.default_rating_range = range
                .parse()
                .map_err(|_| anyhow!("Invalid DEFAULT_RATING_RANGE value: {}", range))?;
        }
        if let Ok(estimate) = env::var("WAIT_ESTIMATE_SECONDS_PER_ENTRY") {
            config.matchmaking.wait_estimate_seconds_per_entry =
                estimate.parse().map_err(|_| {
                    anyhow!("Invalid WAIT_ESTIMATE_SECONDS_PER_ENTRY value: {}", estimate)
                })?;
        }
        if let Ok(season) = env::var("SEASON_NAME") {
            config.matchmaking.season_name = season;
        }

        // Rating settings
        if let Ok(rating) = env::var("INITIAL_RATING") {
            config.rating.initial_rating = rating
                .parse()
                .map_err(|_| anyhow!("Invalid INITIAL_RATING value: {}", rating))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        let config: Self = toml::from_str(&contents).with_context(|| {
            format!("Failed to parse config file: {}", path.as_ref().display())
        })?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.metrics_port == 0 {
        return Err(anyhow!("Metrics port cannot be 0"));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate matchmaking settings
    if config.matchmaking.default_rating_range <= 0 {
        return Err(anyhow!("Default rating range must be positive"));
    }
    if config.matchmaking.season_name.is_empty() {
        return Err(anyhow!("Season name cannot be empty"));
    }

    config.rating.validate()?;

    Ok(())
}
