//! Configuration management for the duel-arena engine
//!
//! This module handles all configuration loading from environment variables
//! and TOML files, validation, and default values for the arena service.

pub mod app;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, MatchmakingSettings, ServiceSettings};
pub use rating::EloSettings;
