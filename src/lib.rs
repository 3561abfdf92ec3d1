//! Duel Arena - PVP matchmaking and rating engine
//!
//! This crate pairs queued players into matches, drives each match through
//! its lifecycle, updates Elo-style skill ratings on submitted results, and
//! tracks spectators and per-season rankings.

pub mod config;
pub mod error;
pub mod matches;
pub mod metrics;
pub mod queue;
pub mod ranking;
pub mod rating;
pub mod season;
pub mod service;
pub mod spectate;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{ArenaError, Result};
pub use types::*;

// Re-export key components
pub use matches::MatchLifecycle;
pub use queue::QueueManager;
pub use ranking::RankingService;
pub use rating::EloCalculator;
pub use spectate::SpectatorRegistry;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
