//! Matchmaking queue
//!
//! Pairs waiting players by rating proximity within a match type.

pub mod manager;

pub use manager::{QueueManager, QueueStats};
