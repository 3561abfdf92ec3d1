//! Elo rating system with tiered K-factors
//!
//! This module provides the pure rating calculations used when a match
//! result is submitted.

pub mod elo;

pub use elo::{EloCalculator, SCORE_DRAW, SCORE_LOSS, SCORE_WIN};
