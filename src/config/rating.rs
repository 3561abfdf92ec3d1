//! Elo rating system configuration

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Tunables for the Elo calculator
///
/// Defaults match the classic ladder constants: 1000 starting rating,
/// K=40 during placement, K=24 at the high tier, K=32 otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EloSettings {
    /// Rating assigned to a player's first ranking row in a season
    pub initial_rating: i32,
    /// K-factor for established mid-tier players
    pub base_k: i32,
    /// K-factor while a player has fewer than `placement_games` matches
    pub newbie_k: i32,
    /// Number of matches before newbie protection ends
    pub placement_games: u32,
    /// K-factor at or above `high_tier_rating`
    pub high_tier_k: i32,
    /// Rating at which high-tier damping kicks in
    pub high_tier_rating: i32,
}

impl Default for EloSettings {
    fn default() -> Self {
        Self {
            initial_rating: 1000,
            base_k: 32,
            newbie_k: 40,
            placement_games: 30,
            high_tier_k: 24,
            high_tier_rating: 2400,
        }
    }
}

impl EloSettings {
    /// Validate the settings are internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.initial_rating < 0 {
            return Err(anyhow!("initial rating cannot be negative"));
        }
        if self.base_k <= 0 || self.newbie_k <= 0 || self.high_tier_k <= 0 {
            return Err(anyhow!("K-factors must be positive"));
        }
        if self.high_tier_rating <= self.initial_rating {
            return Err(anyhow!(
                "high tier rating {} must exceed initial rating {}",
                self.high_tier_rating,
                self.initial_rating
            ));
        }
        Ok(())
    }
}
