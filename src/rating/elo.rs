//! Elo rating mathematics with tiered K-factors
//!
//! Pure calculation only; the match lifecycle decides when to apply the
//! results and the ranking store persists them.

use crate::config::rating::EloSettings;
use crate::error::Result;
use crate::types::MatchResult;

/// Actual score values fed into the Elo update
pub const SCORE_WIN: f64 = 1.0;
pub const SCORE_DRAW: f64 = 0.5;
pub const SCORE_LOSS: f64 = 0.0;

/// Stateless Elo calculator
///
/// Expected score uses the standard logistic curve with a 400-point
/// scale. The K-factor is tiered: new players swing harder, high-rated
/// players swing less.
#[derive(Debug, Clone)]
pub struct EloCalculator {
    settings: EloSettings,
}

impl EloCalculator {
    /// Create a calculator, validating the settings up front
    pub fn new(settings: EloSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Rating assigned to players with no ranking row yet
    pub fn initial_rating(&self) -> i32 {
        self.settings.initial_rating
    }

    /// Expected scores for both players; the halves always sum to 1.0
    pub fn expected_score(&self, rating_a: i32, rating_b: i32) -> (f64, f64) {
        let diff = f64::from(rating_b - rating_a);
        let expected_a = 1.0 / (1.0 + 10f64.powf(diff / 400.0));
        (expected_a, 1.0 - expected_a)
    }

    /// K-factor for a player given their rating and match count
    pub fn k_factor(&self, rating: i32, matches_played: u32) -> i32 {
        if matches_played < self.settings.placement_games {
            self.settings.newbie_k
        } else if rating >= self.settings.high_tier_rating {
            self.settings.high_tier_k
        } else {
            self.settings.base_k
        }
    }

    /// New rating after one match, rounded to nearest and floored at 0
    pub fn new_rating(&self, rating: i32, expected: f64, actual: f64, matches_played: u32) -> i32 {
        let k = f64::from(self.k_factor(rating, matches_played));
        let updated = f64::from(rating) + k * (actual - expected);
        (updated.round() as i32).max(0)
    }

    /// Map a per-player match result to its actual score value
    pub fn actual_score(&self, result: MatchResult) -> f64 {
        match result {
            MatchResult::Win => SCORE_WIN,
            MatchResult::Draw => SCORE_DRAW,
            MatchResult::Loss => SCORE_LOSS,
        }
    }
}

impl Default for EloCalculator {
    fn default() -> Self {
        Self {
            settings: EloSettings::default(),
        }
    }
}
