//! Utility functions for the arena engine

use crate::types::{MatchId, SpectatorId};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique match ID
pub fn generate_match_id() -> MatchId {
    Uuid::new_v4()
}

/// Generate a new unique spectator record ID
pub fn generate_spectator_id() -> SpectatorId {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Calculate the absolute difference between two ratings
pub fn rating_difference(rating1: i32, rating2: i32) -> i32 {
    (rating1 - rating2).abs()
}

/// Check if two ratings are within the given tolerance
pub fn ratings_within_range(rating1: i32, rating2: i32, range: i32) -> bool {
    rating_difference(rating1, rating2) <= range
}
