//! Common types used throughout the arena engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for matches
pub type MatchId = Uuid;

/// Unique identifier for spectator records
pub type SpectatorId = Uuid;

/// Unique identifier for rating seasons
pub type SeasonId = Uuid;

/// Type of match a player wants to queue for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Arena,
    Duel,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Arena => write!(f, "arena"),
            MatchType::Duel => write!(f, "duel"),
        }
    }
}

/// Lifecycle state of a match
///
/// Transitions are monotonic: Waiting -> Active -> Finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Waiting,
    Active,
    Finished,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Waiting => write!(f, "waiting"),
            MatchStatus::Active => write!(f, "active"),
            MatchStatus::Finished => write!(f, "finished"),
        }
    }
}

/// A player waiting in the matchmaking queue
///
/// At most one entry exists per player at a time; entries live only for
/// the duration of the wait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub player_id: PlayerId,
    pub rating: i32,
    pub queued_at: DateTime<Utc>,
    pub match_type: MatchType,
    pub rating_range: i32,
}

/// A match between two players
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub match_type: MatchType,
    pub season_id: SeasonId,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub status: MatchStatus,
    pub score_a: i32,
    pub score_b: i32,
    pub winner_id: Option<PlayerId>,
    pub moves_a: u32,
    pub moves_b: u32,
    pub duration_seconds: i64,
    pub spectator_count: u32,
    pub allow_spectate: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Check whether a player id is one of the two participants
    pub fn has_participant(&self, player_id: &str) -> bool {
        self.player_a == player_id || self.player_b == player_id
    }
}

/// Per-season skill record for a player
///
/// Keyed by (player_id, season_id); lazily created with the configured
/// initial rating on first lookup within a season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRanking {
    pub player_id: PlayerId,
    pub season_id: SeasonId,
    pub rating: i32,
    pub max_rating: i32,
    pub matches_played: u32,
    pub matches_won: u32,
    pub matches_lost: u32,
    pub matches_drawn: u32,
    /// Positive while on a winning run, negative while on a losing run
    pub current_streak: i32,
    pub max_streak: i32,
}

impl PlayerRanking {
    /// Create a fresh ranking row for a player in a season
    pub fn new(player_id: PlayerId, season_id: SeasonId, initial_rating: i32) -> Self {
        Self {
            player_id,
            season_id,
            rating: initial_rating,
            max_rating: initial_rating,
            matches_played: 0,
            matches_won: 0,
            matches_lost: 0,
            matches_drawn: 0,
            current_streak: 0,
            max_streak: 0,
        }
    }

    /// Apply one finished match to this row
    pub fn apply_result(&mut self, new_rating: i32, result: MatchResult) {
        self.rating = new_rating;
        self.max_rating = self.max_rating.max(new_rating);
        self.matches_played += 1;

        match result {
            MatchResult::Win => {
                self.matches_won += 1;
                self.current_streak = self.current_streak.max(0) + 1;
                self.max_streak = self.max_streak.max(self.current_streak);
            }
            MatchResult::Loss => {
                self.matches_lost += 1;
                self.current_streak = self.current_streak.min(0) - 1;
            }
            MatchResult::Draw => {
                self.matches_drawn += 1;
                self.current_streak = 0;
            }
        }
    }

    /// Win rate over all finished matches (0.0 when none played)
    pub fn win_rate(&self) -> f64 {
        if self.matches_played == 0 {
            0.0
        } else {
            self.matches_won as f64 / self.matches_played as f64
        }
    }
}

/// Outcome of one match from a single player's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

/// A spectator attached to a match
///
/// Logically deleted by setting `left_at`; a player holds at most one
/// active record per match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectatorRecord {
    pub id: SpectatorId,
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

impl SpectatorRecord {
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}

/// Result of a `join_queue` call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JoinQueueOutcome {
    /// No compatible opponent yet; the player is now waiting
    Queued {
        position: usize,
        estimated_wait_seconds: u64,
    },
    /// Paired with a waiting opponent; a match was created
    Matched {
        match_id: MatchId,
        opponent_id: PlayerId,
    },
    /// The player already holds a queue entry (idempotent, not an error)
    AlreadyQueued,
}

/// Result of a `cancel_queue` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CancelQueueOutcome {
    Cancelled,
    NotQueued,
}

/// Rating change for one player after a finished match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingChange {
    pub player_id: PlayerId,
    pub old_rating: i32,
    pub new_rating: i32,
    pub delta: i32,
}

/// Rating changes for both participants of a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingChangePair {
    pub player_a: RatingChange,
    pub player_b: RatingChange,
}

/// Result of a `submit_result` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResultSummary {
    pub match_id: MatchId,
    pub status: MatchStatus,
    pub winner_id: Option<PlayerId>,
    pub duration_seconds: i64,
    pub rating_changes: RatingChangePair,
}

/// Result of a `join_spectate` call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpectateOutcome {
    Joined { spectator_id: SpectatorId },
    /// The player already holds an active record for this match
    AlreadySpectating { spectator_id: SpectatorId },
}

/// A player's ranking within a season, enriched with the derived rank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingView {
    pub player_id: PlayerId,
    pub season_id: SeasonId,
    pub rating: i32,
    pub max_rating: i32,
    /// 1-based; strict count of higher-rated players plus one
    pub rank: usize,
    pub matches_played: u32,
    pub matches_won: u32,
    pub matches_lost: u32,
    pub matches_drawn: u32,
    pub win_rate: f64,
    pub current_streak: i32,
    pub max_streak: i32,
}
