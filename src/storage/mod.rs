//! Storage interfaces for rankings, matches, and spectator records
//!
//! This module defines the persistence contracts consumed by the engine.
//! Calls are synchronous; they are the only points where a request may
//! block on I/O. The in-memory implementations in [`memory`] satisfy the
//! same contracts for tests and single-process deployments.

pub mod memory;

pub use memory::{InMemoryMatchStore, InMemoryRankingStore, InMemorySpectatorStore};

use crate::error::Result;
use crate::types::{
    Match, MatchId, MatchStatus, PlayerId, PlayerRanking, SeasonId, SpectatorId, SpectatorRecord,
};

/// Persistence contract for per-season player rankings
pub trait RankingStore: Send + Sync {
    /// Load a player's ranking row for a season
    fn load(&self, player_id: &PlayerId, season_id: SeasonId) -> Result<Option<PlayerRanking>>;

    /// Store or replace a ranking row
    fn save(&self, ranking: PlayerRanking) -> Result<()>;

    /// Count players in a season with a strictly higher rating
    fn count_better(&self, season_id: SeasonId, rating: i32) -> Result<usize>;

    /// List a season's rankings sorted by rating descending
    fn list_for_season(
        &self,
        season_id: SeasonId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PlayerRanking>>;
}

/// Persistence contract for matches
pub trait MatchStore: Send + Sync {
    /// Insert a newly created match
    fn insert(&self, m: Match) -> Result<()>;

    /// Load a match by id
    fn load(&self, match_id: MatchId) -> Result<Option<Match>>;

    /// Store an updated match
    fn save(&self, m: Match) -> Result<()>;

    /// Count matches currently in the given status
    fn count_by_status(&self, status: MatchStatus) -> Result<usize>;
}

/// Persistence contract for spectator records
pub trait SpectatorStore: Send + Sync {
    /// Store or replace a spectator record
    fn save(&self, record: SpectatorRecord) -> Result<()>;

    /// Load a record by id
    fn load(&self, spectator_id: SpectatorId) -> Result<Option<SpectatorRecord>>;

    /// Find a player's active (not-left) record for a match
    fn find_active(
        &self,
        match_id: MatchId,
        player_id: &PlayerId,
    ) -> Result<Option<SpectatorRecord>>;

    /// List all active records for a match
    fn list_active(&self, match_id: MatchId) -> Result<Vec<SpectatorRecord>>;
}
