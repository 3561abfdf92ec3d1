//! In-memory storage implementations
//!
//! RwLock-guarded maps satisfying the store contracts. Constructed once at
//! service start and shared behind `Arc`; lock poisoning surfaces as an
//! opaque internal error.

use crate::error::{ArenaError, Result};
use crate::storage::{MatchStore, RankingStore, SpectatorStore};
use crate::types::{
    Match, MatchId, MatchStatus, PlayerId, PlayerRanking, SeasonId, SpectatorId, SpectatorRecord,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory ranking store keyed by (player, season)
#[derive(Debug, Default)]
pub struct InMemoryRankingStore {
    rankings: RwLock<HashMap<(PlayerId, SeasonId), PlayerRanking>>,
}

impl InMemoryRankingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RankingStore for InMemoryRankingStore {
    fn load(&self, player_id: &PlayerId, season_id: SeasonId) -> Result<Option<PlayerRanking>> {
        let rankings = self.rankings.read().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire rankings read lock".to_string(),
        })?;

        Ok(rankings.get(&(player_id.clone(), season_id)).cloned())
    }

    fn save(&self, ranking: PlayerRanking) -> Result<()> {
        let mut rankings = self.rankings.write().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire rankings write lock".to_string(),
        })?;

        rankings.insert((ranking.player_id.clone(), ranking.season_id), ranking);
        Ok(())
    }

    fn count_better(&self, season_id: SeasonId, rating: i32) -> Result<usize> {
        let rankings = self.rankings.read().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire rankings read lock".to_string(),
        })?;

        Ok(rankings
            .values()
            .filter(|r| r.season_id == season_id && r.rating > rating)
            .count())
    }

    fn list_for_season(
        &self,
        season_id: SeasonId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PlayerRanking>> {
        let rankings = self.rankings.read().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire rankings read lock".to_string(),
        })?;

        let mut rows: Vec<PlayerRanking> = rankings
            .values()
            .filter(|r| r.season_id == season_id)
            .cloned()
            .collect();

        // Rating descending; player id as a deterministic tie-break
        rows.sort_by(|a, b| {
            b.rating
                .cmp(&a.rating)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}

/// In-memory match store
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    matches: RwLock<HashMap<MatchId, Match>>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchStore for InMemoryMatchStore {
    fn insert(&self, m: Match) -> Result<()> {
        let mut matches = self.matches.write().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire matches write lock".to_string(),
        })?;

        matches.insert(m.id, m);
        Ok(())
    }

    fn load(&self, match_id: MatchId) -> Result<Option<Match>> {
        let matches = self.matches.read().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire matches read lock".to_string(),
        })?;

        Ok(matches.get(&match_id).cloned())
    }

    fn save(&self, m: Match) -> Result<()> {
        let mut matches = self.matches.write().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire matches write lock".to_string(),
        })?;

        matches.insert(m.id, m);
        Ok(())
    }

    fn count_by_status(&self, status: MatchStatus) -> Result<usize> {
        let matches = self.matches.read().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire matches read lock".to_string(),
        })?;

        Ok(matches.values().filter(|m| m.status == status).count())
    }
}

/// In-memory spectator store
#[derive(Debug, Default)]
pub struct InMemorySpectatorStore {
    records: RwLock<HashMap<SpectatorId, SpectatorRecord>>,
}

impl InMemorySpectatorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpectatorStore for InMemorySpectatorStore {
    fn save(&self, record: SpectatorRecord) -> Result<()> {
        let mut records = self.records.write().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire spectators write lock".to_string(),
        })?;

        records.insert(record.id, record);
        Ok(())
    }

    fn load(&self, spectator_id: SpectatorId) -> Result<Option<SpectatorRecord>> {
        let records = self.records.read().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire spectators read lock".to_string(),
        })?;

        Ok(records.get(&spectator_id).cloned())
    }

    fn find_active(
        &self,
        match_id: MatchId,
        player_id: &PlayerId,
    ) -> Result<Option<SpectatorRecord>> {
        let records = self.records.read().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire spectators read lock".to_string(),
        })?;

        Ok(records
            .values()
            .find(|r| r.match_id == match_id && &r.player_id == player_id && r.is_active())
            .cloned())
    }

    fn list_active(&self, match_id: MatchId) -> Result<Vec<SpectatorRecord>> {
        let records = self.records.read().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire spectators read lock".to_string(),
        })?;

        let mut active: Vec<SpectatorRecord> = records
            .values()
            .filter(|r| r.match_id == match_id && r.is_active())
            .cloned()
            .collect();

        active.sort_by_key(|r| r.joined_at);
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{current_timestamp, generate_match_id, generate_spectator_id};
    use uuid::Uuid;

    fn ranking(player: &str, season: SeasonId, rating: i32) -> PlayerRanking {
        let mut r = PlayerRanking::new(player.to_string(), season, 1000);
        r.rating = rating;
        r
    }

    #[test]
    fn test_ranking_store_load_save() {
        let store = InMemoryRankingStore::new();
        let season = Uuid::new_v4();

        assert!(store.load(&"p1".to_string(), season).unwrap().is_none());

        store.save(ranking("p1", season, 1100)).unwrap();
        let loaded = store.load(&"p1".to_string(), season).unwrap().unwrap();
        assert_eq!(loaded.rating, 1100);

        // Same player, different season is a separate row
        let other_season = Uuid::new_v4();
        assert!(store.load(&"p1".to_string(), other_season).unwrap().is_none());
    }

    #[test]
    fn test_ranking_store_count_better() {
        let store = InMemoryRankingStore::new();
        let season = Uuid::new_v4();

        store.save(ranking("p1", season, 1200)).unwrap();
        store.save(ranking("p2", season, 1100)).unwrap();
        store.save(ranking("p3", season, 1100)).unwrap();
        store.save(ranking("p4", season, 900)).unwrap();

        // Strict comparison: ties do not count as better
        assert_eq!(store.count_better(season, 1100).unwrap(), 1);
        assert_eq!(store.count_better(season, 1200).unwrap(), 0);
        assert_eq!(store.count_better(season, 800).unwrap(), 4);
    }

    #[test]
    fn test_ranking_store_list_sorted_and_paged() {
        let store = InMemoryRankingStore::new();
        let season = Uuid::new_v4();

        store.save(ranking("p1", season, 900)).unwrap();
        store.save(ranking("p2", season, 1300)).unwrap();
        store.save(ranking("p3", season, 1100)).unwrap();

        let page = store.list_for_season(season, 10, 0).unwrap();
        let ratings: Vec<i32> = page.iter().map(|r| r.rating).collect();
        assert_eq!(ratings, vec![1300, 1100, 900]);

        let page = store.list_for_season(season, 1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].rating, 1100);
    }

    #[test]
    fn test_match_store_round_trip() {
        let store = InMemoryMatchStore::new();
        let m = Match {
            id: generate_match_id(),
            match_type: crate::types::MatchType::Arena,
            season_id: Uuid::new_v4(),
            player_a: "a".to_string(),
            player_b: "b".to_string(),
            status: MatchStatus::Waiting,
            score_a: 0,
            score_b: 0,
            winner_id: None,
            moves_a: 0,
            moves_b: 0,
            duration_seconds: 0,
            spectator_count: 0,
            allow_spectate: true,
            created_at: current_timestamp(),
            started_at: None,
            finished_at: None,
        };
        let id = m.id;

        store.insert(m.clone()).unwrap();
        assert_eq!(store.count_by_status(MatchStatus::Waiting).unwrap(), 1);

        let mut loaded = store.load(id).unwrap().unwrap();
        loaded.status = MatchStatus::Active;
        store.save(loaded).unwrap();

        assert_eq!(store.count_by_status(MatchStatus::Waiting).unwrap(), 0);
        assert_eq!(store.count_by_status(MatchStatus::Active).unwrap(), 1);
        assert!(store.load(generate_match_id()).unwrap().is_none());
    }

    #[test]
    fn test_spectator_store_active_filtering() {
        let store = InMemorySpectatorStore::new();
        let match_id = generate_match_id();

        let active = SpectatorRecord {
            id: generate_spectator_id(),
            match_id,
            player_id: "watcher1".to_string(),
            joined_at: current_timestamp(),
            left_at: None,
        };
        let left = SpectatorRecord {
            id: generate_spectator_id(),
            match_id,
            player_id: "watcher2".to_string(),
            joined_at: current_timestamp(),
            left_at: Some(current_timestamp()),
        };

        store.save(active.clone()).unwrap();
        store.save(left).unwrap();

        let listed = store.list_active(match_id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].player_id, "watcher1");

        assert!(store
            .find_active(match_id, &"watcher1".to_string())
            .unwrap()
            .is_some());
        assert!(store
            .find_active(match_id, &"watcher2".to_string())
            .unwrap()
            .is_none());
    }
}
