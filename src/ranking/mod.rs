//! Ranking queries
//!
//! Read side of the rating system: single-player lookups with a derived
//! rank, and paged leaderboards. Rank is recomputed on demand as the
//! strict count of higher-rated players plus one.

use crate::config::EloSettings;
use crate::error::{ArenaError, Result};
use crate::season::SeasonProvider;
use crate::storage::RankingStore;
use crate::types::{PlayerId, PlayerRanking, RankingView, SeasonId};
use std::sync::Arc;
use tracing::debug;

/// Serves ranking lookups and leaderboards
pub struct RankingService {
    /// Ranking persistence
    ranking_store: Arc<dyn RankingStore>,

    /// Active season lookup for calls that omit a season
    season_provider: Arc<dyn SeasonProvider>,

    /// Rating settings, for lazily created rows
    settings: EloSettings,
}

impl RankingService {
    /// Create a new ranking service
    pub fn new(
        ranking_store: Arc<dyn RankingStore>,
        season_provider: Arc<dyn SeasonProvider>,
        settings: EloSettings,
    ) -> Self {
        Self {
            ranking_store,
            season_provider,
            settings,
        }
    }

    /// Get one player's ranking
    ///
    /// With an explicit season the row must already exist; without one the
    /// active season is used and a fresh row is created on first lookup.
    pub async fn get_player_ranking(
        &self,
        player_id: &PlayerId,
        season_id: Option<SeasonId>,
    ) -> Result<RankingView> {
        let ranking = match season_id {
            Some(season_id) => self.ranking_store.load(player_id, season_id)?.ok_or_else(
                || ArenaError::RankingNotFound {
                    player_id: player_id.clone(),
                },
            )?,
            None => {
                let season = self.season_provider.active_season()?;
                match self.ranking_store.load(player_id, season.id)? {
                    Some(ranking) => ranking,
                    None => {
                        debug!(
                            player_id = %player_id,
                            season_id = %season.id,
                            "Creating ranking row on first lookup"
                        );
                        let ranking = PlayerRanking::new(
                            player_id.clone(),
                            season.id,
                            self.settings.initial_rating,
                        );
                        self.ranking_store.save(ranking.clone())?;
                        ranking
                    }
                }
            }
        };

        let rank = self.rank_of(&ranking)?;
        Ok(view(ranking, rank))
    }

    /// Get a page of the leaderboard, rating descending
    ///
    /// Ranks are 1-based positions in the full ordering, so a page at
    /// offset 10 starts at rank 11.
    pub async fn get_ranking_list(
        &self,
        season_id: Option<SeasonId>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RankingView>> {
        let season_id = match season_id {
            Some(id) => id,
            None => self.season_provider.active_season()?.id,
        };

        let rows = self.ranking_store.list_for_season(season_id, limit, offset)?;
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, ranking)| view(ranking, offset + i + 1))
            .collect())
    }

    /// Strict-greater rank of a ranking row within its season
    fn rank_of(&self, ranking: &PlayerRanking) -> Result<usize> {
        Ok(self
            .ranking_store
            .count_better(ranking.season_id, ranking.rating)?
            + 1)
    }
}

fn view(ranking: PlayerRanking, rank: usize) -> RankingView {
    let win_rate = ranking.win_rate();
    RankingView {
        player_id: ranking.player_id,
        season_id: ranking.season_id,
        rating: ranking.rating,
        max_rating: ranking.max_rating,
        rank,
        matches_played: ranking.matches_played,
        matches_won: ranking.matches_won,
        matches_lost: ranking.matches_lost,
        matches_drawn: ranking.matches_drawn,
        win_rate,
        current_streak: ranking.current_streak,
        max_streak: ranking.max_streak,
    }
}
