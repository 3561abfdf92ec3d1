//! Test fixtures and helpers for integration tests

use duel_arena::config::{EloSettings, MatchmakingSettings};
use duel_arena::matches::MatchLifecycle;
use duel_arena::metrics::MetricsCollector;
use duel_arena::queue::QueueManager;
use duel_arena::ranking::RankingService;
use duel_arena::rating::EloCalculator;
use duel_arena::season::{MockSeasonProvider, Season};
use duel_arena::spectate::SpectatorRegistry;
use duel_arena::storage::{
    InMemoryMatchStore, InMemoryRankingStore, InMemorySpectatorStore, RankingStore,
};
use duel_arena::types::{JoinQueueOutcome, MatchId, MatchType, PlayerRanking};
use std::sync::Arc;

/// Fully wired in-memory engine for tests
pub struct TestEngine {
    pub queue: Arc<QueueManager>,
    pub lifecycle: Arc<MatchLifecycle>,
    pub spectators: Arc<SpectatorRegistry>,
    pub rankings: Arc<RankingService>,
    pub ranking_store: Arc<InMemoryRankingStore>,
    pub season_provider: Arc<MockSeasonProvider>,
    pub season: Season,
}

impl TestEngine {
    /// Build an engine with an active season and default settings
    pub fn new() -> Self {
        let season = Season::starting_now("Test Season");
        let season_provider = Arc::new(MockSeasonProvider::with_season(season.clone()));
        let metrics = Arc::new(MetricsCollector::new().expect("metrics collector"));

        let ranking_store = Arc::new(InMemoryRankingStore::new());
        let match_store = Arc::new(InMemoryMatchStore::new());
        let spectator_store = Arc::new(InMemorySpectatorStore::new());

        let lifecycle = Arc::new(MatchLifecycle::new(
            match_store.clone(),
            ranking_store.clone(),
            EloCalculator::default(),
            metrics.clone(),
        ));
        let queue = Arc::new(QueueManager::new(
            season_provider.clone(),
            lifecycle.clone(),
            MatchmakingSettings::default(),
            metrics.clone(),
        ));
        let spectators = Arc::new(SpectatorRegistry::new(
            spectator_store,
            match_store,
            metrics,
        ));
        let rankings = Arc::new(RankingService::new(
            ranking_store.clone(),
            season_provider.clone(),
            EloSettings::default(),
        ));

        Self {
            queue,
            lifecycle,
            spectators,
            rankings,
            ranking_store,
            season_provider,
            season,
        }
    }

    /// Seed a player's rating for the active season
    pub fn seed_rating(&self, player: &str, rating: i32) {
        let mut row = PlayerRanking::new(player.to_string(), self.season.id, 1000);
        row.rating = rating;
        self.ranking_store.save(row).expect("save ranking");
    }

    /// Queue two players and return the id of the match created for them
    pub async fn pair(&self, player_a: &str, player_b: &str) -> MatchId {
        self.queue
            .join_queue(player_a.to_string(), MatchType::Arena, None)
            .await
            .expect("first join");
        let outcome = self
            .queue
            .join_queue(player_b.to_string(), MatchType::Arena, None)
            .await
            .expect("second join");

        match outcome {
            JoinQueueOutcome::Matched { match_id, .. } => match_id,
            other => panic!("Expected Matched, got {other:?}"),
        }
    }

    /// Pair two players and start their match
    pub async fn active_match(&self, player_a: &str, player_b: &str) -> MatchId {
        let match_id = self.pair(player_a, player_b).await;
        self.lifecycle.start_match(match_id).await.expect("start");
        match_id
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}
