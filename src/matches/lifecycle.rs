//! Match state machine and result-driven rating updates
//!
//! Each match moves monotonically through WAITING -> ACTIVE -> FINISHED.
//! Transitions are serialized per match id so a raced double submission
//! loses with `InvalidStatus` instead of applying rating deltas twice.

use crate::error::{ArenaError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::EloCalculator;
use crate::storage::{MatchStore, RankingStore};
use crate::types::{
    Match, MatchId, MatchResult, MatchResultSummary, MatchStatus, MatchType, PlayerId,
    PlayerRanking, RatingChange, RatingChangePair, SeasonId,
};
use crate::utils::{current_timestamp, generate_match_id};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Statistics about match lifecycle activity
#[derive(Debug, Clone, Default)]
pub struct MatchStats {
    pub matches_created: u64,
    pub matches_started: u64,
    pub matches_finished: u64,
}

/// Drives matches through their lifecycle and applies rating updates
pub struct MatchLifecycle {
    /// Match persistence
    match_store: Arc<dyn MatchStore>,

    /// Ranking persistence, written on result submission
    ranking_store: Arc<dyn RankingStore>,

    /// Elo rating calculator
    calculator: EloCalculator,

    /// Per-match transition locks
    locks: Mutex<HashMap<MatchId, Arc<Mutex<()>>>>,

    /// Lifecycle statistics
    stats: Mutex<MatchStats>,

    /// Metrics collector
    metrics: Arc<MetricsCollector>,
}

impl MatchLifecycle {
    /// Create a new match lifecycle manager
    pub fn new(
        match_store: Arc<dyn MatchStore>,
        ranking_store: Arc<dyn RankingStore>,
        calculator: EloCalculator,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            match_store,
            ranking_store,
            calculator,
            locks: Mutex::new(HashMap::new()),
            stats: Mutex::new(MatchStats::default()),
            metrics,
        }
    }

    /// Create a new match in the WAITING state
    pub async fn create_match(
        &self,
        player_a: PlayerId,
        player_b: PlayerId,
        rating_a: i32,
        rating_b: i32,
        match_type: MatchType,
        season_id: SeasonId,
    ) -> Result<Match> {
        let m = Match {
            id: generate_match_id(),
            match_type,
            season_id,
            player_a,
            player_b,
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

        self.match_store.insert(m.clone())?;

        info!(
            match_id = %m.id,
            match_type = %match_type,
            player_a = %m.player_a,
            player_b = %m.player_b,
            rating_a,
            rating_b,
            "Created match"
        );

        self.metrics.record_match_created(match_type);
        self.stats.lock().await.matches_created += 1;

        Ok(m)
    }

    /// Get a snapshot of a match
    pub async fn get_match(&self, match_id: MatchId) -> Result<Match> {
        self.match_store
            .load(match_id)?
            .ok_or_else(|| match_not_found(match_id))
    }

    /// Transition a WAITING match to ACTIVE
    pub async fn start_match(&self, match_id: MatchId) -> Result<Match> {
        let lock = self.transition_lock(match_id).await;
        let _guard = lock.lock().await;

        let mut m = self
            .match_store
            .load(match_id)?
            .ok_or_else(|| match_not_found(match_id))?;

        if m.status != MatchStatus::Waiting {
            warn!(
                match_id = %match_id,
                status = %m.status,
                "Refusing to start match not in waiting state"
            );
            return Err(ArenaError::InvalidStatus {
                expected: MatchStatus::Waiting,
                actual: m.status,
            }
            .into());
        }

        m.status = MatchStatus::Active;
        m.started_at = Some(current_timestamp());
        self.match_store.save(m.clone())?;

        info!(match_id = %match_id, "Match started");

        self.metrics.record_match_started(m.match_type);
        self.stats.lock().await.matches_started += 1;

        Ok(m)
    }

    /// Submit the result of an ACTIVE match
    ///
    /// Applies rating updates to both participants exactly once; the match
    /// becomes FINISHED and further submissions fail with `InvalidStatus`.
    pub async fn submit_result(
        &self,
        match_id: MatchId,
        winner_id: Option<PlayerId>,
        score_a: i32,
        score_b: i32,
        moves_a: u32,
        moves_b: u32,
    ) -> Result<MatchResultSummary> {
        let lock = self.transition_lock(match_id).await;
        let _guard = lock.lock().await;

        let mut m = self
            .match_store
            .load(match_id)?
            .ok_or_else(|| match_not_found(match_id))?;

        if m.status != MatchStatus::Active {
            warn!(
                match_id = %match_id,
                status = %m.status,
                "Refusing result for match not in active state"
            );
            return Err(ArenaError::InvalidStatus {
                expected: MatchStatus::Active,
                actual: m.status,
            }
            .into());
        }

        if let Some(winner) = &winner_id {
            if !m.has_participant(winner) {
                return Err(ArenaError::InvalidWinner {
                    winner_id: winner.clone(),
                }
                .into());
            }
        }

        let (result_a, result_b) = match &winner_id {
            Some(winner) if *winner == m.player_a => (MatchResult::Win, MatchResult::Loss),
            Some(_) => (MatchResult::Loss, MatchResult::Win),
            None => (MatchResult::Draw, MatchResult::Draw),
        };

        let finished_at = current_timestamp();
        let duration_seconds = match m.started_at {
            Some(started_at) => (finished_at - started_at).num_seconds(),
            None => 0,
        };

        // Both updates derive from the pre-match ratings, so saving one
        // player's row must not feed into the other's expected score
        let rating_a = self.current_rating(&m.player_a, m.season_id)?;
        let rating_b = self.current_rating(&m.player_b, m.season_id)?;
        let change_a = self.apply_rating(&m.player_a, rating_b, m.season_id, result_a)?;
        let change_b = self.apply_rating(&m.player_b, rating_a, m.season_id, result_b)?;

        m.status = MatchStatus::Finished;
        m.winner_id = winner_id.clone();
        m.score_a = score_a;
        m.score_b = score_b;
        m.moves_a = moves_a;
        m.moves_b = moves_b;
        m.finished_at = Some(finished_at);
        m.duration_seconds = duration_seconds;
        self.match_store.save(m.clone())?;

        // FINISHED is terminal, so the transition lock entry can go; any
        // straggler holding the Arc still fails the status check above
        self.locks.lock().await.remove(&match_id);

        info!(
            match_id = %match_id,
            winner = winner_id.as_deref().unwrap_or("draw"),
            delta_a = change_a.delta,
            delta_b = change_b.delta,
            duration_seconds,
            "Match finished"
        );

        let outcome = if winner_id.is_some() { "win" } else { "draw" };
        self.metrics
            .record_match_finished(m.match_type, outcome, duration_seconds);
        self.stats.lock().await.matches_finished += 1;

        Ok(MatchResultSummary {
            match_id,
            status: m.status,
            winner_id,
            duration_seconds,
            rating_changes: RatingChangePair {
                player_a: change_a,
                player_b: change_b,
            },
        })
    }

    /// Get lifecycle statistics
    pub async fn get_stats(&self) -> MatchStats {
        self.stats.lock().await.clone()
    }

    /// Count of matches currently active
    pub fn active_match_count(&self) -> Result<usize> {
        self.match_store.count_by_status(MatchStatus::Active)
    }

    /// Resolve a player's current rating for a season, defaulting to the
    /// initial rating when no row exists yet
    pub fn current_rating(&self, player_id: &PlayerId, season_id: SeasonId) -> Result<i32> {
        Ok(self
            .ranking_store
            .load(player_id, season_id)?
            .map(|r| r.rating)
            .unwrap_or_else(|| self.calculator.initial_rating()))
    }

    /// Apply one match result to a single player's ranking row
    ///
    /// `opponent_rating` is the opponent's rating as of match time.
    fn apply_rating(
        &self,
        player_id: &PlayerId,
        opponent_rating: i32,
        season_id: SeasonId,
        result: MatchResult,
    ) -> Result<RatingChange> {
        let mut ranking = self
            .ranking_store
            .load(player_id, season_id)?
            .unwrap_or_else(|| {
                PlayerRanking::new(
                    player_id.clone(),
                    season_id,
                    self.calculator.initial_rating(),
                )
            });

        let old_rating = ranking.rating;
        let (expected, _) = self.calculator.expected_score(old_rating, opponent_rating);
        let actual = self.calculator.actual_score(result);
        let new_rating =
            self.calculator
                .new_rating(old_rating, expected, actual, ranking.matches_played);

        ranking.apply_result(new_rating, result);
        self.ranking_store.save(ranking)?;

        let delta = new_rating - old_rating;
        debug!(
            player_id = %player_id,
            old_rating,
            new_rating,
            delta,
            "Applied rating update"
        );
        self.metrics.record_rating_update(delta, new_rating);

        Ok(RatingChange {
            player_id: player_id.clone(),
            old_rating,
            new_rating,
            delta,
        })
    }

    /// Get or create the transition lock for a match id
    async fn transition_lock(&self, match_id: MatchId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(match_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn match_not_found(match_id: MatchId) -> anyhow::Error {
    ArenaError::MatchNotFound {
        match_id: match_id.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryMatchStore, InMemoryRankingStore};
    use uuid::Uuid;

    struct Harness {
        lifecycle: MatchLifecycle,
        ranking_store: Arc<InMemoryRankingStore>,
        season_id: SeasonId,
    }

    fn harness() -> Harness {
        let ranking_store = Arc::new(InMemoryRankingStore::new());
        let lifecycle = MatchLifecycle::new(
            Arc::new(InMemoryMatchStore::new()),
            ranking_store.clone(),
            EloCalculator::default(),
            Arc::new(MetricsCollector::new().unwrap()),
        );

        Harness {
            lifecycle,
            ranking_store,
            season_id: Uuid::new_v4(),
        }
    }

    async fn create_active_match(h: &Harness) -> Match {
        let m = h
            .lifecycle
            .create_match(
                "alice".to_string(),
                "bob".to_string(),
                1000,
                1000,
                MatchType::Arena,
                h.season_id,
            )
            .await
            .unwrap();
        h.lifecycle.start_match(m.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_match_initial_state() {
        let h = harness();
        let m = h
            .lifecycle
            .create_match(
                "alice".to_string(),
                "bob".to_string(),
                1000,
                1100,
                MatchType::Duel,
                h.season_id,
            )
            .await
            .unwrap();

        assert_eq!(m.status, MatchStatus::Waiting);
        assert_eq!(m.score_a, 0);
        assert_eq!(m.score_b, 0);
        assert!(m.winner_id.is_none());
        assert!(m.allow_spectate);
        assert_eq!(m.spectator_count, 0);
        assert!(m.started_at.is_none());

        let loaded = h.lifecycle.get_match(m.id).await.unwrap();
        assert_eq!(loaded.id, m.id);
    }

    #[tokio::test]
    async fn test_get_unknown_match_fails() {
        let h = harness();
        let err = h.lifecycle.get_match(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArenaError>(),
            Some(ArenaError::MatchNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_transitions_to_active() {
        let h = harness();
        let m = create_active_match(&h).await;

        assert_eq!(m.status, MatchStatus::Active);
        assert!(m.started_at.is_some());

        // Starting twice is an invalid transition
        let err = h.lifecycle.start_match(m.id).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArenaError>(),
            Some(ArenaError::InvalidStatus {
                expected: MatchStatus::Waiting,
                actual: MatchStatus::Active,
            })
        ));
    }

    #[tokio::test]
    async fn test_submit_result_requires_active() {
        let h = harness();
        let m = h
            .lifecycle
            .create_match(
                "alice".to_string(),
                "bob".to_string(),
                1000,
                1000,
                MatchType::Arena,
                h.season_id,
            )
            .await
            .unwrap();

        let err = h
            .lifecycle
            .submit_result(m.id, Some("alice".to_string()), 3, 1, 0, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArenaError>(),
            Some(ArenaError::InvalidStatus {
                expected: MatchStatus::Active,
                actual: MatchStatus::Waiting,
            })
        ));
    }

    #[tokio::test]
    async fn test_submit_result_rejects_unknown_winner() {
        let h = harness();
        let m = create_active_match(&h).await;

        let err = h
            .lifecycle
            .submit_result(m.id, Some("carol".to_string()), 1, 0, 0, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArenaError>(),
            Some(ArenaError::InvalidWinner { .. })
        ));

        // Match is still active after the rejected submission
        let loaded = h.lifecycle.get_match(m.id).await.unwrap();
        assert_eq!(loaded.status, MatchStatus::Active);
    }

    #[tokio::test]
    async fn test_newbie_win_applies_expected_deltas() {
        let h = harness();
        let m = create_active_match(&h).await;

        let summary = h
            .lifecycle
            .submit_result(m.id, Some("alice".to_string()), 3, 1, 24, 22)
            .await
            .unwrap();

        assert_eq!(summary.status, MatchStatus::Finished);
        assert_eq!(summary.winner_id.as_deref(), Some("alice"));

        // Both at 1000 with 0 matches: K=40, expected 0.5, delta +/-20
        assert_eq!(summary.rating_changes.player_a.old_rating, 1000);
        assert_eq!(summary.rating_changes.player_a.new_rating, 1020);
        assert_eq!(summary.rating_changes.player_a.delta, 20);
        assert_eq!(summary.rating_changes.player_b.new_rating, 980);
        assert_eq!(summary.rating_changes.player_b.delta, -20);

        let winner = h
            .ranking_store
            .load(&"alice".to_string(), h.season_id)
            .unwrap()
            .unwrap();
        assert_eq!(winner.rating, 1020);
        assert_eq!(winner.matches_won, 1);
        assert_eq!(winner.current_streak, 1);

        let loser = h
            .ranking_store
            .load(&"bob".to_string(), h.season_id)
            .unwrap()
            .unwrap();
        assert_eq!(loser.rating, 980);
        assert_eq!(loser.matches_lost, 1);
        assert_eq!(loser.current_streak, -1);

        let loaded = h.lifecycle.get_match(m.id).await.unwrap();
        assert_eq!(loaded.status, MatchStatus::Finished);
        assert_eq!(loaded.score_a, 3);
        assert_eq!(loaded.score_b, 1);
        assert_eq!(loaded.moves_a, 24);
        assert!(loaded.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_updates_use_pre_match_ratings_for_both_players() {
        let h = harness();
        for (player, rating) in [("alice", 1200), ("bob", 1000)] {
            let mut row = PlayerRanking::new(player.to_string(), h.season_id, rating);
            row.matches_played = 50;
            h.ranking_store.save(row).unwrap();
        }
        let m = create_active_match(&h).await;

        let summary = h
            .lifecycle
            .submit_result(m.id, Some("alice".to_string()), 2, 0, 0, 0)
            .await
            .unwrap();

        // Both established (K=32); expected scores come from 1200 vs 1000,
        // so the pair moves by the same magnitude in opposite directions
        assert_eq!(summary.rating_changes.player_a.old_rating, 1200);
        assert_eq!(summary.rating_changes.player_a.new_rating, 1208);
        assert_eq!(summary.rating_changes.player_b.old_rating, 1000);
        assert_eq!(summary.rating_changes.player_b.new_rating, 992);
        assert_eq!(
            summary.rating_changes.player_a.delta + summary.rating_changes.player_b.delta,
            0
        );
    }

    #[tokio::test]
    async fn test_draw_between_equals_leaves_ratings_unchanged() {
        let h = harness();
        let m = create_active_match(&h).await;

        let summary = h.lifecycle.submit_result(m.id, None, 1, 1, 0, 0).await.unwrap();

        assert!(summary.winner_id.is_none());
        assert_eq!(summary.rating_changes.player_a.delta, 0);
        assert_eq!(summary.rating_changes.player_b.delta, 0);

        let row = h
            .ranking_store
            .load(&"alice".to_string(), h.season_id)
            .unwrap()
            .unwrap();
        assert_eq!(row.rating, 1000);
        assert_eq!(row.matches_drawn, 1);
        assert_eq!(row.current_streak, 0);
    }

    #[tokio::test]
    async fn test_double_submission_rejected() {
        let h = harness();
        let m = create_active_match(&h).await;

        h.lifecycle
            .submit_result(m.id, Some("alice".to_string()), 2, 0, 0, 0)
            .await
            .unwrap();

        let err = h
            .lifecycle
            .submit_result(m.id, Some("bob".to_string()), 0, 2, 0, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArenaError>(),
            Some(ArenaError::InvalidStatus {
                expected: MatchStatus::Active,
                actual: MatchStatus::Finished,
            })
        ));

        // Deltas were applied exactly once
        let winner = h
            .ranking_store
            .load(&"alice".to_string(), h.season_id)
            .unwrap()
            .unwrap();
        assert_eq!(winner.rating, 1020);
        assert_eq!(winner.matches_played, 1);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_apply_once() {
        let h = harness();
        let m = create_active_match(&h).await;
        let lifecycle = Arc::new(h.lifecycle);

        let a = {
            let lifecycle = lifecycle.clone();
            let id = m.id;
            tokio::spawn(async move {
                lifecycle
                    .submit_result(id, Some("alice".to_string()), 2, 0, 0, 0)
                    .await
            })
        };
        let b = {
            let lifecycle = lifecycle.clone();
            let id = m.id;
            tokio::spawn(async move {
                lifecycle
                    .submit_result(id, Some("bob".to_string()), 0, 2, 0, 0)
                    .await
            })
        };

        let results = vec![a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        let row = h
            .ranking_store
            .load(&"alice".to_string(), h.season_id)
            .unwrap()
            .unwrap();
        assert_eq!(row.matches_played, 1);
    }

    #[tokio::test]
    async fn test_transition_lock_evicted_after_finish() {
        let h = harness();
        let m = create_active_match(&h).await;
        assert_eq!(h.lifecycle.locks.lock().await.len(), 1);

        h.lifecycle
            .submit_result(m.id, Some("bob".to_string()), 0, 2, 0, 0)
            .await
            .unwrap();
        assert!(h.lifecycle.locks.lock().await.is_empty());

        // A late transition attempt still sees the terminal status
        let err = h.lifecycle.start_match(m.id).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArenaError>(),
            Some(ArenaError::InvalidStatus {
                expected: MatchStatus::Waiting,
                actual: MatchStatus::Finished,
            })
        ));
    }

    #[tokio::test]
    async fn test_stats_track_lifecycle() {
        let h = harness();
        let m = create_active_match(&h).await;
        h.lifecycle
            .submit_result(m.id, None, 0, 0, 0, 0)
            .await
            .unwrap();

        let stats = h.lifecycle.get_stats().await;
        assert_eq!(stats.matches_created, 1);
        assert_eq!(stats.matches_started, 1);
        assert_eq!(stats.matches_finished, 1);
        assert_eq!(h.lifecycle.active_match_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_current_rating_defaults_to_initial() {
        let h = harness();
        assert_eq!(
            h.lifecycle
                .current_rating(&"nobody".to_string(), h.season_id)
                .unwrap(),
            1000
        );
    }
}
