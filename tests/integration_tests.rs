//! End-to-end tests for the matchmaking and rating engine
//!
//! These exercise the full flow: queueing, pairing, match lifecycle,
//! rating updates, spectators, and ranking queries against in-memory
//! stores.

mod fixtures;

use duel_arena::error::ArenaError;
use duel_arena::types::{
    CancelQueueOutcome, JoinQueueOutcome, MatchStatus, MatchType, SpectateOutcome,
};
use fixtures::TestEngine;
use uuid::Uuid;

#[tokio::test]
async fn test_full_match_flow_with_newbie_ratings() {
    let engine = TestEngine::new();

    // Both players are unrated; the second join pairs them
    let first = engine
        .queue
        .join_queue("alice".to_string(), MatchType::Arena, None)
        .await
        .unwrap();
    assert!(matches!(first, JoinQueueOutcome::Queued { position: 1, .. }));

    let second = engine
        .queue
        .join_queue("bob".to_string(), MatchType::Arena, None)
        .await
        .unwrap();
    let match_id = match second {
        JoinQueueOutcome::Matched {
            match_id,
            opponent_id,
        } => {
            assert_eq!(opponent_id, "alice");
            match_id
        }
        other => panic!("Expected Matched, got {other:?}"),
    };
    assert_eq!(engine.queue.queue_depth().await, 0);

    let started = engine.lifecycle.start_match(match_id).await.unwrap();
    assert_eq!(started.status, MatchStatus::Active);

    let summary = engine
        .lifecycle
        .submit_result(match_id, Some("alice".to_string()), 3, 1, 0, 0)
        .await
        .unwrap();

    // K=40 for both (under 30 matches), expected 0.5: +/-20
    assert_eq!(summary.status, MatchStatus::Finished);
    assert_eq!(summary.rating_changes.player_a.new_rating, 1020);
    assert_eq!(summary.rating_changes.player_b.new_rating, 980);

    let winner = engine
        .rankings
        .get_player_ranking(&"alice".to_string(), None)
        .await
        .unwrap();
    assert_eq!(winner.rating, 1020);
    assert_eq!(winner.rank, 1);
    assert_eq!(winner.current_streak, 1);
    assert!((winner.win_rate - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_double_join_returns_already_queued() {
    let engine = TestEngine::new();

    engine
        .queue
        .join_queue("alice".to_string(), MatchType::Arena, None)
        .await
        .unwrap();
    let second = engine
        .queue
        .join_queue("alice".to_string(), MatchType::Arena, None)
        .await
        .unwrap();

    assert!(matches!(second, JoinQueueOutcome::AlreadyQueued));
    assert_eq!(engine.queue.queue_depth().await, 1);
}

#[tokio::test]
async fn test_cancel_queue_flow() {
    let engine = TestEngine::new();

    engine
        .queue
        .join_queue("alice".to_string(), MatchType::Arena, None)
        .await
        .unwrap();
    assert_eq!(
        engine.queue.cancel_queue(&"alice".to_string()).await.unwrap(),
        CancelQueueOutcome::Cancelled
    );
    assert_eq!(
        engine.queue.cancel_queue(&"alice".to_string()).await.unwrap(),
        CancelQueueOutcome::NotQueued
    );

    // After cancelling, alice can queue again
    let rejoin = engine
        .queue
        .join_queue("alice".to_string(), MatchType::Arena, None)
        .await
        .unwrap();
    assert!(matches!(rejoin, JoinQueueOutcome::Queued { .. }));
}

#[tokio::test]
async fn test_match_type_and_rating_range_gate_pairing() {
    let engine = TestEngine::new();
    engine.seed_rating("strong", 1600);
    engine.seed_rating("weak", 1000);

    engine
        .queue
        .join_queue("strong".to_string(), MatchType::Arena, None)
        .await
        .unwrap();

    // 600 points apart, outside the default 200 range
    let outcome = engine
        .queue
        .join_queue("weak".to_string(), MatchType::Arena, None)
        .await
        .unwrap();
    assert!(matches!(outcome, JoinQueueOutcome::Queued { .. }));

    // Same ratings but different match type also keeps them apart
    engine.seed_rating("dueler", 1600);
    let outcome = engine
        .queue
        .join_queue("dueler".to_string(), MatchType::Duel, None)
        .await
        .unwrap();
    assert!(matches!(outcome, JoinQueueOutcome::Queued { .. }));

    // A wide explicit range pairs with the earliest compatible entry
    engine.seed_rating("flexible", 1300);
    let outcome = engine
        .queue
        .join_queue("flexible".to_string(), MatchType::Arena, Some(400))
        .await
        .unwrap();
    match outcome {
        JoinQueueOutcome::Matched { opponent_id, .. } => assert_eq!(opponent_id, "strong"),
        other => panic!("Expected Matched, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_active_season_blocks_matchmaking() {
    let engine = TestEngine::new();
    engine.season_provider.clear_season();

    let err = engine
        .queue
        .join_queue("alice".to_string(), MatchType::Arena, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ArenaError>(),
        Some(ArenaError::NoActiveSeason)
    ));
}

#[tokio::test]
async fn test_submit_result_invalid_transitions() {
    let engine = TestEngine::new();
    let match_id = engine.pair("alice", "bob").await;

    // Submitting before start fails
    let err = engine
        .lifecycle
        .submit_result(match_id, Some("alice".to_string()), 1, 0, 0, 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ArenaError>(),
        Some(ArenaError::InvalidStatus {
            expected: MatchStatus::Active,
            actual: MatchStatus::Waiting,
        })
    ));

    engine.lifecycle.start_match(match_id).await.unwrap();

    // Winner must be a participant
    let err = engine
        .lifecycle
        .submit_result(match_id, Some("mallory".to_string()), 1, 0, 0, 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ArenaError>(),
        Some(ArenaError::InvalidWinner { .. })
    ));

    // First valid submission wins; the second is rejected
    engine
        .lifecycle
        .submit_result(match_id, Some("alice".to_string()), 1, 0, 0, 0)
        .await
        .unwrap();
    let err = engine
        .lifecycle
        .submit_result(match_id, Some("bob".to_string()), 0, 1, 0, 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ArenaError>(),
        Some(ArenaError::InvalidStatus {
            expected: MatchStatus::Active,
            actual: MatchStatus::Finished,
        })
    ));

    // Ratings reflect exactly one application
    let row = engine
        .rankings
        .get_player_ranking(&"alice".to_string(), None)
        .await
        .unwrap();
    assert_eq!(row.rating, 1020);
    assert_eq!(row.matches_played, 1);
}

#[tokio::test]
async fn test_get_match_unknown_id_fails() {
    let engine = TestEngine::new();

    let err = engine.lifecycle.get_match(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ArenaError>(),
        Some(ArenaError::MatchNotFound { .. })
    ));
}

#[tokio::test]
async fn test_spectator_flow() {
    let engine = TestEngine::new();
    let match_id = engine.active_match("alice", "bob").await;

    let SpectateOutcome::Joined { spectator_id } = engine
        .spectators
        .join_spectate(match_id, "watcher".to_string())
        .await
        .unwrap()
    else {
        panic!("Expected Joined");
    };

    // Second join is idempotent
    let again = engine
        .spectators
        .join_spectate(match_id, "watcher".to_string())
        .await
        .unwrap();
    assert!(matches!(
        again,
        SpectateOutcome::AlreadySpectating { spectator_id: id } if id == spectator_id
    ));

    let active = engine.spectators.list_spectators(match_id).await.unwrap();
    assert_eq!(active.len(), 1);
    let m = engine.lifecycle.get_match(match_id).await.unwrap();
    assert_eq!(m.spectator_count, 1);

    engine.spectators.leave_spectate(spectator_id).await.unwrap();
    let m = engine.lifecycle.get_match(match_id).await.unwrap();
    assert_eq!(m.spectator_count, 0);

    // Once finished, nobody new can join
    engine
        .lifecycle
        .submit_result(match_id, None, 0, 0, 0, 0)
        .await
        .unwrap();
    let err = engine
        .spectators
        .join_spectate(match_id, "latecomer".to_string())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ArenaError>(),
        Some(ArenaError::InvalidStatus { .. })
    ));
}

#[tokio::test]
async fn test_ranking_list_order_and_ranks() {
    let engine = TestEngine::new();
    engine.seed_rating("gold", 1500);
    engine.seed_rating("silver", 1300);
    engine.seed_rating("bronze", 1100);

    let board = engine.rankings.get_ranking_list(None, 10, 0).await.unwrap();
    let players: Vec<&str> = board.iter().map(|v| v.player_id.as_str()).collect();
    assert_eq!(players, vec!["gold", "silver", "bronze"]);
    let ranks: Vec<usize> = board.iter().map(|v| v.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);

    let page = engine.rankings.get_ranking_list(None, 1, 1).await.unwrap();
    assert_eq!(page[0].player_id, "silver");
    assert_eq!(page[0].rank, 2);
}

#[tokio::test]
async fn test_explicit_season_lookup_requires_existing_row() {
    let engine = TestEngine::new();

    let err = engine
        .rankings
        .get_player_ranking(&"nobody".to_string(), Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ArenaError>(),
        Some(ArenaError::RankingNotFound { .. })
    ));
}

#[tokio::test]
async fn test_streaks_across_matches() {
    let engine = TestEngine::new();

    for _ in 0..2 {
        let match_id = engine.active_match("alice", "bob").await;
        engine
            .lifecycle
            .submit_result(match_id, Some("alice".to_string()), 1, 0, 0, 0)
            .await
            .unwrap();
    }
    let match_id = engine.active_match("alice", "bob").await;
    engine
        .lifecycle
        .submit_result(match_id, Some("bob".to_string()), 0, 1, 0, 0)
        .await
        .unwrap();

    let alice = engine
        .rankings
        .get_player_ranking(&"alice".to_string(), None)
        .await
        .unwrap();
    assert_eq!(alice.matches_played, 3);
    assert_eq!(alice.max_streak, 2);
    assert_eq!(alice.current_streak, -1);

    let bob = engine
        .rankings
        .get_player_ranking(&"bob".to_string(), None)
        .await
        .unwrap();
    assert_eq!(bob.current_streak, 1);
}
