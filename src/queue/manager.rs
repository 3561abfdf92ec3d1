//! Matchmaking queue manager
//!
//! Holds the in-process list of waiting players and runs the first-fit
//! compatibility scan on every join. The whole enqueue/scan/dequeue
//! sequence runs under one lock so two concurrent joins can neither claim
//! the same waiting opponent nor double-queue a player.

use crate::config::MatchmakingSettings;
use crate::error::Result;
use crate::matches::MatchLifecycle;
use crate::metrics::MetricsCollector;
use crate::season::SeasonProvider;
use crate::types::{CancelQueueOutcome, JoinQueueOutcome, MatchType, PlayerId, QueueEntry};
use crate::utils::current_timestamp;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Statistics about queue activity
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub total_joins: u64,
    pub total_matches_made: u64,
    pub total_cancellations: u64,
    pub players_waiting: usize,
}

/// Manages the matchmaking queue
pub struct QueueManager {
    /// Waiting players in insertion order
    entries: Mutex<Vec<QueueEntry>>,

    /// Active season lookup; matchmaking refuses to run without one
    season_provider: Arc<dyn SeasonProvider>,

    /// Match creation on a successful pairing
    lifecycle: Arc<MatchLifecycle>,

    /// Matchmaking settings
    settings: MatchmakingSettings,

    /// Queue statistics
    stats: Mutex<QueueStats>,

    /// Metrics collector
    metrics: Arc<MetricsCollector>,
}

impl QueueManager {
    /// Create a new queue manager
    pub fn new(
        season_provider: Arc<dyn SeasonProvider>,
        lifecycle: Arc<MatchLifecycle>,
        settings: MatchmakingSettings,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            season_provider,
            lifecycle,
            settings,
            stats: Mutex::new(QueueStats::default()),
            metrics,
        }
    }

    /// Join the matchmaking queue
    ///
    /// Pairs the requester with the earliest waiting player of the same
    /// match type whose rating falls within the requester's range. When no
    /// opponent qualifies the requester is appended to the queue.
    pub async fn join_queue(
        &self,
        player_id: PlayerId,
        match_type: MatchType,
        rating_range: Option<i32>,
    ) -> Result<JoinQueueOutcome> {
        let timer = self.metrics.start_timer();
        let rating_range = rating_range.unwrap_or(self.settings.default_rating_range);

        let season = self.season_provider.active_season()?;
        let rating = self.lifecycle.current_rating(&player_id, season.id)?;

        let mut entries = self.entries.lock().await;

        if entries.iter().any(|e| e.player_id == player_id) {
            debug!(player_id = %player_id, "Player already queued");
            self.metrics
                .record_join_queue(match_type, "already_queued", timer.stop());
            return Ok(JoinQueueOutcome::AlreadyQueued);
        }

        // First fit in insertion order, gated by the requester's range only
        let found = entries.iter().position(|e| {
            e.match_type == match_type && (e.rating - rating).abs() <= rating_range
        });

        let outcome = if let Some(index) = found {
            let candidate = entries.remove(index);

            let created = self
                .lifecycle
                .create_match(
                    candidate.player_id.clone(),
                    player_id.clone(),
                    candidate.rating,
                    rating,
                    match_type,
                    season.id,
                )
                .await;

            let m = match created {
                Ok(m) => m,
                Err(e) => {
                    // Put the opponent back where they were waiting
                    let pos = index.min(entries.len());
                    entries.insert(pos, candidate);
                    return Err(e);
                }
            };

            info!(
                match_id = %m.id,
                player = %player_id,
                opponent = %candidate.player_id,
                rating,
                opponent_rating = candidate.rating,
                "Matched players from queue"
            );

            self.stats.lock().await.total_matches_made += 1;
            self.metrics
                .record_join_queue(match_type, "matched", timer.stop());

            JoinQueueOutcome::Matched {
                match_id: m.id,
                opponent_id: candidate.player_id,
            }
        } else {
            entries.push(QueueEntry {
                player_id: player_id.clone(),
                rating,
                queued_at: current_timestamp(),
                match_type,
                rating_range,
            });

            let position = entries.len();
            let estimated_wait_seconds =
                position as u64 * self.settings.wait_estimate_seconds_per_entry;

            info!(
                player_id = %player_id,
                match_type = %match_type,
                rating,
                rating_range,
                position,
                "Player queued"
            );

            self.metrics
                .record_join_queue(match_type, "queued", timer.stop());

            JoinQueueOutcome::Queued {
                position,
                estimated_wait_seconds,
            }
        };

        self.metrics.set_players_waiting(entries.len());

        let mut stats = self.stats.lock().await;
        stats.total_joins += 1;
        stats.players_waiting = entries.len();

        Ok(outcome)
    }

    /// Remove a player's queue entry if present
    pub async fn cancel_queue(&self, player_id: &PlayerId) -> Result<CancelQueueOutcome> {
        let mut entries = self.entries.lock().await;

        let outcome = match entries.iter().position(|e| &e.player_id == player_id) {
            Some(index) => {
                entries.remove(index);
                info!(player_id = %player_id, "Cancelled queue entry");
                CancelQueueOutcome::Cancelled
            }
            None => {
                debug!(player_id = %player_id, "Cancel for player not in queue");
                CancelQueueOutcome::NotQueued
            }
        };

        self.metrics.set_players_waiting(entries.len());
        self.metrics.record_cancel_queue(match outcome {
            CancelQueueOutcome::Cancelled => "cancelled",
            CancelQueueOutcome::NotQueued => "not_queued",
        });

        let mut stats = self.stats.lock().await;
        if outcome == CancelQueueOutcome::Cancelled {
            stats.total_cancellations += 1;
        }
        stats.players_waiting = entries.len();

        Ok(outcome)
    }

    /// Number of players currently waiting
    pub async fn queue_depth(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Get queue statistics
    pub async fn get_stats(&self) -> QueueStats {
        self.stats.lock().await.clone()
    }
}
