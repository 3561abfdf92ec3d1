//! Spectator tracking for non-finished matches
//!
//! Records who is watching a match and keeps the match's live spectator
//! count in step. Leaving is a logical delete: the record stays but gets
//! a `left_at` timestamp.

use crate::error::{ArenaError, Result};
use crate::metrics::MetricsCollector;
use crate::storage::{MatchStore, SpectatorStore};
use crate::types::{
    MatchId, MatchStatus, PlayerId, SpectateOutcome, SpectatorId, SpectatorRecord,
};
use crate::utils::{current_timestamp, generate_spectator_id};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Tracks spectators per match
pub struct SpectatorRegistry {
    /// Spectator record persistence
    spectator_store: Arc<dyn SpectatorStore>,

    /// Match persistence, for gating and count updates
    match_store: Arc<dyn MatchStore>,

    /// Serializes join/leave so counts stay consistent
    lock: Mutex<()>,

    /// Metrics collector
    metrics: Arc<MetricsCollector>,
}

impl SpectatorRegistry {
    /// Create a new spectator registry
    pub fn new(
        spectator_store: Arc<dyn SpectatorStore>,
        match_store: Arc<dyn MatchStore>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            spectator_store,
            match_store,
            lock: Mutex::new(()),
            metrics,
        }
    }

    /// Start spectating a match
    ///
    /// Idempotent per (match, player): a repeat join returns the existing
    /// record id instead of creating a second one.
    pub async fn join_spectate(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
    ) -> Result<SpectateOutcome> {
        let _guard = self.lock.lock().await;

        let mut m = self
            .match_store
            .load(match_id)?
            .ok_or_else(|| ArenaError::MatchNotFound {
                match_id: match_id.to_string(),
            })?;

        if !m.allow_spectate {
            return Err(ArenaError::SpectateNotAllowed {
                match_id: match_id.to_string(),
            }
            .into());
        }

        if m.status == MatchStatus::Finished {
            return Err(ArenaError::InvalidStatus {
                expected: MatchStatus::Active,
                actual: m.status,
            }
            .into());
        }

        if let Some(existing) = self.spectator_store.find_active(match_id, &player_id)? {
            debug!(
                match_id = %match_id,
                player_id = %player_id,
                "Player already spectating"
            );
            return Ok(SpectateOutcome::AlreadySpectating {
                spectator_id: existing.id,
            });
        }

        let record = SpectatorRecord {
            id: generate_spectator_id(),
            match_id,
            player_id: player_id.clone(),
            joined_at: current_timestamp(),
            left_at: None,
        };
        let spectator_id = record.id;
        self.spectator_store.save(record)?;

        m.spectator_count += 1;
        self.match_store.save(m)?;

        info!(
            match_id = %match_id,
            player_id = %player_id,
            spectator_id = %spectator_id,
            "Spectator joined"
        );
        self.metrics.record_spectator_joined();

        Ok(SpectateOutcome::Joined { spectator_id })
    }

    /// Stop spectating
    ///
    /// A no-op when the record is unknown or already left.
    pub async fn leave_spectate(&self, spectator_id: SpectatorId) -> Result<()> {
        let _guard = self.lock.lock().await;

        let Some(mut record) = self.spectator_store.load(spectator_id)? else {
            debug!(spectator_id = %spectator_id, "Leave for unknown spectator record");
            return Ok(());
        };
        if !record.is_active() {
            return Ok(());
        }

        record.left_at = Some(current_timestamp());
        let match_id = record.match_id;
        self.spectator_store.save(record)?;

        if let Some(mut m) = self.match_store.load(match_id)? {
            m.spectator_count = m.spectator_count.saturating_sub(1);
            self.match_store.save(m)?;
        }

        info!(spectator_id = %spectator_id, match_id = %match_id, "Spectator left");
        self.metrics.record_spectator_left();

        Ok(())
    }

    /// List active spectators of a match, oldest first
    pub async fn list_spectators(&self, match_id: MatchId) -> Result<Vec<SpectatorRecord>> {
        self.spectator_store.list_active(match_id)
    }
}
