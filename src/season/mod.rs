//! Season context for scoping ratings
//!
//! Every ranking row is keyed by (player, season); matchmaking refuses to
//! run without an active season. Providers abstract where the season
//! definition comes from.

use crate::error::{ArenaError, Result};
use crate::types::SeasonId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

/// A rating season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    /// Open-ended when None
    pub ends_at: Option<DateTime<Utc>>,
}

impl Season {
    /// Create an open-ended season starting now
    pub fn starting_now(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            starts_at: Utc::now(),
            ends_at: None,
        }
    }
}

/// Read-only lookup of the currently active season
pub trait SeasonProvider: Send + Sync {
    /// Get the active season, failing with `NoActiveSeason` when there is none
    fn active_season(&self) -> Result<Season>;
}

/// Provider backed by a single season fixed at construction
///
/// Used by the production wiring: the season lives for the process
/// lifetime.
#[derive(Debug)]
pub struct StaticSeasonProvider {
    season: Season,
}

impl StaticSeasonProvider {
    pub fn new(season: Season) -> Self {
        Self { season }
    }
}

impl SeasonProvider for StaticSeasonProvider {
    fn active_season(&self) -> Result<Season> {
        Ok(self.season.clone())
    }
}

/// Mock provider with a settable season, for tests
#[derive(Debug, Default)]
pub struct MockSeasonProvider {
    season: RwLock<Option<Season>>,
}

impl MockSeasonProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider already holding an active season
    pub fn with_season(season: Season) -> Self {
        Self {
            season: RwLock::new(Some(season)),
        }
    }

    /// Set or replace the active season
    pub fn set_season(&self, season: Season) {
        if let Ok(mut guard) = self.season.write() {
            *guard = Some(season);
        }
    }

    /// Remove the active season so lookups fail
    pub fn clear_season(&self) {
        if let Ok(mut guard) = self.season.write() {
            *guard = None;
        }
    }
}

impl SeasonProvider for MockSeasonProvider {
    fn active_season(&self) -> Result<Season> {
        let guard = self
            .season
            .read()
            .map_err(|_| ArenaError::InternalError {
                message: "Failed to acquire season lock".to_string(),
            })?;

        guard.clone().ok_or_else(|| ArenaError::NoActiveSeason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArenaError;

    #[test]
    fn test_static_provider_always_active() {
        let season = Season::starting_now("Season 1");
        let provider = StaticSeasonProvider::new(season.clone());

        let active = provider.active_season().unwrap();
        assert_eq!(active.id, season.id);
        assert_eq!(active.name, "Season 1");
        assert!(active.ends_at.is_none());
    }

    #[test]
    fn test_mock_provider_empty_fails() {
        let provider = MockSeasonProvider::new();
        let err = provider.active_season().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArenaError>(),
            Some(ArenaError::NoActiveSeason)
        ));
    }

    #[test]
    fn test_mock_provider_set_and_clear() {
        let provider = MockSeasonProvider::new();
        provider.set_season(Season::starting_now("Test Season"));
        assert!(provider.active_season().is_ok());

        provider.clear_season();
        assert!(provider.active_season().is_err());
    }
}
