//! Error types for the arena engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

use crate::types::MatchStatus;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Caller-visible error taxonomy for arena operations
///
/// These are surfaced as typed failures and never retried internally;
/// retry policy belongs to the calling layer. Infrastructure failures
/// (lock poisoning, configuration problems) use the opaque variants.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("no active season")]
    NoActiveSeason,

    #[error("match not found: {match_id}")]
    MatchNotFound { match_id: String },

    #[error("invalid match status: expected {expected}, found {actual}")]
    InvalidStatus {
        expected: MatchStatus,
        actual: MatchStatus,
    },

    #[error("invalid winner: {winner_id} is not a participant")]
    InvalidWinner { winner_id: String },

    #[error("spectating not allowed for match: {match_id}")]
    SpectateNotAllowed { match_id: String },

    #[error("ranking not found for player: {player_id}")]
    RankingNotFound { player_id: String },

    #[error("configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("internal engine error: {message}")]
    InternalError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ArenaError::InvalidStatus {
            expected: MatchStatus::Active,
            actual: MatchStatus::Finished,
        };
        assert_eq!(
            err.to_string(),
            "invalid match status: expected active, found finished"
        );

        let err = ArenaError::MatchNotFound {
            match_id: "abc".to_string(),
        };
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = ArenaError::NoActiveSeason.into();
        assert!(matches!(
            err.downcast_ref::<ArenaError>(),
            Some(ArenaError::NoActiveSeason)
        ));
    }
}
