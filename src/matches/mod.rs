//! Match lifecycle management
//!
//! Owns the WAITING -> ACTIVE -> FINISHED state machine and the rating
//! updates derived from submitted results.

pub mod lifecycle;

pub use lifecycle::{MatchLifecycle, MatchStats};
