//! # CoreError
//!
//! Centralized error handling for the Clawboard ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;
use uuid::Uuid;

/// The primary error type for all cb-core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Reaction/comment/minigame target does not exist.
    #[error("post not found: {0}")]
    PostNotFound(Uuid),

    /// Ledger operation addressed an unknown account.
    #[error("account not found: {0}")]
    AccountNotFound(Uuid),

    /// Reaction kind outside {like, dislike}.
    #[error("invalid reaction kind: {0:?}")]
    InvalidReactionKind(String),

    /// Validation failure (e.g., empty comment text, missing secret word).
    #[error("validation error: {0}")]
    Validation(String),

    /// The post exists but carries no minigame descriptor.
    #[error("post {0} has no minigame attached")]
    NoMinigame(Uuid),

    /// The player already holds a result for this post; replays are refused.
    #[error("player {player_id} already played the minigame on post {post_id}")]
    AlreadyPlayed { player_id: Uuid, post_id: Uuid },

    /// Input routed to a minigame the player never opened.
    #[error("player {player_id} has no open session on post {post_id}")]
    SessionNotFound { player_id: Uuid, post_id: Uuid },

    /// Purchase references an unknown shop item.
    #[error("shop item not found: {0}")]
    ItemNotFound(Uuid),

    /// Purchase of an item the account already holds.
    #[error("item already owned: {0}")]
    AlreadyOwned(Uuid),

    /// Purchase price exceeds the claw-marks balance.
    #[error("insufficient claw marks: price {price}, balance {balance}")]
    InsufficientFunds { price: i64, balance: i64 },

    /// Infrastructure failure (e.g., store unavailable). Never swallowed:
    /// a lost reaction write or balance debit would corrupt the ledger.
    #[error("internal store error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wraps a storage-layer failure for propagation.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        CoreError::Internal(err.to_string())
    }
}

/// A specialized Result type for Clawboard logic.
pub type Result<T> = std::result::Result<T, CoreError>;
