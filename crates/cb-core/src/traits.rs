//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the binary.
//! Methods documented as atomic must execute as one transactional unit:
//! partial effects (e.g., a debited balance without an ownership record)
//! are ledger corruption.

use crate::error::Result;
use crate::events::CommunityEvent;
use crate::models::{
    Account, Comment, MinigameResult, Post, PostKind, PurchaseReceipt, ReactionKind,
    ReactionReceipt, ReactionRecord, ShopItem,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence contract for posts, reactions, and comments.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait CommunityStore: Send + Sync {
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>>;

    async fn get_reaction(&self, user_id: Uuid, post_id: Uuid)
        -> Result<Option<ReactionRecord>>;

    /// Applies a reaction atomically: resolves the transition against the
    /// existing record (see [`crate::rules::reaction_transition`]), writes
    /// the record change and both counter deltas as one unit, and returns
    /// the fresh counters. Concurrent applications for the same post must
    /// serialize so counters never drift from the record set.
    async fn apply_reaction(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        kind: ReactionKind,
    ) -> Result<ReactionReceipt>;

    async fn add_comment(&self, comment: Comment) -> Result<()>;

    /// Comments for a post, newest first.
    async fn comments_for_post(&self, post_id: Uuid, post_kind: PostKind)
        -> Result<Vec<Comment>>;
}

/// Persistence contract for the points-and-shop ledger.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    async fn get_item(&self, id: Uuid) -> Result<Option<ShopItem>>;

    async fn list_items(&self) -> Result<Vec<ShopItem>>;

    /// Items the account owns, resolved to catalog entries.
    async fn owned_items(&self, account_id: Uuid) -> Result<Vec<ShopItem>>;

    /// Whether a result already exists for (player, post).
    async fn has_result(&self, player_id: Uuid, post_id: Uuid) -> Result<bool>;

    /// Persists a finished minigame result and credits its points to the
    /// player's balance as one atomic unit. Returns the new balance.
    async fn record_result(&self, result: MinigameResult) -> Result<i64>;

    /// Validates and executes a purchase atomically: ownership check,
    /// funds check (see [`crate::rules::check_purchase`]), balance debit,
    /// and purchase-record insert all succeed together or not at all.
    async fn purchase(&self, account_id: Uuid, item_id: Uuid) -> Result<PurchaseReceipt>;
}

/// Broadcast side channel for the notification stream.
///
/// Emission is fire-and-forget and happens after a successful
/// transactional write; delivery is at-least-once with no ordering
/// guarantee, and is never part of the ledger's correctness contract.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CommunityEvent);
}
