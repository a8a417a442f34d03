//! # Domain Models
//!
//! These structs represent the core entities of Clawboard.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Which surface a post belongs to. Announcements come from staff,
/// forum posts from community members; both carry the same reaction
/// and comment machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Announcement,
    Forum,
}

/// The two embedded minigames a post may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    WordGuess,
    ObstacleRun,
}

/// Minigame descriptor embedded in a post. `secret_word` is set for
/// word-guess games and absent for the obstacle runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinigameSpec {
    pub kind: GameKind,
    pub secret_word: Option<String>,
}

/// Reference to an uploaded media object. Storage and delivery are
/// handled elsewhere; the core only carries the pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub media_id: String,
    pub content_type: String,
}

/// A content item that can carry reactions, comments, and optionally
/// a minigame.
///
/// `likes` / `dislikes` are derived data: they must always equal the
/// count of [`ReactionRecord`]s referencing this post with the
/// corresponding kind. Only the reaction ledger mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub kind: PostKind,
    pub author_id: Uuid,
    pub body: String,
    pub media: Option<MediaRef>,
    pub created_at: DateTime<Utc>,
    pub likes: i64,
    pub dislikes: i64,
    pub minigame: Option<MinigameSpec>,
}

/// The two reaction kinds a user can place on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }
}

impl FromStr for ReactionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "dislike" => Ok(ReactionKind::Dislike),
            _ => Err(()),
        }
    }
}

/// One user's reaction to one post. At most one record exists per
/// (user, post) pair; repeated reactions update or remove it rather
/// than inserting a second row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub kind: ReactionKind,
    pub reacted_at: DateTime<Utc>,
}

/// Returned by the reaction ledger so the caller can reconcile its
/// local view: the fresh counters plus the user's surviving reaction
/// (None after a toggle-off).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionReceipt {
    pub post_id: Uuid,
    pub likes: i64,
    pub dislikes: i64,
    pub current: Option<ReactionKind>,
}

/// Append-only text comment keyed by (post, post kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub post_kind: PostKind,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Role discriminant on an account. The reference system kept two
/// parallel person entities; here a single account carries a role
/// instead, so every ledger operation addresses "an account".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Staff,
    Member,
}

/// A person, staff or member, with their claw-marks balance.
///
/// Invariant: `claw_marks >= 0` at all times. The only mutators are
/// the result credit and the purchase debit, and the debit is refused
/// when it would drive the balance negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub role: AccountRole,
    pub claw_marks: i64,
    pub created_at: DateTime<Utc>,
}

/// Terminal outcome of a finished minigame session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Won,
    Lost,
}

/// Game-specific statistics, tagged by game so scoring and persistence
/// can match exhaustively instead of probing an untyped stats bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameStats {
    WordGuess { guesses: u32 },
    ObstacleRun { tries: u32 },
}

impl GameStats {
    pub fn kind(&self) -> GameKind {
        match self {
            GameStats::WordGuess { .. } => GameKind::WordGuess,
            GameStats::ObstacleRun { .. } => GameKind::ObstacleRun,
        }
    }
}

/// The immutable, persisted outcome of a finished minigame session.
/// Writing one credits `points` to the player's balance in the same
/// transactional unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinigameResult {
    pub id: Uuid,
    pub player_id: Uuid,
    pub post_id: Uuid,
    pub outcome: GameOutcome,
    pub points: i64,
    pub stats: GameStats,
    pub played_at: DateTime<Utc>,
}

/// Immutable catalog entry; created by admin tooling out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub media_id: Option<String>,
}

/// Ownership marker. Presence of the record is the "owned" flag; at
/// most one exists per (account, item).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub account_id: Uuid,
    pub item_id: Uuid,
    pub purchased_at: DateTime<Utc>,
}

/// Returned by a successful purchase: the debited balance plus the
/// ownership confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub account_id: Uuid,
    pub item_id: Uuid,
    pub balance: i64,
}
