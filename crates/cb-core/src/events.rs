//! Events emitted on the notification side channel after successful writes.

use crate::models::{GameOutcome, PostKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommunityEvent {
    ReactionApplied {
        post_id: Uuid,
        user_id: Uuid,
        likes: i64,
        dislikes: i64,
    },
    CommentAdded {
        post_id: Uuid,
        post_kind: PostKind,
        comment_id: Uuid,
        author_id: Uuid,
    },
    ResultRecorded {
        player_id: Uuid,
        post_id: Uuid,
        outcome: GameOutcome,
        points: i64,
    },
    ItemPurchased {
        account_id: Uuid,
        item_id: Uuid,
        balance: i64,
    },
}
