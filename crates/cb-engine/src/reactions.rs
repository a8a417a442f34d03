//! # Reaction Service
//!
//! Thin orchestration over the reaction ledger port: validates the
//! requested kind, delegates the atomic apply, and emits the broadcast
//! event after the write lands.

use cb_core::error::{CoreError, Result};
use cb_core::events::CommunityEvent;
use cb_core::models::{ReactionKind, ReactionReceipt, ReactionRecord};
use cb_core::traits::{CommunityStore, EventSink};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ReactionService {
    store: Arc<dyn CommunityStore>,
    events: Arc<dyn EventSink>,
}

impl ReactionService {
    pub fn new(store: Arc<dyn CommunityStore>, events: Arc<dyn EventSink>) -> Self {
        Self { store, events }
    }

    /// Applies `kind` ("like" / "dislike") from `user_id` to `post_id`
    /// and returns the reconciled counters. Repeating the current kind
    /// toggles it off.
    pub async fn apply(&self, user_id: Uuid, post_id: Uuid, kind: &str) -> Result<ReactionReceipt> {
        let kind: ReactionKind = kind
            .parse()
            .map_err(|()| CoreError::InvalidReactionKind(kind.to_string()))?;

        let receipt = self.store.apply_reaction(user_id, post_id, kind).await?;

        tracing::debug!(
            %user_id,
            %post_id,
            kind = kind.as_str(),
            likes = receipt.likes,
            dislikes = receipt.dislikes,
            "reaction applied"
        );
        self.events.emit(CommunityEvent::ReactionApplied {
            post_id,
            user_id,
            likes: receipt.likes,
            dislikes: receipt.dislikes,
        });
        Ok(receipt)
    }

    /// The caller's current reaction on a post, if any.
    pub async fn current(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<ReactionRecord>> {
        self.store.get_reaction(user_id, post_id).await
    }
}
