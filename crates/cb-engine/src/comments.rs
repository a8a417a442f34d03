//! # Comment Service
//!
//! Append-only comments keyed by (post, post kind). No edit or delete;
//! listing is newest-first.

use cb_core::error::{CoreError, Result};
use cb_core::events::CommunityEvent;
use cb_core::models::{Comment, PostKind};
use cb_core::traits::{CommunityStore, EventSink};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn CommunityStore>,
    events: Arc<dyn EventSink>,
}

impl CommentService {
    pub fn new(store: Arc<dyn CommunityStore>, events: Arc<dyn EventSink>) -> Self {
        Self { store, events }
    }

    pub async fn add(
        &self,
        post_id: Uuid,
        post_kind: PostKind,
        author_id: Uuid,
        text: &str,
    ) -> Result<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::Validation("comment text is empty".to_string()));
        }
        self.store
            .get_post(post_id)
            .await?
            .ok_or(CoreError::PostNotFound(post_id))?;

        let comment = Comment {
            id: Uuid::now_v7(),
            post_id,
            post_kind,
            author_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.store.add_comment(comment.clone()).await?;

        self.events.emit(CommunityEvent::CommentAdded {
            post_id,
            post_kind,
            comment_id: comment.id,
            author_id,
        });
        Ok(comment)
    }

    /// Comments for a post, newest first.
    pub async fn list(&self, post_id: Uuid, post_kind: PostKind) -> Result<Vec<Comment>> {
        self.store.comments_for_post(post_id, post_kind).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_core::models::{Post, PostKind};
    use cb_core::traits::{MockCommunityStore, MockEventSink};

    fn bare_post(id: Uuid) -> Post {
        Post {
            id,
            kind: PostKind::Forum,
            author_id: Uuid::now_v7(),
            body: "study group tonight?".to_string(),
            media: None,
            created_at: Utc::now(),
            likes: 0,
            dislikes: 0,
            minigame: None,
        }
    }

    #[tokio::test]
    async fn empty_text_never_reaches_the_store() {
        let mut store = MockCommunityStore::new();
        store.expect_add_comment().never();
        let service = CommentService::new(Arc::new(store), Arc::new(MockEventSink::new()));

        let err = service
            .add(Uuid::now_v7(), PostKind::Forum, Uuid::now_v7(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn comment_on_missing_post_fails() {
        let mut store = MockCommunityStore::new();
        store.expect_get_post().returning(|_| Ok(None));
        store.expect_add_comment().never();
        let service = CommentService::new(Arc::new(store), Arc::new(MockEventSink::new()));

        let err = service
            .add(Uuid::now_v7(), PostKind::Forum, Uuid::now_v7(), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn add_trims_persists_and_emits() {
        let post_id = Uuid::now_v7();
        let mut store = MockCommunityStore::new();
        store
            .expect_get_post()
            .returning(|id| Ok(Some(bare_post(id))));
        store
            .expect_add_comment()
            .times(1)
            .withf(|comment| comment.text == "see you there")
            .returning(|_| Ok(()));
        let mut events = MockEventSink::new();
        events
            .expect_emit()
            .times(1)
            .withf(move |event| {
                matches!(event, CommunityEvent::CommentAdded { post_id: p, .. } if *p == post_id)
            })
            .return_const(());
        let service = CommentService::new(Arc::new(store), Arc::new(events));

        let comment = service
            .add(post_id, PostKind::Forum, Uuid::now_v7(), "  see you there  ")
            .await
            .unwrap();
        assert_eq!(comment.post_id, post_id);
    }
}
