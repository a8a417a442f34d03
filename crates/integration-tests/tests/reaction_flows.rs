//! Reaction flows driven through the service layer against the
//! in-memory store, including broadcast event delivery.

use cb_core::error::CoreError;
use cb_core::events::CommunityEvent;
use cb_core::models::{Post, PostKind, ReactionKind};
use cb_engine::{BroadcastSink, ReactionService};
use cb_store_memory::MemoryStore;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

fn seeded_post(store: &MemoryStore) -> Uuid {
    let post = Post {
        id: Uuid::now_v7(),
        kind: PostKind::Announcement,
        author_id: Uuid::now_v7(),
        body: "midterm bake sale".to_string(),
        media: None,
        created_at: Utc::now(),
        likes: 0,
        dislikes: 0,
        minigame: None,
    };
    let id = post.id;
    store.insert_post(post);
    id
}

#[tokio::test]
async fn like_toggle_like_round_trips() {
    let store = Arc::new(MemoryStore::new());
    let post_id = seeded_post(&store);
    let service = ReactionService::new(store.clone(), Arc::new(BroadcastSink::new(16)));
    let user = Uuid::now_v7();

    let receipt = service.apply(user, post_id, "like").await.unwrap();
    assert_eq!((receipt.likes, receipt.dislikes), (1, 0));
    assert_eq!(receipt.current, Some(ReactionKind::Like));

    let receipt = service.apply(user, post_id, "like").await.unwrap();
    assert_eq!((receipt.likes, receipt.dislikes), (0, 0));
    assert_eq!(receipt.current, None);
    assert!(service.current(user, post_id).await.unwrap().is_none());

    let receipt = service.apply(user, post_id, "like").await.unwrap();
    assert_eq!((receipt.likes, receipt.dislikes), (1, 0));
}

#[tokio::test]
async fn switching_kind_moves_the_unit_between_counters() {
    let store = Arc::new(MemoryStore::new());
    let post_id = seeded_post(&store);
    let service = ReactionService::new(store.clone(), Arc::new(BroadcastSink::new(16)));
    let user = Uuid::now_v7();

    service.apply(user, post_id, "like").await.unwrap();
    let receipt = service.apply(user, post_id, "dislike").await.unwrap();
    assert_eq!((receipt.likes, receipt.dislikes), (0, 1));
    assert_eq!(receipt.current, Some(ReactionKind::Dislike));
}

#[tokio::test]
async fn two_users_count_independently() {
    let store = Arc::new(MemoryStore::new());
    let post_id = seeded_post(&store);
    let service = ReactionService::new(store.clone(), Arc::new(BroadcastSink::new(16)));

    service.apply(Uuid::now_v7(), post_id, "like").await.unwrap();
    let receipt = service
        .apply(Uuid::now_v7(), post_id, "dislike")
        .await
        .unwrap();
    assert_eq!((receipt.likes, receipt.dislikes), (1, 1));
}

#[tokio::test]
async fn applied_reactions_reach_broadcast_subscribers() {
    let store = Arc::new(MemoryStore::new());
    let post_id = seeded_post(&store);
    let sink = Arc::new(BroadcastSink::new(16));
    let mut rx = sink.subscribe();
    let service = ReactionService::new(store.clone(), sink);
    let user = Uuid::now_v7();

    service.apply(user, post_id, "like").await.unwrap();

    let event = rx.try_recv().unwrap();
    assert_eq!(
        event,
        CommunityEvent::ReactionApplied {
            post_id,
            user_id: user,
            likes: 1,
            dislikes: 0,
        }
    );
}

#[tokio::test]
async fn unknown_kind_and_unknown_post_fail_cleanly() {
    let store = Arc::new(MemoryStore::new());
    let post_id = seeded_post(&store);
    let service = ReactionService::new(store.clone(), Arc::new(BroadcastSink::new(16)));

    let err = service
        .apply(Uuid::now_v7(), post_id, "meow")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidReactionKind(_)));

    let err = service
        .apply(Uuid::now_v7(), Uuid::now_v7(), "like")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PostNotFound(_)));
}
