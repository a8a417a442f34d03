//! # Clawboard Binary
//!
//! The entry point that assembles the application based on compile-time
//! features: one store plugin serves both the community and ledger ports.

use cb_api::AppState;
use cb_core::traits::{CommunityStore, LedgerStore};
use cb_engine::runner::RunnerConfig;
use cb_engine::{
    BroadcastSink, CommentService, GameConfig, ReactionService, SessionManager, ShopService,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "store-sqlite")]
use cb_store_sqlite::SqliteStore;

#[cfg(feature = "store-memory")]
use cb_store_memory::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = cb_configs::Settings::load()?;

    // 1. Initialize the store implementation
    #[cfg(feature = "store-sqlite")]
    let store = Arc::new(SqliteStore::connect(&settings.store.url).await?);

    #[cfg(all(feature = "store-memory", not(feature = "store-sqlite")))]
    let store = {
        let store = Arc::new(MemoryStore::new());
        seed_demo_content(&store);
        store
    };

    let community: Arc<dyn CommunityStore> = store.clone();
    let ledger: Arc<dyn LedgerStore> = store;

    // 2. Assemble the services over the ports
    let events = Arc::new(BroadcastSink::new(256));
    let game_cfg = GameConfig {
        word_max_attempts: settings.game.word_max_attempts,
        runner: RunnerConfig {
            attempts: settings.game.runner_attempts,
            obstacle_count: settings.game.obstacle_count,
            ..RunnerConfig::default()
        },
    };

    let state = AppState {
        community: community.clone(),
        reactions: ReactionService::new(community.clone(), events.clone()),
        comments: CommentService::new(community.clone(), events.clone()),
        sessions: SessionManager::new(community, ledger.clone(), events.clone(), game_cfg),
        shop: ShopService::new(ledger, events),
    };

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!(%addr, "clawboard starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, cb_api::router(state)).await?;
    Ok(())
}

/// Fixed demo rows so the in-memory build is usable out of the box.
#[cfg(all(feature = "store-memory", not(feature = "store-sqlite")))]
fn seed_demo_content(store: &MemoryStore) {
    use cb_core::models::{
        Account, AccountRole, GameKind, MinigameSpec, Post, PostKind, ShopItem,
    };
    use uuid::uuid;

    let staff = uuid!("00000000-0000-7000-8000-000000000001");
    store.insert_account(Account {
        id: staff,
        username: "campus-life".to_string(),
        role: AccountRole::Staff,
        claw_marks: 0,
        created_at: chrono::Utc::now(),
    });
    store.insert_account(Account {
        id: uuid!("00000000-0000-7000-8000-000000000002"),
        username: "demo-student".to_string(),
        role: AccountRole::Member,
        claw_marks: 0,
        created_at: chrono::Utc::now(),
    });

    store.insert_post(Post {
        id: uuid!("00000000-0000-7000-8000-0000000000a1"),
        kind: PostKind::Announcement,
        author_id: staff,
        body: "Guess this week's word to earn claw marks!".to_string(),
        media: None,
        created_at: chrono::Utc::now(),
        likes: 0,
        dislikes: 0,
        minigame: Some(MinigameSpec {
            kind: GameKind::WordGuess,
            secret_word: Some("claws".to_string()),
        }),
    });
    store.insert_post(Post {
        id: uuid!("00000000-0000-7000-8000-0000000000a2"),
        kind: PostKind::Announcement,
        author_id: staff,
        body: "Dodge the obstacles, five tries per run.".to_string(),
        media: None,
        created_at: chrono::Utc::now(),
        likes: 0,
        dislikes: 0,
        minigame: Some(MinigameSpec {
            kind: GameKind::ObstacleRun,
            secret_word: None,
        }),
    });

    store.insert_item(ShopItem {
        id: uuid!("00000000-0000-7000-8000-0000000000b1"),
        name: "golden avatar frame".to_string(),
        price: 100,
        media_id: None,
    });
    store.insert_item(ShopItem {
        id: uuid!("00000000-0000-7000-8000-0000000000b2"),
        name: "paw badge".to_string(),
        price: 40,
        media_id: None,
    });

    tracing::info!("demo content seeded into the in-memory store");
}
