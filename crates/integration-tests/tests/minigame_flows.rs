//! Full minigame flows: open a session against a real store, play to a
//! terminal state, and confirm the result lands on the claw-marks
//! balance exactly once.

use cb_core::error::CoreError;
use cb_core::models::{
    Account, AccountRole, GameKind, GameOutcome, MinigameSpec, Post, PostKind,
};
use cb_core::traits::LedgerStore;
use cb_engine::runner::MAX_STEP_MS;
use cb_engine::sessions::KeyInput;
use cb_engine::{BroadcastSink, GameConfig, SessionManager};
use cb_store_memory::MemoryStore;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

struct Fixture {
    store: Arc<MemoryStore>,
    mgr: SessionManager,
    player: Uuid,
    post: Uuid,
}

fn fixture(kind: GameKind, secret: Option<&str>) -> Fixture {
    let store = Arc::new(MemoryStore::new());

    let player = Uuid::now_v7();
    store.insert_account(Account {
        id: player,
        username: "mittens".to_string(),
        role: AccountRole::Member,
        claw_marks: 0,
        created_at: Utc::now(),
    });

    let post = Uuid::now_v7();
    store.insert_post(Post {
        id: post,
        kind: PostKind::Announcement,
        author_id: Uuid::now_v7(),
        body: "play to earn claw marks".to_string(),
        media: None,
        created_at: Utc::now(),
        likes: 0,
        dislikes: 0,
        minigame: Some(MinigameSpec {
            kind,
            secret_word: secret.map(str::to_string),
        }),
    });

    let mgr = SessionManager::new(
        store.clone(),
        store.clone(),
        Arc::new(BroadcastSink::new(16)),
        GameConfig::default(),
    );
    Fixture {
        store,
        mgr,
        player,
        post,
    }
}

async fn guess(fx: &Fixture, word: &str) -> Option<cb_engine::SessionUpdate> {
    for ch in word.chars() {
        fx.mgr
            .key(fx.player, fx.post, KeyInput::Letter(ch))
            .await
            .unwrap();
    }
    fx.mgr
        .key(fx.player, fx.post, KeyInput::Enter)
        .await
        .unwrap()
}

#[tokio::test]
async fn word_guess_win_on_attempt_two_credits_eighty() {
    let fx = fixture(GameKind::WordGuess, Some("hello"));
    fx.mgr.open(fx.player, fx.post).await.unwrap();

    let update = guess(&fx, "world").await.unwrap();
    assert!(update.finished.is_none());

    let update = guess(&fx, "hello").await.unwrap();
    let finished = update.finished.expect("winning guess ends the game");
    assert_eq!(finished.outcome, GameOutcome::Won);
    assert_eq!(finished.points, 80);
    assert_eq!(finished.balance, 80);

    let balance = fx
        .store
        .get_account(fx.player)
        .await
        .unwrap()
        .unwrap()
        .claw_marks;
    assert_eq!(balance, 80);
}

#[tokio::test]
async fn word_guess_loss_records_zero_and_blocks_replay() {
    let fx = fixture(GameKind::WordGuess, Some("hello"));
    fx.mgr.open(fx.player, fx.post).await.unwrap();

    let mut finished = None;
    for word in ["abbey", "crane", "moist", "squid", "train"] {
        finished = guess(&fx, word).await.unwrap().finished;
    }
    let finished = finished.expect("fifth miss ends the game");
    assert_eq!(finished.outcome, GameOutcome::Lost);
    assert_eq!(finished.points, 0);
    assert_eq!(finished.balance, 0);

    let err = fx.mgr.open(fx.player, fx.post).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyPlayed { .. }));
}

#[tokio::test]
async fn replay_after_a_win_is_refused() {
    let fx = fixture(GameKind::WordGuess, Some("hello"));
    fx.mgr.open(fx.player, fx.post).await.unwrap();
    guess(&fx, "hello").await.unwrap();

    let err = fx.mgr.open(fx.player, fx.post).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyPlayed { .. }));

    // A stray late keystroke is tolerated, not an error.
    let update = fx
        .mgr
        .key(fx.player, fx.post, KeyInput::Enter)
        .await
        .unwrap();
    assert!(update.is_none());

    let balance = fx
        .store
        .get_account(fx.player)
        .await
        .unwrap()
        .unwrap()
        .claw_marks;
    assert_eq!(balance, 100, "first-try win credited exactly once");
}

#[tokio::test]
async fn runner_out_of_attempts_credits_the_consolation() {
    let fx = fixture(GameKind::ObstacleRun, None);
    let view = fx.mgr.open(fx.player, fx.post).await.unwrap();
    let attempts = view.run.unwrap().attempts_remaining;

    // Launch each run with a single tap and then let gravity take it
    // into the floor; the last crash turns the session into a loss.
    let mut finished = None;
    'runs: for _ in 0..attempts {
        let update = fx
            .mgr
            .step(fx.player, fx.post, MAX_STEP_MS, true)
            .await
            .unwrap()
            .unwrap();
        if update.finished.is_some() {
            finished = update.finished;
            break;
        }
        let before = update.view.run.as_ref().unwrap().attempts_remaining;
        for _ in 0..10_000 {
            let update = fx
                .mgr
                .step(fx.player, fx.post, MAX_STEP_MS, false)
                .await
                .unwrap()
                .unwrap();
            if update.finished.is_some() {
                finished = update.finished;
                break 'runs;
            }
            if update.view.run.as_ref().unwrap().attempts_remaining < before {
                break;
            }
        }
    }

    let finished = finished.expect("exhausting every attempt ends the run");
    assert_eq!(finished.outcome, GameOutcome::Lost);
    assert_eq!(finished.points, 10);
    assert_eq!(finished.balance, 10);

    let err = fx.mgr.open(fx.player, fx.post).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyPlayed { .. }));
}

#[tokio::test]
async fn word_guess_post_without_a_secret_is_rejected() {
    let fx = fixture(GameKind::WordGuess, None);
    let err = fx.mgr.open(fx.player, fx.post).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}
