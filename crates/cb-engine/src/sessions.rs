//! # Minigame Session Manager
//!
//! Owns the live, in-memory session per (player, post): opens sessions
//! against minigame-bearing posts, routes keystrokes and physics ticks
//! to the right variant, and finalizes a terminal session into a
//! persisted result exactly once. Abandoned sessions never produce a
//! result; that is an accepted outcome, not a failure.

use crate::runner::{ObstaclePair, ObstacleRun, RunnerConfig};
use crate::wordguess::{GameStatus, LetterState, WordGuess, DEFAULT_MAX_ATTEMPTS};
use cb_core::error::{CoreError, Result};
use cb_core::events::CommunityEvent;
use cb_core::models::{GameKind, GameOutcome, GameStats, MinigameResult};
use cb_core::traits::{CommunityStore, EventSink, LedgerStore};
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Tuning for new sessions, loaded from configuration.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub word_max_attempts: u32,
    pub runner: RunnerConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            word_max_attempts: DEFAULT_MAX_ATTEMPTS,
            runner: RunnerConfig::default(),
        }
    }
}

/// A word-guess keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyInput {
    Letter(char),
    Backspace,
    Enter,
}

/// Snapshot of a live word-guess grid for the caller to render.
#[derive(Debug, Clone, Serialize)]
pub struct WordView {
    pub rows: Vec<String>,
    pub scored_rows: Vec<Vec<LetterState>>,
    pub attempts_used: u32,
    pub word_len: usize,
}

/// Snapshot of a live obstacle run.
#[derive(Debug, Clone, Serialize)]
pub struct RunView {
    pub player_y: f32,
    pub attempts_remaining: u32,
    pub passed: usize,
    pub obstacles: Vec<ObstaclePair>,
}

/// Caller-facing snapshot of a session, taken after every input.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub player_id: Uuid,
    pub post_id: Uuid,
    pub kind: GameKind,
    pub status: GameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<WordView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunView>,
}

/// Terminal summary returned alongside the final snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct FinishedGame {
    pub outcome: GameOutcome,
    pub points: i64,
    /// Claw-marks balance after the credit.
    pub balance: i64,
}

/// Result of routing one input into a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUpdate {
    pub view: SessionView,
    /// Present exactly once, on the input that drove the session
    /// terminal. The result is persisted by the time this is returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished: Option<FinishedGame>,
}

enum Session {
    Word(WordGuess),
    Run(ObstacleRun),
}

/// Data carried out of the session lock for the async finalize step.
struct Terminal {
    outcome: GameOutcome,
    points: i64,
    stats: GameStats,
}

#[derive(Clone)]
pub struct SessionManager {
    community: Arc<dyn CommunityStore>,
    ledger: Arc<dyn LedgerStore>,
    events: Arc<dyn EventSink>,
    cfg: GameConfig,
    live: Arc<DashMap<(Uuid, Uuid), Session>>,
}

impl SessionManager {
    pub fn new(
        community: Arc<dyn CommunityStore>,
        ledger: Arc<dyn LedgerStore>,
        events: Arc<dyn EventSink>,
        cfg: GameConfig,
    ) -> Self {
        Self {
            community,
            ledger,
            events,
            cfg,
            live: Arc::new(DashMap::new()),
        }
    }

    /// Opens (or resumes) the session for `player_id` on `post_id`.
    ///
    /// Fails with `NoMinigame` when the post carries no game, and with
    /// `AlreadyPlayed` when a result already exists: one result per
    /// (player, post) is enforced here, at the entry point.
    pub async fn open(&self, player_id: Uuid, post_id: Uuid) -> Result<SessionView> {
        let post = self
            .community
            .get_post(post_id)
            .await?
            .ok_or(CoreError::PostNotFound(post_id))?;
        let spec = post.minigame.ok_or(CoreError::NoMinigame(post_id))?;

        if self.ledger.has_result(player_id, post_id).await? {
            return Err(CoreError::AlreadyPlayed { player_id, post_id });
        }

        // Validate before taking the map entry so a bad post never
        // leaves a half-built session behind.
        let secret = match spec.kind {
            GameKind::WordGuess => {
                let word = spec
                    .secret_word
                    .filter(|w| !w.trim().is_empty())
                    .ok_or_else(|| {
                        CoreError::Validation("word-guess post has no secret word".to_string())
                    })?;
                Some(word)
            }
            GameKind::ObstacleRun => None,
        };

        let entry = self
            .live
            .entry((player_id, post_id))
            .or_insert_with(|| match spec.kind {
                GameKind::WordGuess => Session::Word(WordGuess::new(
                    secret.as_deref().unwrap_or_default(),
                    self.cfg.word_max_attempts,
                )),
                GameKind::ObstacleRun => Session::Run(ObstacleRun::new(
                    self.cfg.runner.clone(),
                    course_seed(player_id, post_id),
                )),
            });

        tracing::debug!(%player_id, %post_id, kind = ?spec.kind, "minigame session open");
        Ok(view(player_id, post_id, entry.value()))
    }

    /// Routes a keystroke into the player's word-guess session.
    ///
    /// Returns `Ok(None)` for a late input on an already-finished game
    /// (client double-submits are tolerated as silent no-ops).
    pub async fn key(
        &self,
        player_id: Uuid,
        post_id: Uuid,
        input: KeyInput,
    ) -> Result<Option<SessionUpdate>> {
        let (snapshot, terminal) = {
            let mut entry = match self.live.get_mut(&(player_id, post_id)) {
                Some(entry) => entry,
                None => return self.missing_session(player_id, post_id).await,
            };
            let game = match &mut *entry {
                Session::Word(game) => game,
                Session::Run(_) => {
                    return Err(CoreError::Validation(
                        "keystrokes are not valid for an obstacle-run session".to_string(),
                    ))
                }
            };

            let was_playing = game.status() == GameStatus::Playing;
            match input {
                KeyInput::Letter(ch) => game.submit_letter(ch),
                KeyInput::Backspace => game.submit_backspace(),
                KeyInput::Enter => game.submit_enter(),
            }

            let terminal = match (was_playing, game.outcome()) {
                (true, Some(outcome)) => Some(Terminal {
                    outcome,
                    points: game.score(),
                    stats: GameStats::WordGuess {
                        guesses: game.attempts_used(),
                    },
                }),
                _ => None,
            };
            (view(player_id, post_id, &*entry), terminal)
        };

        self.conclude(player_id, post_id, snapshot, terminal).await
    }

    /// Advances the player's obstacle-run session by one tick.
    pub async fn step(
        &self,
        player_id: Uuid,
        post_id: Uuid,
        dt_ms: f32,
        tap: bool,
    ) -> Result<Option<SessionUpdate>> {
        let (snapshot, terminal) = {
            let mut entry = match self.live.get_mut(&(player_id, post_id)) {
                Some(entry) => entry,
                None => return self.missing_session(player_id, post_id).await,
            };
            let run = match &mut *entry {
                Session::Run(run) => run,
                Session::Word(_) => {
                    return Err(CoreError::Validation(
                        "physics ticks are not valid for a word-guess session".to_string(),
                    ))
                }
            };

            let was_playing = run.status() == GameStatus::Playing;
            run.step(dt_ms, tap);

            let terminal = match (was_playing, run.outcome()) {
                (true, Some(outcome)) => Some(Terminal {
                    outcome,
                    points: run.score(),
                    stats: GameStats::ObstacleRun {
                        tries: run.tries_used(),
                    },
                }),
                _ => None,
            };
            (view(player_id, post_id, &*entry), terminal)
        };

        self.conclude(player_id, post_id, snapshot, terminal).await
    }

    /// Persists the terminal result (if any) and assembles the update.
    /// The session is dropped before the store write so a second input
    /// can never finalize it twice.
    async fn conclude(
        &self,
        player_id: Uuid,
        post_id: Uuid,
        view: SessionView,
        terminal: Option<Terminal>,
    ) -> Result<Option<SessionUpdate>> {
        let finished = match terminal {
            None => None,
            Some(terminal) => {
                self.live.remove(&(player_id, post_id));

                let result = MinigameResult {
                    id: Uuid::now_v7(),
                    player_id,
                    post_id,
                    outcome: terminal.outcome,
                    points: terminal.points,
                    stats: terminal.stats,
                    played_at: Utc::now(),
                };
                let balance = self.ledger.record_result(result).await?;

                tracing::info!(
                    %player_id,
                    %post_id,
                    outcome = ?terminal.outcome,
                    points = terminal.points,
                    "minigame result recorded"
                );
                self.events.emit(CommunityEvent::ResultRecorded {
                    player_id,
                    post_id,
                    outcome: terminal.outcome,
                    points: terminal.points,
                });

                Some(FinishedGame {
                    outcome: terminal.outcome,
                    points: terminal.points,
                    balance,
                })
            }
        };

        Ok(Some(SessionUpdate { view, finished }))
    }

    /// A stray input with no live session is a silent no-op when the
    /// game already finished, and an error otherwise.
    async fn missing_session(
        &self,
        player_id: Uuid,
        post_id: Uuid,
    ) -> Result<Option<SessionUpdate>> {
        if self.ledger.has_result(player_id, post_id).await? {
            return Ok(None);
        }
        Err(CoreError::SessionNotFound { player_id, post_id })
    }
}

/// Stable per-(player, post) seed so a crashed run replays the same
/// course after a retry or a reconnect.
fn course_seed(player_id: Uuid, post_id: Uuid) -> u64 {
    let a = u64::from_le_bytes(player_id.as_bytes()[..8].try_into().unwrap_or_default());
    let b = u64::from_le_bytes(post_id.as_bytes()[..8].try_into().unwrap_or_default());
    a ^ b.rotate_left(32)
}

fn view(player_id: Uuid, post_id: Uuid, session: &Session) -> SessionView {
    match session {
        Session::Word(game) => SessionView {
            player_id,
            post_id,
            kind: GameKind::WordGuess,
            status: game.status(),
            word: Some(WordView {
                rows: game.rows().iter().map(|row| row.iter().collect()).collect(),
                scored_rows: game.scored_rows().to_vec(),
                attempts_used: game.attempts_used(),
                word_len: game.word_len(),
            }),
            run: None,
        },
        Session::Run(run) => SessionView {
            player_id,
            post_id,
            kind: GameKind::ObstacleRun,
            status: run.status(),
            word: None,
            run: Some(RunView {
                player_y: run.player_y(),
                attempts_remaining: run.attempts_remaining(),
                passed: run.passed(),
                obstacles: run.obstacles().to_vec(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_core::models::{MinigameSpec, Post, PostKind};
    use cb_core::traits::{MockCommunityStore, MockEventSink, MockLedgerStore};
    use mockall::predicate::eq;

    fn word_post(id: Uuid, secret: &str) -> Post {
        Post {
            id,
            kind: PostKind::Announcement,
            author_id: Uuid::now_v7(),
            body: "guess the word".to_string(),
            media: None,
            created_at: Utc::now(),
            likes: 0,
            dislikes: 0,
            minigame: Some(MinigameSpec {
                kind: GameKind::WordGuess,
                secret_word: Some(secret.to_string()),
            }),
        }
    }

    fn manager(
        community: MockCommunityStore,
        ledger: MockLedgerStore,
        events: MockEventSink,
    ) -> SessionManager {
        SessionManager::new(
            Arc::new(community),
            Arc::new(ledger),
            Arc::new(events),
            GameConfig::default(),
        )
    }

    async fn type_word(mgr: &SessionManager, player: Uuid, post: Uuid, word: &str) {
        for ch in word.chars() {
            mgr.key(player, post, KeyInput::Letter(ch)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn open_refuses_posts_without_a_minigame() {
        let post_id = Uuid::now_v7();
        let mut community = MockCommunityStore::new();
        community.expect_get_post().returning(move |id| {
            let mut post = word_post(id, "hello");
            post.minigame = None;
            Ok(Some(post))
        });
        let mgr = manager(community, MockLedgerStore::new(), MockEventSink::new());

        let err = mgr.open(Uuid::now_v7(), post_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NoMinigame(id) if id == post_id));
    }

    #[tokio::test]
    async fn open_refuses_replays() {
        let mut community = MockCommunityStore::new();
        community
            .expect_get_post()
            .returning(|id| Ok(Some(word_post(id, "hello"))));
        let mut ledger = MockLedgerStore::new();
        ledger.expect_has_result().returning(|_, _| Ok(true));
        let mgr = manager(community, ledger, MockEventSink::new());

        let err = mgr.open(Uuid::now_v7(), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyPlayed { .. }));
    }

    #[tokio::test]
    async fn winning_on_attempt_two_records_eighty_points_once() {
        let player = Uuid::now_v7();
        let post = Uuid::now_v7();

        let mut community = MockCommunityStore::new();
        community
            .expect_get_post()
            .returning(|id| Ok(Some(word_post(id, "hello"))));
        let mut ledger = MockLedgerStore::new();
        ledger.expect_has_result().returning(|_, _| Ok(false));
        ledger
            .expect_record_result()
            .times(1)
            .withf(move |result| {
                result.player_id == player
                    && result.post_id == post
                    && result.outcome == GameOutcome::Won
                    && result.points == 80
                    && result.stats == GameStats::WordGuess { guesses: 2 }
            })
            .returning(|result| Ok(result.points));
        let mut events = MockEventSink::new();
        events
            .expect_emit()
            .times(1)
            .with(eq(CommunityEvent::ResultRecorded {
                player_id: player,
                post_id: post,
                outcome: GameOutcome::Won,
                points: 80,
            }))
            .return_const(());

        let mgr = manager(community, ledger, events);
        mgr.open(player, post).await.unwrap();

        type_word(&mgr, player, post, "world").await;
        mgr.key(player, post, KeyInput::Enter).await.unwrap();
        type_word(&mgr, player, post, "hello").await;
        let update = mgr
            .key(player, post, KeyInput::Enter)
            .await
            .unwrap()
            .unwrap();

        let finished = update.finished.expect("winning input reports the result");
        assert_eq!(finished.outcome, GameOutcome::Won);
        assert_eq!(finished.points, 80);
        assert_eq!(finished.balance, 80);
        assert_eq!(update.view.status, GameStatus::Won);
    }

    #[tokio::test]
    async fn late_input_after_a_recorded_result_is_silently_ignored() {
        let player = Uuid::now_v7();
        let post = Uuid::now_v7();
        let mut community = MockCommunityStore::new();
        community.expect_get_post().never();
        let mut ledger = MockLedgerStore::new();
        ledger.expect_has_result().returning(|_, _| Ok(true));
        let mgr = manager(community, ledger, MockEventSink::new());

        let update = mgr.key(player, post, KeyInput::Enter).await.unwrap();
        assert!(update.is_none());
    }

    #[tokio::test]
    async fn input_without_any_session_is_an_error() {
        let mut ledger = MockLedgerStore::new();
        ledger.expect_has_result().returning(|_, _| Ok(false));
        let mgr = manager(MockCommunityStore::new(), ledger, MockEventSink::new());

        let err = mgr
            .step(Uuid::now_v7(), Uuid::now_v7(), crate::runner::MAX_STEP_MS, true)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::SessionNotFound { .. }));
    }

    #[tokio::test]
    async fn keystrokes_are_rejected_on_an_obstacle_run() {
        let player = Uuid::now_v7();
        let post = Uuid::now_v7();
        let mut community = MockCommunityStore::new();
        community.expect_get_post().returning(|id| {
            let mut post = word_post(id, "hello");
            post.minigame = Some(MinigameSpec {
                kind: GameKind::ObstacleRun,
                secret_word: None,
            });
            Ok(Some(post))
        });
        let mut ledger = MockLedgerStore::new();
        ledger.expect_has_result().returning(|_, _| Ok(false));
        let mgr = manager(community, ledger, MockEventSink::new());

        mgr.open(player, post).await.unwrap();
        let err = mgr
            .key(player, post, KeyInput::Letter('a'))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn reopening_a_live_session_resumes_it() {
        let player = Uuid::now_v7();
        let post = Uuid::now_v7();
        let mut community = MockCommunityStore::new();
        community
            .expect_get_post()
            .returning(|id| Ok(Some(word_post(id, "hello"))));
        let mut ledger = MockLedgerStore::new();
        ledger.expect_has_result().returning(|_, _| Ok(false));
        let mgr = manager(community, ledger, MockEventSink::new());

        mgr.open(player, post).await.unwrap();
        type_word(&mgr, player, post, "wor").await;
        let view = mgr.open(player, post).await.unwrap();
        assert_eq!(view.word.unwrap().rows[0], "wor");
    }
}
