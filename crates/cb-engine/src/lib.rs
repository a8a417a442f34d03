//! # cb-engine
//!
//! The services layer of Clawboard: the reaction ledger, comments, the
//! two minigame state machines with their session manager, and the
//! points-and-shop ledger. Everything here talks to storage through
//! the `cb-core` ports and stays swappable between plugins.

pub mod comments;
pub mod events;
pub mod reactions;
pub mod runner;
pub mod sessions;
pub mod shop;
pub mod wordguess;

pub use comments::CommentService;
pub use events::{BroadcastSink, TracingSink};
pub use reactions::ReactionService;
pub use runner::{ObstacleRun, RunnerConfig, StepOutcome};
pub use sessions::{GameConfig, KeyInput, SessionManager, SessionUpdate, SessionView};
pub use shop::ShopService;
pub use wordguess::{GameStatus, LetterState, WordGuess};
