//! # Word-Guess Session
//!
//! Turn-based guess evaluation over a fixed secret word: a grid of
//! `max_attempts` rows, a cursor, per-letter display states, and
//! deterministic scoring. Win detection is exact-match only; the
//! letter states exist purely for rendering.

use cb_core::models::GameOutcome;
use serde::Serialize;

/// Default number of guess rows.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Live status of a session. Terminal statuses are entered exactly
/// once; all input after that is silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
}

/// Display state of one submitted letter.
///
/// `Correct`: matches the secret at the same index. `Present`: occurs
/// anywhere in the secret but not at that index. `Absent`: otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterState {
    Correct,
    Present,
    Absent,
}

/// The live state of one word-guess attempt.
#[derive(Debug, Clone)]
pub struct WordGuess {
    secret: Vec<char>,
    max_attempts: u32,
    /// Submitted rows plus the row under the cursor; the cursor column
    /// is the current row's length.
    rows: Vec<Vec<char>>,
    /// Display states for each submitted row.
    scored_rows: Vec<Vec<LetterState>>,
    attempts_used: u32,
    status: GameStatus,
}

impl WordGuess {
    /// Comparison is ASCII case-insensitive: the secret and every typed
    /// letter are lowered on entry.
    pub fn new(secret: &str, max_attempts: u32) -> Self {
        Self {
            secret: secret.chars().map(|c| c.to_ascii_lowercase()).collect(),
            max_attempts,
            rows: vec![Vec::new()],
            scored_rows: Vec::new(),
            attempts_used: 0,
            status: GameStatus::Playing,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn word_len(&self) -> usize {
        self.secret.len()
    }

    pub fn rows(&self) -> &[Vec<char>] {
        &self.rows
    }

    pub fn scored_rows(&self) -> &[Vec<LetterState>] {
        &self.scored_rows
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.status {
            GameStatus::Playing => None,
            GameStatus::Won => Some(GameOutcome::Won),
            GameStatus::Lost => Some(GameOutcome::Lost),
        }
    }

    /// Writes a letter at the cursor and advances it. Ignored when the
    /// row is full, the letter is not alphabetic, or the game is over.
    pub fn submit_letter(&mut self, ch: char) {
        if self.status != GameStatus::Playing || !ch.is_ascii_alphabetic() {
            return;
        }
        let row = self
            .rows
            .last_mut()
            .expect("a playing session always has an open row");
        if row.len() < self.secret.len() {
            row.push(ch.to_ascii_lowercase());
        }
    }

    /// Clears the cell before the cursor and retreats it. Ignored at
    /// column zero or after a terminal status.
    pub fn submit_backspace(&mut self) {
        if self.status != GameStatus::Playing {
            return;
        }
        let row = self
            .rows
            .last_mut()
            .expect("a playing session always has an open row");
        row.pop();
    }

    /// Evaluates the current row against the secret. Only valid when the
    /// row is full; a partial row is left untouched. A non-winning row
    /// still consumes an attempt, and exhausting all rows loses the game.
    pub fn submit_enter(&mut self) {
        if self.status != GameStatus::Playing {
            return;
        }
        let row = self
            .rows
            .last()
            .expect("a playing session always has an open row");
        if row.len() < self.secret.len() {
            return;
        }

        let won = row == &self.secret;
        self.scored_rows.push(evaluate(row, &self.secret));
        self.attempts_used += 1;

        if won {
            self.status = GameStatus::Won;
        } else if self.attempts_used >= self.max_attempts {
            self.status = GameStatus::Lost;
        } else {
            self.rows.push(Vec::new());
        }
    }

    /// Points for the finished session. Tiered descending by the attempt
    /// the win landed on; a loss is worth nothing.
    pub fn score(&self) -> i64 {
        match self.status {
            GameStatus::Won => score_for_attempt(self.attempts_used),
            _ => 0,
        }
    }
}

fn score_for_attempt(attempt: u32) -> i64 {
    match attempt {
        1 => 100,
        2 => 80,
        3 => 60,
        4 => 40,
        5 => 20,
        _ => 0,
    }
}

/// Per-letter display states for a submitted row. Positional match
/// wins over containment; containment is a simple membership test
/// (duplicate letters are not budgeted, matching the display rule).
fn evaluate(guess: &[char], secret: &[char]) -> Vec<LetterState> {
    guess
        .iter()
        .enumerate()
        .map(|(i, ch)| {
            if secret.get(i) == Some(ch) {
                LetterState::Correct
            } else if secret.contains(ch) {
                LetterState::Present
            } else {
                LetterState::Absent
            }
        })
        .collect()
}
