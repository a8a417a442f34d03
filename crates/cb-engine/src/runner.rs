//! # Obstacle-Run Session
//!
//! Discrete-time simulation of the side-scrolling runner: a tap gives
//! the player a fixed upward impulse, gravity pulls it back, and paired
//! top/bottom obstacles scroll left at a fixed speed. Passing every
//! pair wins; touching an obstacle or the floor ends the run and costs
//! an attempt. The external driver supplies elapsed time per tick,
//! clamped to one frame to avoid tunneling on slow frames.

use crate::wordguess::GameStatus;
use cb_core::models::GameOutcome;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Maximum simulated time per step, in milliseconds (one 60 Hz frame).
pub const MAX_STEP_MS: f32 = 16.667;

/// Tuning knobs for the simulation. Velocities and speeds are in world
/// units per full (16.667 ms) step.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub world_width: f32,
    pub world_height: f32,
    /// Height of the solid floor strip at the bottom of the world.
    pub floor_height: f32,
    pub obstacle_count: usize,
    /// Runs the player gets before a loss becomes final.
    pub attempts: u32,
    pub gap_height: f32,
    pub obstacle_width: f32,
    /// Horizontal distance between consecutive pairs, as a multiple of
    /// the world width.
    pub spacing_factor: f32,
    pub player_size: f32,
    pub player_x: f32,
    pub player_start_y: f32,
    pub scroll_speed: f32,
    pub gravity: f32,
    pub tap_velocity: f32,
    /// An obstacle whose x drops below this is fully off-screen.
    pub exit_x: f32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            world_width: 400.0,
            world_height: 700.0,
            floor_height: 100.0,
            obstacle_count: 5,
            attempts: 5,
            gap_height: 220.0,
            obstacle_width: 60.0,
            spacing_factor: 1.2,
            player_size: 50.0,
            player_x: 80.0,
            player_start_y: 200.0,
            scroll_speed: 3.0,
            gravity: 0.5,
            tap_velocity: -8.0,
            exit_x: -50.0,
        }
    }
}

/// One top/bottom pair, described by the horizontal position of its
/// left edge and the vertical center of the gap between the halves.
#[derive(Debug, Clone, Serialize)]
pub struct ObstaclePair {
    pub x: f32,
    pub gap_center: f32,
    pub passed: bool,
}

#[derive(Debug, Clone)]
struct Player {
    y: f32,
    vy: f32,
}

/// What a single step did, so the driver can relay it to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// Nothing moved: the run is paused or the game already ended.
    Idle,
    /// The simulation advanced with no terminal event.
    Advanced,
    /// The run crashed but attempts remain; entities were reset and the
    /// next tap launches a fresh run.
    RunFailed { attempts_remaining: u32 },
    Won,
    Lost,
}

/// The live state of one obstacle-run attempt.
#[derive(Debug, Clone)]
pub struct ObstacleRun {
    cfg: RunnerConfig,
    rng: StdRng,
    player: Player,
    obstacles: Vec<ObstaclePair>,
    passed: usize,
    attempts_remaining: u32,
    /// False between runs; the next tap launches.
    run_active: bool,
    status: GameStatus,
}

impl ObstacleRun {
    /// The seed fixes the obstacle layout, which keeps replays of a
    /// crashed run fair and the simulation testable.
    pub fn new(cfg: RunnerConfig, seed: u64) -> Self {
        let attempts = cfg.attempts;
        let mut run = Self {
            cfg,
            rng: StdRng::seed_from_u64(seed),
            player: Player { y: 0.0, vy: 0.0 },
            obstacles: Vec::new(),
            passed: 0,
            attempts_remaining: attempts,
            run_active: false,
            status: GameStatus::Playing,
        };
        run.reset_course();
        run
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn obstacles(&self) -> &[ObstaclePair] {
        &self.obstacles
    }

    pub fn player_y(&self) -> f32 {
        self.player.y
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.status {
            GameStatus::Playing => None,
            GameStatus::Won => Some(GameOutcome::Won),
            GameStatus::Lost => Some(GameOutcome::Lost),
        }
    }

    /// Runs consumed so far, including the winning one.
    pub fn tries_used(&self) -> u32 {
        let consumed = self.cfg.attempts - self.attempts_remaining;
        match self.status {
            GameStatus::Won => consumed + 1,
            _ => consumed,
        }
    }

    /// Advances the simulation by `dt_ms` (clamped). A tap while the run
    /// is paused launches it; a tap mid-run is the jump impulse. Inputs
    /// after a final win/loss are ignored.
    pub fn step(&mut self, dt_ms: f32, tap: bool) -> StepOutcome {
        if self.status != GameStatus::Playing {
            return StepOutcome::Idle;
        }
        if !self.run_active {
            if !tap {
                return StepOutcome::Idle;
            }
            self.run_active = true;
            self.player.vy = self.cfg.tap_velocity;
        } else if tap {
            self.player.vy = self.cfg.tap_velocity;
        }

        let scale = dt_ms.clamp(0.0, MAX_STEP_MS) / MAX_STEP_MS;

        self.player.vy += self.cfg.gravity * scale;
        self.player.y += self.player.vy * scale;

        for pair in &mut self.obstacles {
            pair.x -= self.cfg.scroll_speed * scale;
            if !pair.passed && pair.x < self.cfg.exit_x {
                pair.passed = true;
                self.passed += 1;
            }
        }

        if self.passed >= self.cfg.obstacle_count {
            self.status = GameStatus::Won;
            return StepOutcome::Won;
        }

        if self.collided() {
            if self.attempts_remaining > 1 {
                self.attempts_remaining -= 1;
                self.run_active = false;
                self.reset_course();
                return StepOutcome::RunFailed {
                    attempts_remaining: self.attempts_remaining,
                };
            }
            self.attempts_remaining = 0;
            self.status = GameStatus::Lost;
            return StepOutcome::Lost;
        }

        StepOutcome::Advanced
    }

    /// Points for the finished game. Wins are tiered by attempts left at
    /// the winning run; a final loss still pays a small consolation.
    pub fn score(&self) -> i64 {
        match self.status {
            GameStatus::Won => match self.attempts_remaining {
                5 => 100,
                4 => 80,
                3 => 60,
                2 => 40,
                1 => 20,
                _ => 0,
            },
            GameStatus::Lost => 10,
            GameStatus::Playing => 0,
        }
    }

    fn reset_course(&mut self) {
        self.player = Player {
            y: self.cfg.player_start_y,
            vy: 0.0,
        };
        self.passed = 0;

        let margin = 40.0;
        let lo = self.cfg.gap_height / 2.0 + margin;
        let hi = self.cfg.world_height
            - self.cfg.floor_height
            - self.cfg.gap_height / 2.0
            - margin;
        let spacing = self.cfg.world_width * self.cfg.spacing_factor;

        self.obstacles = (0..self.cfg.obstacle_count)
            .map(|i| ObstaclePair {
                x: self.cfg.world_width + spacing * i as f32,
                gap_center: if hi > lo {
                    self.rng.random_range(lo..hi)
                } else {
                    (lo + hi) / 2.0
                },
                passed: false,
            })
            .collect();
    }

    fn collided(&self) -> bool {
        let floor_y = self.cfg.world_height - self.cfg.floor_height;
        if self.player.y + self.cfg.player_size >= floor_y {
            return true;
        }

        let px0 = self.cfg.player_x;
        let px1 = px0 + self.cfg.player_size;
        let py0 = self.player.y;
        let py1 = py0 + self.cfg.player_size;

        self.obstacles.iter().any(|pair| {
            let overlaps_x = pair.x < px1 && pair.x + self.cfg.obstacle_width > px0;
            if !overlaps_x {
                return false;
            }
            let gap_top = pair.gap_center - self.cfg.gap_height / 2.0;
            let gap_bottom = pair.gap_center + self.cfg.gap_height / 2.0;
            py0 < gap_top || py1 > gap_bottom
        })
    }
}
