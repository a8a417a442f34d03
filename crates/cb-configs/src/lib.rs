//! # cb-configs
//!
//! Layered settings for the Clawboard binary: built-in defaults,
//! overridden by `CLAWBOARD__`-prefixed environment variables
//! (e.g. `CLAWBOARD__SERVER__PORT=9000`). A `.env` file is honored
//! for local development.

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigsError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// SQLite URL used when the binary is built with the sqlite store.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameSettings {
    pub word_max_attempts: u32,
    pub runner_attempts: u32,
    pub obstacle_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub game: GameSettings,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigsError> {
        // Missing .env is fine; the defaults below cover everything.
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080_i64)?
            .set_default("store.url", "sqlite:clawboard.db")?
            .set_default("game.word_max_attempts", 5_i64)?
            .set_default("game.runner_attempts", 5_i64)?
            .set_default("game.obstacle_count", 5_i64)?
            .add_source(
                config::Environment::with_prefix("CLAWBOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        tracing::debug!(?settings, "configuration loaded");
        Ok(settings)
    }
}
