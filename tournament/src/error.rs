use conquest_agents::ConfigError;
use conquest_engine::{Color, EngineError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TournamentError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    #[error("No agent for kingdom {0}")]
    MissingAgent(Color),

    #[error("Game {seed} stuck: {reason}")]
    Stuck { seed: u64, reason: String },
}

pub type Result<T> = std::result::Result<T, TournamentError>;
