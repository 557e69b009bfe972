use crate::types::{Building, CastleId, Color, HeroId, Position};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Hero not found: {0:?}")]
    HeroNotFound(HeroId),

    #[error("Castle not found: {0:?}")]
    CastleNotFound(CastleId),

    #[error("Kingdom not found: {0}")]
    KingdomNotFound(Color),

    #[error("Hero {0:?} cannot act: {1}")]
    HeroUnavailable(HeroId, String),

    #[error("Invalid path step to {0}")]
    InvalidStep(Position),

    #[error("Cannot build {0:?}: {1}")]
    CannotBuild(Building, String),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
