//! Error types for game logic.

use crate::model::Entity;
use crate::store::StoreError;

/// Errors returned by the game services and the round coordinator.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{0} not found")]
    NotFound(Entity),

    /// The caller is not the player this step belongs to.
    #[error("player is not allowed to do this")]
    Forbidden,

    /// The round is not in the status this step requires.
    #[error("round is not in the required status")]
    InvalidStatus,

    /// The game is not in the status this step requires.
    #[error("game is not in the required status")]
    InvalidGameStatus,

    #[error("not enough players")]
    NotEnoughPlayers,

    #[error("nickname already taken")]
    DuplicateNickname,

    #[error("could not generate a unique game code")]
    CodeGenerationExhausted,

    #[error("card index {index} out of range for a deck of {len}")]
    InvalidCardIndex { index: usize, len: usize },

    /// The store failed for a reason unrelated to game rules.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Self::NotFound(entity),
            StoreError::DuplicateNickname => Self::DuplicateNickname,
            StoreError::StaleRound { .. } | StoreError::ActiveRound(_) => {
                Self::InvalidStatus
            }
            StoreError::StaleGame { .. } => Self::InvalidGameStatus,
            other => Self::Store(other),
        }
    }
}
