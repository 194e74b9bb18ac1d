//! The persistence seam.
//!
//! Game logic talks to storage only through [`Store`]. Status changes are
//! compare-and-set: the caller names the status it observed, and the store
//! refuses the write if the record has moved on. Two concurrent draws (or
//! two concurrent starts) against one record therefore produce exactly one
//! winner.

use joker_protocol::{GameCode, GameId, PlayerId, QuestionId, RoundId};

use crate::model::{
    Card, Entity, Game, GameStatus, Player, PlayerStatus, Question,
    QuestionLevel, Round, RoundStatus,
};

/// Errors reported by a [`Store`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(Entity),

    /// Another player in the same game already uses this nickname.
    #[error("nickname already taken in this game")]
    DuplicateNickname,

    /// Another game already uses this code.
    #[error("game code already in use")]
    DuplicateCode,

    /// The round was not in the expected status.
    #[error("round is {actual}, expected {expected}")]
    StaleRound {
        expected: RoundStatus,
        actual: RoundStatus,
    },

    /// The game was not in the expected status.
    #[error("game is {actual}, expected {expected}")]
    StaleGame {
        expected: GameStatus,
        actual: GameStatus,
    },

    /// The game already has a round that is not finished.
    #[error("game {0} already has an active round")]
    ActiveRound(GameId),

    /// The backing storage failed.
    #[error("storage failure: {0}")]
    Backend(String),
}

/// Fields of a round about to be created. New rounds always start in
/// [`RoundStatus::WaitingForQuestion`].
#[derive(Debug, Clone)]
pub struct NewRound {
    pub game_id: GameId,
    pub questioner_id: PlayerId,
    pub answerer_id: PlayerId,
    pub deck: Vec<Card>,
}

/// A single state-machine step applied to a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundUpdate {
    /// The questioner picked a question.
    Question(QuestionId),
    /// The answerer replied.
    Answer(String),
    /// The answerer drew a card.
    Draw { is_joker: bool },
    /// The round was abandoned.
    Skip,
}

impl RoundUpdate {
    /// The status the round lands in after this update.
    pub fn next_status(&self) -> RoundStatus {
        match self {
            Self::Question(_) => RoundStatus::WaitingForAnswer,
            Self::Answer(_) => RoundStatus::WaitingForDraw,
            Self::Draw { is_joker: true } => RoundStatus::Revealed,
            Self::Draw { is_joker: false } | Self::Skip => RoundStatus::Done,
        }
    }

    /// Writes this update's fields and status into `round`.
    pub fn apply(self, round: &mut Round) {
        round.status = self.next_status();
        match self {
            Self::Question(id) => round.question_id = Some(id),
            Self::Answer(answer) => round.answer = Some(answer),
            Self::Draw { is_joker } => round.is_joker = is_joker,
            Self::Skip => {}
        }
    }
}

/// Synchronous record storage for games, players, rounds and questions.
///
/// `Send + Sync + 'static` because one store is shared by the controller,
/// the accept loop and the disconnect worker.
pub trait Store: Send + Sync + 'static {
    // -- games ----------------------------------------------------------

    /// Persists a new game in [`GameStatus::Waiting`].
    ///
    /// # Errors
    /// [`StoreError::DuplicateCode`] if `code` is taken.
    fn create_game(&self, code: &GameCode) -> Result<Game, StoreError>;

    fn game(&self, id: GameId) -> Result<Game, StoreError>;

    fn game_by_code(&self, code: &GameCode) -> Result<Game, StoreError>;

    fn code_exists(&self, code: &GameCode) -> Result<bool, StoreError>;

    /// Moves a game from `from` to `to`.
    ///
    /// # Errors
    /// [`StoreError::StaleGame`] if the game is not currently `from`.
    fn transition_game(
        &self,
        id: GameId,
        from: GameStatus,
        to: GameStatus,
    ) -> Result<Game, StoreError>;

    // -- players --------------------------------------------------------

    /// Persists a new online player.
    ///
    /// # Errors
    /// [`StoreError::DuplicateNickname`] if the game already has a player
    /// with this nickname.
    fn create_player(
        &self,
        game_id: GameId,
        nickname: &str,
        is_host: bool,
    ) -> Result<Player, StoreError>;

    fn player(&self, id: PlayerId) -> Result<Player, StoreError>;

    /// All players of a game in join order.
    fn players_in_game(&self, game_id: GameId) -> Result<Vec<Player>, StoreError>;

    fn delete_player(&self, id: PlayerId) -> Result<(), StoreError>;

    fn set_player_status(
        &self,
        id: PlayerId,
        status: PlayerStatus,
    ) -> Result<Player, StoreError>;

    fn set_host(&self, id: PlayerId, is_host: bool) -> Result<Player, StoreError>;

    // -- rounds ---------------------------------------------------------

    /// Persists a new round.
    ///
    /// # Errors
    /// [`StoreError::ActiveRound`] if the game still has a non-terminal
    /// round.
    fn create_round(&self, new: NewRound) -> Result<Round, StoreError>;

    fn round(&self, id: RoundId) -> Result<Round, StoreError>;

    /// The most recently created round of a game, if any.
    fn last_round(&self, game_id: GameId) -> Result<Option<Round>, StoreError>;

    /// All rounds of a game in creation order.
    fn rounds_in_game(&self, game_id: GameId) -> Result<Vec<Round>, StoreError>;

    /// Applies `update` if the round is currently `expected`.
    ///
    /// # Errors
    /// [`StoreError::StaleRound`] if the round's status differs.
    fn update_round(
        &self,
        id: RoundId,
        expected: RoundStatus,
        update: RoundUpdate,
    ) -> Result<Round, StoreError>;

    // -- questions ------------------------------------------------------

    fn create_question(
        &self,
        level: QuestionLevel,
        content: &str,
    ) -> Result<Question, StoreError>;

    fn question(&self, id: QuestionId) -> Result<Question, StoreError>;

    fn questions(&self) -> Result<Vec<Question>, StoreError>;
}
