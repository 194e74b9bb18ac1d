//! Persisted records: games, players, rounds and questions.

use std::fmt;

use joker_protocol::{GameCode, GameId, PlayerId, QuestionId, RoundId};
use serde::{Deserialize, Serialize};

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Lobby: players may join and leave.
    Waiting,
    /// Rounds are being played.
    Playing,
    /// Terminal.
    Ended,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Online,
    Offline,
}

/// The round state machine.
///
/// ```text
/// WaitingForQuestion ──► WaitingForAnswer ──► WaitingForDraw ──► Revealed
///                                                          └──► Done
/// ```
///
/// Any non-terminal state may also be skipped straight to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    WaitingForQuestion,
    WaitingForAnswer,
    WaitingForDraw,
    /// The answerer drew the joker.
    Revealed,
    /// The answerer drew a safe card, or the round was skipped.
    Done,
}

impl RoundStatus {
    /// Returns `true` once the round can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Revealed | Self::Done)
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WaitingForQuestion => "waiting_for_question",
            Self::WaitingForAnswer => "waiting_for_answer",
            Self::WaitingForDraw => "waiting_for_draw",
            Self::Revealed => "revealed",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// One card in a round's deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Card {
    Safe,
    Joker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionLevel {
    Normal,
    Spicy,
}

impl QuestionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Spicy => "spicy",
        }
    }
}

/// Names a record kind in "not found" errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Game,
    Player,
    Round,
    Question,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Game => "game",
            Self::Player => "player",
            Self::Round => "round",
            Self::Question => "question",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub code: GameCode,
    pub status: GameStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Ids grow with join order.
    pub id: PlayerId,
    pub game_id: GameId,
    pub nickname: String,
    pub is_host: bool,
    pub status: PlayerStatus,
}

impl Player {
    pub fn is_online(&self) -> bool {
        self.status == PlayerStatus::Online
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: RoundId,
    pub game_id: GameId,
    pub questioner_id: PlayerId,
    pub answerer_id: PlayerId,
    pub deck: Vec<Card>,
    pub question_id: Option<QuestionId>,
    pub answer: Option<String>,
    pub is_joker: bool,
    pub status: RoundStatus,
}

impl Round {
    /// Returns `true` if `player_id` is the one the round is currently
    /// waiting on.
    pub fn is_waiting_on(&self, player_id: PlayerId) -> bool {
        match self.status {
            RoundStatus::WaitingForQuestion => self.questioner_id == player_id,
            RoundStatus::WaitingForAnswer | RoundStatus::WaitingForDraw => {
                self.answerer_id == player_id
            }
            RoundStatus::Revealed | RoundStatus::Done => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub level: QuestionLevel,
    pub content: String,
}

/// Per-player line of a [`GameSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub nickname: String,
    pub joker_cards_drawn: u32,
}

/// End-of-game statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub total_rounds: u32,
    pub joker_cards: u32,
    pub players: Vec<PlayerSummary>,
}
