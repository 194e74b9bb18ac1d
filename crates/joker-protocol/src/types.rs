//! Core protocol types: identities and the outbound event catalog.
//!
//! Every frame the server pushes to a client is one [`ServerEvent`],
//! serialized as an envelope `{ "type": <tag>, "data": <payload> }` with
//! camelCase payload fields.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Declares a `u64` newtype that serializes as a plain number and prints
/// with a short prefix in logs.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

id_type!(
    /// A persisted player. Ids grow with join order, so sorting players by
    /// id yields the seat order used for turn rotation.
    PlayerId,
    "P"
);
id_type!(
    /// A persisted game.
    GameId,
    "G"
);
id_type!(
    /// A persisted round.
    RoundId,
    "R"
);
id_type!(
    /// A persisted question card.
    QuestionId,
    "Q"
);

/// The short code players type to find a game, e.g. `AB12CD`.
///
/// Always exactly [`GameCode::LENGTH`] ASCII letters or digits. Parsing is
/// the only way to build one, so every `GameCode` in the system is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameCode(String);

impl GameCode {
    /// Number of characters in a game code.
    pub const LENGTH: usize = 6;

    /// Validates `raw` against `^[A-Za-z0-9]{6}$`.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        if raw.len() == Self::LENGTH
            && raw.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            Ok(Self(raw.to_owned()))
        } else {
            Err(ProtocolError::InvalidGameCode(raw.to_owned()))
        }
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GameCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GameCode> for String {
    fn from(code: GameCode) -> Self {
        code.0
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// `player_joined`: someone joined the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoined {
    pub id: PlayerId,
    pub nickname: String,
    pub is_host: bool,
}

/// A player reference used by `player_left`, `host_transferred` and
/// `player_offline`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRef {
    pub id: PlayerId,
    pub nickname: String,
}

/// `game_started` / `next_round_started`: who asks and who answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundStarted {
    pub round_id: RoundId,
    pub question_player_id: PlayerId,
    pub answerer_id: PlayerId,
}

/// `round_question` / `joker_revealed`: the question card itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCard {
    pub level: String,
    pub content: String,
}

/// `answer_submitted`: the answerer's reply, visible to everyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmitted {
    pub answer: String,
}

/// `game_ended`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEnded {
    pub game_code: GameCode,
}

/// `round_skipped`: the round was abandoned and a new pair was drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSkipped {
    /// Human-readable explanation, e.g. "Bob disconnected".
    pub reason: String,
    #[serde(flatten)]
    pub round: RoundStarted,
}

/// Payload of events that carry no data. Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoPayload {}

// ---------------------------------------------------------------------------
// ServerEvent: the envelope
// ---------------------------------------------------------------------------

/// Every event the server pushes to clients.
///
/// Adjacently tagged, so `ServerEvent::AnswerTime(NoPayload {})` goes out
/// as `{"type":"answer_time","data":{}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    PlayerJoined(PlayerJoined),
    GameStarted(RoundStarted),
    NextRoundStarted(RoundStarted),
    /// Unicast to the answerer only.
    RoundQuestion(QuestionCard),
    AnswerTime(NoPayload),
    AnswerSubmitted(AnswerSubmitted),
    JokerRevealed(QuestionCard),
    PlayerSafe(NoPayload),
    GameEnded(GameEnded),
    PlayerLeft(PlayerRef),
    HostTransferred(PlayerRef),
    PlayerOffline(PlayerRef),
    RoundSkipped(RoundSkipped),
}

impl ServerEvent {
    /// The wire tag of this event, handy for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerJoined(_) => "player_joined",
            Self::GameStarted(_) => "game_started",
            Self::NextRoundStarted(_) => "next_round_started",
            Self::RoundQuestion(_) => "round_question",
            Self::AnswerTime(_) => "answer_time",
            Self::AnswerSubmitted(_) => "answer_submitted",
            Self::JokerRevealed(_) => "joker_revealed",
            Self::PlayerSafe(_) => "player_safe",
            Self::GameEnded(_) => "game_ended",
            Self::PlayerLeft(_) => "player_left",
            Self::HostTransferred(_) => "host_transferred",
            Self::PlayerOffline(_) => "player_offline",
            Self::RoundSkipped(_) => "round_skipped",
        }
    }
}
