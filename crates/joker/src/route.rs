//! Parsing the socket request target `/ws/games/{code}?player_id={id}`.

use joker_protocol::{GameCode, PlayerId, ProtocolError};

const PATH_PREFIX: &str = "/ws/games/";

/// Why a request target was rejected.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("unexpected path: {0}")]
    UnknownPath(String),

    #[error(transparent)]
    InvalidCode(#[from] ProtocolError),

    #[error("missing player_id query parameter")]
    MissingPlayerId,

    #[error("invalid player_id: {0:?}")]
    InvalidPlayerId(String),
}

/// The game and player a socket attaches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub code: GameCode,
    pub player_id: PlayerId,
}

impl ConnectTarget {
    /// Parses an origin-form request target. Query parameters other than
    /// `player_id` are ignored.
    pub fn parse(target: &str) -> Result<Self, RouteError> {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));

        let raw_code = path
            .strip_prefix(PATH_PREFIX)
            .map(|rest| rest.trim_end_matches('/'))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .ok_or_else(|| RouteError::UnknownPath(path.to_owned()))?;
        let code = GameCode::parse(raw_code)?;

        let raw_id = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "player_id")
            .map(|(_, value)| value)
            .ok_or(RouteError::MissingPlayerId)?;
        let player_id = raw_id
            .parse::<u64>()
            .map(PlayerId)
            .map_err(|_| RouteError::InvalidPlayerId(raw_id.to_owned()))?;

        Ok(Self { code, player_id })
    }
}
