//! Unified error type for the Joker server.

use joker_game::GameError;
use joker_protocol::ProtocolError;
use joker_room::RoomError;
use joker_transport::TransportError;

use crate::route::RouteError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum JokerError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad game code).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (room shut down).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game rule or storage error.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The socket's request target did not name a game and player.
    #[error(transparent)]
    Route(#[from] RouteError),
}
