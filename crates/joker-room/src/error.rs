//! Error types for the room layer.

use joker_protocol::{GameCode, ProtocolError};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room's command channel is closed (the room was shut down).
    #[error("room {0} is unavailable")]
    Unavailable(GameCode),

    /// An event could not be turned into a frame.
    #[error("failed to encode event: {0}")]
    Encode(#[from] ProtocolError),
}
