//! Codec trait and implementations for turning events into text frames.
//!
//! Clients read every outbound frame as text, so the codec works on
//! `String`/`&str` rather than raw bytes. The room encodes an event once
//! and hands the same frame to every connected client.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to text frames and decode them back.
///
/// `Send + Sync + 'static` because a codec lives inside long-lived room
/// and connection tasks that Tokio may move between threads.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the frame is malformed or does not
    /// match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use joker_protocol::{Codec, JsonCodec, ServerEvent, GameEnded, GameCode};
///
/// let codec = JsonCodec;
/// let code = GameCode::parse("AB12CD").unwrap();
/// let frame = codec
///     .encode(&ServerEvent::GameEnded(GameEnded { game_code: code }))
///     .unwrap();
/// assert_eq!(frame, r#"{"type":"game_ended","data":{"gameCode":"AB12CD"}}"#);
///
/// let decoded: ServerEvent = codec.decode(frame.as_bytes()).unwrap();
/// assert_eq!(decoded.kind(), "game_ended");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
