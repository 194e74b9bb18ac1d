//! Wire protocol for Joker.
//!
//! - **Types** ([`ServerEvent`], identity newtypes, [`GameCode`]): what
//!   travels to clients.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become text
//!   frames.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about sockets or rooms; it only knows
//! how events look on the wire.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AnswerSubmitted, GameCode, GameEnded, GameId, NoPayload, PlayerId,
    PlayerJoined, PlayerRef, QuestionCard, QuestionId, RoundId, RoundSkipped,
    RoundStarted, ServerEvent,
};
