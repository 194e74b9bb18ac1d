//! A connected client as seen by its room.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use joker_protocol::PlayerId;
use tokio::sync::mpsc;

/// An encoded text frame. Shared between every recipient of a broadcast.
pub type Frame = Arc<str>;

/// Channel sender for delivering frames to one client's socket writer.
pub type OutboundSender = mpsc::UnboundedSender<Frame>;

/// The receiving half, drained by the connection's writer task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Frame>;

/// Counter for generating unique client IDs.
static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one socket attachment. Two connections of the same player
/// get different client IDs, which is how a room tells a stale leave from
/// the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl ClientId {
    fn next() -> Self {
        Self(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// A player's live attachment to a room.
///
/// The room owns the `Client` (and therefore the sending half of its
/// queue). Dropping it closes the queue, which the writer task observes as
/// end of stream.
#[derive(Debug)]
pub struct Client {
    id: ClientId,
    player_id: PlayerId,
    sender: OutboundSender,
}

impl Client {
    /// Creates a client for `player_id` and the receiver its writer drains.
    pub fn new(player_id: PlayerId) -> (Self, OutboundReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let client = Self {
            id: ClientId::next(),
            player_id,
            sender,
        };
        (client, receiver)
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Enqueues a frame. Returns `false` if the writer is gone.
    pub(crate) fn send(&self, frame: Frame) -> bool {
        self.sender.send(frame).is_ok()
    }
}
