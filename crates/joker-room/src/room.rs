//! Room actor: an isolated Tokio task that owns the live clients of one game.
//!
//! Each room runs in its own task, communicating with the outside world
//! through a bounded mpsc channel. Membership and fan-out never share
//! mutable state; commands are applied one at a time in arrival order, so
//! a broadcast queued after a join always reaches the joined client.

use std::collections::HashMap;

use joker_protocol::{Codec, GameCode, JsonCodec, PlayerId, ServerEvent};
use tokio::sync::{mpsc, oneshot};

use crate::{Client, ClientId, Frame, RoomError};

/// Commands sent to a room actor through its channel.
enum RoomCommand {
    /// Attach a client, superseding any prior client of the same player.
    Join(Client),

    /// Detach a client. Ignored if `client_id` was already superseded.
    Leave {
        player_id: PlayerId,
        client_id: ClientId,
    },

    /// Deliver a frame to every connected client.
    Broadcast(Frame),

    /// Deliver a frame to one player, if connected.
    SendTo { player_id: PlayerId, frame: Frame },

    /// Request a membership snapshot.
    Info { reply: oneshot::Sender<RoomInfo> },

    /// Stop the loop and drop every client queue.
    Shutdown,
}

/// A snapshot of who is connected to a room.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: GameCode,
    /// Connected players, ascending.
    pub player_ids: Vec<PlayerId>,
}

impl RoomInfo {
    pub fn client_count(&self) -> usize {
        self.player_ids.len()
    }

    pub fn is_connected(&self, player_id: PlayerId) -> bool {
        self.player_ids.contains(&player_id)
    }
}

/// Handle to a running room actor.
///
/// Cheap to clone; the registry holds one per game code. Every method
/// enqueues a command and returns once the room has accepted it, so an
/// `Ok` means "queued", not "delivered".
#[derive(Clone)]
pub struct RoomHandle {
    code: GameCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the game code this room serves.
    pub fn code(&self) -> &GameCode {
        &self.code
    }

    /// Attaches a client to the room.
    pub async fn join(&self, client: Client) -> Result<(), RoomError> {
        self.send(RoomCommand::Join(client)).await
    }

    /// Detaches the client `client_id` of `player_id`.
    pub async fn leave(
        &self,
        player_id: PlayerId,
        client_id: ClientId,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Leave {
            player_id,
            client_id,
        })
        .await
    }

    /// Encodes `event` once and queues it for every connected client.
    pub async fn broadcast(&self, event: &ServerEvent) -> Result<(), RoomError> {
        let frame = encode(event)?;
        tracing::debug!(room = %self.code, event = event.kind(), "broadcast");
        self.broadcast_frame(frame).await
    }

    /// Queues an already-encoded frame for every connected client.
    pub async fn broadcast_frame(&self, frame: Frame) -> Result<(), RoomError> {
        self.send(RoomCommand::Broadcast(frame)).await
    }

    /// Queues `event` for `player_id` only. Dropped if that player has no
    /// live client at the moment the room processes the command.
    pub async fn send_to(
        &self,
        player_id: PlayerId,
        event: &ServerEvent,
    ) -> Result<(), RoomError> {
        let frame = encode(event)?;
        tracing::debug!(
            room = %self.code,
            %player_id,
            event = event.kind(),
            "unicast"
        );
        self.send(RoomCommand::SendTo { player_id, frame }).await
    }

    /// Requests a membership snapshot.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Info { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

fn encode(event: &ServerEvent) -> Result<Frame, RoomError> {
    Ok(Frame::from(JsonCodec.encode(event)?))
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    code: GameCode,
    clients: HashMap<ClientId, Client>,
    clients_by_player: HashMap<PlayerId, ClientId>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until shutdown or until every handle is dropped.
    async fn run(mut self) {
        tracing::info!(room = %self.code, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join(client) => self.handle_join(client),
                RoomCommand::Leave {
                    player_id,
                    client_id,
                } => self.handle_leave(player_id, client_id),
                RoomCommand::Broadcast(frame) => self.handle_broadcast(frame),
                RoomCommand::SendTo { player_id, frame } => {
                    self.handle_send_to(player_id, frame);
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room = %self.code, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(
            room = %self.code,
            dropped_clients = self.clients.len(),
            "room actor stopped"
        );
    }

    fn handle_join(&mut self, client: Client) {
        let player_id = client.player_id();
        let client_id = client.id();

        if let Some(previous) =
            self.clients_by_player.insert(player_id, client_id)
        {
            // Dropping the old client closes its queue; its writer closes
            // the socket without reporting a disconnect.
            self.clients.remove(&previous);
            tracing::info!(
                room = %self.code,
                %player_id,
                old = %previous,
                new = %client_id,
                "client superseded"
            );
        }
        self.clients.insert(client_id, client);

        tracing::info!(
            room = %self.code,
            %player_id,
            %client_id,
            clients = self.clients.len(),
            "client joined"
        );
    }

    fn handle_leave(&mut self, player_id: PlayerId, client_id: ClientId) {
        if self.clients.remove(&client_id).is_none() {
            tracing::debug!(
                room = %self.code,
                %player_id,
                %client_id,
                "leave for unknown client, ignoring"
            );
            return;
        }
        if self.clients_by_player.get(&player_id) == Some(&client_id) {
            self.clients_by_player.remove(&player_id);
        }

        tracing::info!(
            room = %self.code,
            %player_id,
            %client_id,
            clients = self.clients.len(),
            "client left"
        );
    }

    fn handle_broadcast(&self, frame: Frame) {
        for client in self.clients.values() {
            if !client.send(frame.clone()) {
                // The writer is gone; its teardown will send a Leave.
                tracing::debug!(
                    room = %self.code,
                    client_id = %client.id(),
                    "dropping frame for closed client"
                );
            }
        }
    }

    fn handle_send_to(&self, player_id: PlayerId, frame: Frame) {
        let client = self
            .clients_by_player
            .get(&player_id)
            .and_then(|id| self.clients.get(id));
        match client {
            Some(client) => {
                client.send(frame);
            }
            None => {
                tracing::debug!(
                    room = %self.code,
                    %player_id,
                    "player not connected, unicast dropped"
                );
            }
        }
    }

    fn info(&self) -> RoomInfo {
        let mut player_ids: Vec<PlayerId> =
            self.clients_by_player.keys().copied().collect();
        player_ids.sort_unstable();
        RoomInfo {
            code: self.code.clone(),
            player_ids,
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `channel_size` bounds the command queue; callers wait when it is full.
pub(crate) fn spawn_room(code: GameCode, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        code: code.clone(),
        clients: HashMap::new(),
        clients_by_player: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
