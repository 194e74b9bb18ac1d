//! Per-socket pumps: one task writes queued frames, one task reads.
//!
//! The reader only watches for the socket failing or closing; inbound
//! content is ignored. Whichever side ends first runs the teardown:
//!   1. signal the other loop to stop
//!   2. close the socket
//!   3. leave the room
//!   4. post a [`DisconnectEvent`] (unless the room closed our queue)
//!
//! An atomic flag makes the teardown run exactly once per socket.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use joker_protocol::{GameCode, PlayerId};
use joker_room::{Client, ClientId, OutboundReceiver, RoomError, RoomHandle};
use joker_transport::Connection;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::disconnect::DisconnectEvent;

/// Why a socket's pumps stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    /// The peer closed the socket.
    Closed,
    /// Reading from the socket failed.
    ReadFailed,
    /// Writing to the socket failed.
    WriteFailed,
    /// The room dropped our queue (superseded client or room shutdown).
    Released,
}

impl Ending {
    /// Whether the game should hear about this.
    fn reports_disconnect(self) -> bool {
        !matches!(self, Self::Released)
    }
}

/// Shared teardown state of one socket.
struct Teardown<C: Connection> {
    done: AtomicBool,
    conn: Arc<C>,
    room: RoomHandle,
    player_id: PlayerId,
    client_id: ClientId,
    disconnects: mpsc::UnboundedSender<DisconnectEvent>,
    stop: watch::Sender<bool>,
}

impl<C: Connection> Teardown<C> {
    async fn run(&self, ending: Ending) {
        if self.done.swap(true, Ordering::AcqRel) {
            return;
        }
        let code = self.room.code().clone();
        tracing::info!(
            room = %code,
            player_id = %self.player_id,
            conn_id = %self.conn.id(),
            ?ending,
            "connection ending"
        );

        let _ = self.stop.send(true);
        if let Err(e) = self.conn.close().await {
            tracing::debug!(conn_id = %self.conn.id(), error = %e, "close failed");
        }
        if let Err(e) = self.room.leave(self.player_id, self.client_id).await {
            tracing::debug!(room = %code, error = %e, "leave after close failed");
        }
        if ending.reports_disconnect() {
            let event = DisconnectEvent {
                game_code: code,
                player_id: self.player_id,
            };
            if self.disconnects.send(event).is_err() {
                tracing::warn!(
                    player_id = %self.player_id,
                    "disconnect worker gone, event dropped"
                );
            }
        }
    }
}

/// Everything needed to run one attached socket.
pub(crate) struct Attachment<C: Connection> {
    pub conn: C,
    pub room: RoomHandle,
    pub player_id: PlayerId,
    pub client_id: ClientId,
    pub outbound: OutboundReceiver,
    pub disconnects: mpsc::UnboundedSender<DisconnectEvent>,
}

/// Spawns the writer and reader tasks of an attached socket.
pub(crate) fn spawn_pumps<C: Connection>(
    attachment: Attachment<C>,
) -> (JoinHandle<()>, JoinHandle<()>) {
    let Attachment {
        conn,
        room,
        player_id,
        client_id,
        outbound,
        disconnects,
    } = attachment;

    let (stop, _) = watch::channel(false);
    let writer_stop = stop.subscribe();
    let reader_stop = stop.subscribe();
    let teardown = Arc::new(Teardown {
        done: AtomicBool::new(false),
        conn: Arc::new(conn),
        room,
        player_id,
        client_id,
        disconnects,
        stop,
    });

    let writer = tokio::spawn(write_loop(teardown.clone(), outbound, writer_stop));
    let reader = tokio::spawn(read_loop(teardown, reader_stop));
    (writer, reader)
}

/// Drains the outbound queue onto the socket, in order.
async fn write_loop<C: Connection>(
    teardown: Arc<Teardown<C>>,
    mut outbound: OutboundReceiver,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    teardown.run(Ending::Released).await;
                    break;
                };
                if let Err(e) = teardown.conn.send_text(&frame).await {
                    tracing::debug!(
                        player_id = %teardown.player_id,
                        error = %e,
                        "send failed"
                    );
                    teardown.run(Ending::WriteFailed).await;
                    break;
                }
            }
            _ = stop.changed() => break,
        }
    }
}

/// Waits for the socket to fail or close. Inbound frames are discarded.
async fn read_loop<C: Connection>(
    teardown: Arc<Teardown<C>>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            received = teardown.conn.recv() => match received {
                Ok(Some(data)) => {
                    tracing::debug!(
                        player_id = %teardown.player_id,
                        bytes = data.len(),
                        "ignoring inbound frame"
                    );
                }
                Ok(None) => {
                    teardown.run(Ending::Closed).await;
                    break;
                }
                Err(e) => {
                    tracing::debug!(
                        player_id = %teardown.player_id,
                        error = %e,
                        "recv failed"
                    );
                    teardown.run(Ending::ReadFailed).await;
                    break;
                }
            },
            _ = stop.changed() => break,
        }
    }
}

/// Attaches `conn` to `room` as `player_id` and starts its pumps.
pub(crate) async fn attach<C: Connection>(
    conn: C,
    code: &GameCode,
    room: RoomHandle,
    player_id: PlayerId,
    disconnects: mpsc::UnboundedSender<DisconnectEvent>,
) -> Result<(JoinHandle<()>, JoinHandle<()>), RoomError> {
    let (client, outbound) = Client::new(player_id);
    let client_id = client.id();
    room.join(client).await?;
    tracing::info!(
        room = %code,
        %player_id,
        %client_id,
        conn_id = %conn.id(),
        "socket attached"
    );

    Ok(spawn_pumps(Attachment {
        conn,
        room,
        player_id,
        client_id,
        outbound,
        disconnects,
    }))
}
