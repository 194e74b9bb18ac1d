//! `JokerServer` builder and accept loop.
//!
//! Ties the layers together: each accepted socket is routed to a game and
//! player, attached to the game's room, and pumped until it closes. A
//! single worker applies the disconnect policy to sockets that go away.

use std::sync::Arc;
use std::time::Duration;

use joker_game::{GameRules, Store};
use joker_room::RoomRegistry;
use joker_transport::{
    Accepted, Connection, Transport, WebSocketConnection, WebSocketTransport,
};
use tokio::sync::mpsc;

use crate::JokerError;
use crate::config::ServerConfig;
use crate::controller::GameController;
use crate::disconnect::{DisconnectEvent, run_disconnect_worker};
use crate::handler;
use crate::route::ConnectTarget;

/// Builder for configuring and starting a Joker server.
///
/// # Example
///
/// ```rust,ignore
/// use joker::prelude::*;
///
/// let server = JokerServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(Arc::new(MemoryStore::new()))
///     .await?;
/// server.run().await
/// ```
#[derive(Debug, Clone, Default)]
pub struct JokerServerBuilder {
    config: ServerConfig,
}

impl JokerServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn room_channel_size(mut self, size: usize) -> Self {
        self.config.room_channel_size = size;
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    pub fn rules(mut self, rules: GameRules) -> Self {
        self.config.rules = rules;
        self
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and wires the controller to a fresh registry.
    pub async fn build<S: Store>(
        self,
        store: Arc<S>,
    ) -> Result<JokerServer<S>, JokerError> {
        let ServerConfig {
            bind_addr,
            room_channel_size,
            handshake_timeout,
            rules,
        } = self.config;

        let transport = WebSocketTransport::bind(&bind_addr)
            .await?
            .with_handshake_timeout(handshake_timeout);
        let registry = Arc::new(RoomRegistry::with_channel_size(room_channel_size));
        let controller = Arc::new(GameController::new(store, registry, rules));
        let (disconnects, events) = mpsc::unbounded_channel();

        Ok(JokerServer {
            transport,
            controller,
            disconnects,
            events,
        })
    }
}

/// A bound Joker server.
///
/// Built by [`JokerServerBuilder`]. Call [`run()`](Self::run) to start
/// accepting connections. Game actions
/// go through [`controller()`](Self::controller).
pub struct JokerServer<S: Store> {
    transport: WebSocketTransport,
    controller: Arc<GameController<S>>,
    disconnects: mpsc::UnboundedSender<DisconnectEvent>,
    events: mpsc::UnboundedReceiver<DisconnectEvent>,
}

impl<S: Store> JokerServer<S> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    pub fn controller(&self) -> Arc<GameController<S>> {
        Arc::clone(&self.controller)
    }

    /// Runs the disconnect worker and the accept loop. Runs until the
    /// process is terminated.
    pub async fn run(self) -> Result<(), JokerError> {
        let Self {
            mut transport,
            controller,
            disconnects,
            events,
        } = self;
        tokio::spawn(run_disconnect_worker(Arc::clone(&controller), events));
        tracing::info!("joker server running");

        loop {
            match transport.accept().await {
                Ok(accepted) => {
                    let controller = Arc::clone(&controller);
                    let disconnects = disconnects.clone();
                    tokio::spawn(async move {
                        if let Err(e) =
                            serve_connection(accepted, controller, disconnects).await
                        {
                            tracing::info!(error = %e, "connection refused");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Admits one upgraded socket and hands it to the pumps. A socket whose
/// target does not name a player of an existing game is closed.
async fn serve_connection<S: Store>(
    accepted: Accepted<WebSocketConnection>,
    controller: Arc<GameController<S>>,
    disconnects: mpsc::UnboundedSender<DisconnectEvent>,
) -> Result<(), JokerError> {
    let Accepted { connection, target } = accepted;

    let admitted = match ConnectTarget::parse(&target) {
        Ok(t) => controller.admit(&t).await.map(|_| t).map_err(JokerError::from),
        Err(e) => Err(JokerError::from(e)),
    };
    let target = match admitted {
        Ok(target) => target,
        Err(e) => {
            tracing::debug!(%target, conn_id = %connection.id(), "rejecting socket");
            if let Err(close) = connection.close().await {
                tracing::debug!(error = %close, "close after rejection failed");
            }
            return Err(e);
        }
    };

    let room = controller.registry().get_or_create(&target.code).await;
    handler::attach(connection, &target.code, room, target.player_id, disconnects)
        .await?;
    Ok(())
}
