//! # Joker
//!
//! Live session coordinator for the Joker party game.
//!
//! A request layer drives games through [`GameController`]; every state
//! change it persists is pushed to the game's players over WebSocket. Each
//! game code has one room actor that owns its connected sockets, and a
//! single worker decides what a dropped socket means for the game.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use joker::prelude::*;
//!
//! # async fn run() -> Result<(), JokerError> {
//! let server = JokerServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(Arc::new(MemoryStore::new()))
//!     .await?;
//! let controller = server.controller();
//! let game = controller.create_game().await?;
//! tracing::info!(code = %game.code, "lobby open");
//! server.run().await
//! # }
//! ```

mod config;
mod controller;
mod disconnect;
mod error;
mod handler;
mod route;
mod server;

pub use config::{BIND_ADDR_ENV, ServerConfig};
pub use controller::GameController;
pub use disconnect::{
    DisconnectEvent, DisconnectOutcome, RoundEffect, run_disconnect_worker,
};
pub use error::JokerError;
pub use route::{ConnectTarget, RouteError};
pub use server::{JokerServer, JokerServerBuilder};

/// Convenience re-exports for embedding the server.
pub mod prelude {
    pub use crate::{
        ConnectTarget, DisconnectEvent, DisconnectOutcome, GameController,
        JokerError, JokerServer, JokerServerBuilder, RoundEffect, ServerConfig,
    };
    pub use joker_game::{
        Game, GameError, GameRules, GameStatus, MemoryStore, Player,
        PlayerStatus, Question, QuestionLevel, Round, RoundStatus, Store,
    };
    pub use joker_protocol::{GameCode, PlayerId, QuestionId, RoundId, ServerEvent};
    pub use joker_room::{Client, RoomRegistry};
}
