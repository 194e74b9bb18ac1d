//! Live room management for Joker.
//!
//! Each active game code has one room: an isolated Tokio task (actor model)
//! that owns the connected clients and fans out encoded events.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: maps game codes to running rooms
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Client`]: one socket attachment and its outbound queue

mod client;
mod error;
mod registry;
mod room;

pub use client::{Client, ClientId, Frame, OutboundReceiver, OutboundSender};
pub use error::RoomError;
pub use registry::{DEFAULT_CHANNEL_SIZE, RoomRegistry};
pub use room::{RoomHandle, RoomInfo};
