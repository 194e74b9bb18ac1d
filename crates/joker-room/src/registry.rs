//! Room registry: the process-wide map from game code to live room.

use std::collections::HashMap;

use joker_protocol::GameCode;
use tokio::sync::RwLock;

use crate::RoomHandle;
use crate::room::spawn_room;

/// Default command channel size for room actors.
pub const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Tracks the running room of every active game.
///
/// One `RwLock` spans the whole map, so a lookup issued after a
/// `create_room` for the same code always observes the new room.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<GameCode, RoomHandle>>,
    channel_size: usize,
}

impl RoomRegistry {
    /// Creates an empty registry using [`DEFAULT_CHANNEL_SIZE`].
    pub fn new() -> Self {
        Self::with_channel_size(DEFAULT_CHANNEL_SIZE)
    }

    /// Creates an empty registry whose rooms use `channel_size` slots.
    pub fn with_channel_size(channel_size: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            channel_size: channel_size.max(1),
        }
    }

    /// Starts a fresh room for `code`. A room already registered under the
    /// same code is replaced and shut down.
    pub async fn create_room(&self, code: GameCode) -> RoomHandle {
        let handle = spawn_room(code.clone(), self.channel_size);
        let replaced = self
            .rooms
            .write()
            .await
            .insert(code.clone(), handle.clone());

        if let Some(old) = replaced {
            tracing::info!(room = %code, "room replaced");
            let _ = old.shutdown().await;
        } else {
            tracing::info!(room = %code, "room created");
        }
        handle
    }

    /// Returns the room for `code`, if one is running.
    pub async fn get_room(&self, code: &GameCode) -> Option<RoomHandle> {
        self.rooms.read().await.get(code).cloned()
    }

    /// Returns the room for `code`, creating it if absent. The check and
    /// the insert happen under one write lock.
    pub async fn get_or_create(&self, code: &GameCode) -> RoomHandle {
        let mut rooms = self.rooms.write().await;
        if let Some(handle) = rooms.get(code) {
            return handle.clone();
        }
        let handle = spawn_room(code.clone(), self.channel_size);
        rooms.insert(code.clone(), handle.clone());
        tracing::info!(room = %code, "room created on first connection");
        handle
    }

    /// Removes the room for `code` and shuts it down. Returns `false` if
    /// there was none.
    pub async fn delete_room(&self, code: &GameCode) -> bool {
        let removed = self.rooms.write().await.remove(code);
        match removed {
            Some(handle) => {
                let _ = handle.shutdown().await;
                tracing::info!(room = %code, "room deleted");
                true
            }
            None => false,
        }
    }

    /// Returns the number of registered rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
