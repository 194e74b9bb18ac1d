//! Server configuration.

use std::time::Duration;

use joker_game::GameRules;
use joker_room::DEFAULT_CHANNEL_SIZE;

/// Environment variable overriding [`ServerConfig::bind_addr`].
pub const BIND_ADDR_ENV: &str = "JOKER_BIND_ADDR";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Command queue size of each room actor.
    pub room_channel_size: usize,

    /// How long a client may take to finish the WebSocket upgrade.
    pub handshake_timeout: Duration,

    pub rules: GameRules,
}

impl ServerConfig {
    /// Defaults, with the bind address taken from `JOKER_BIND_ADDR` when
    /// set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var(BIND_ADDR_ENV) {
            if !addr.trim().is_empty() {
                config.bind_addr = addr.trim().to_owned();
            }
        }
        config
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_channel_size: DEFAULT_CHANNEL_SIZE,
            handshake_timeout: Duration::from_secs(5),
            rules: GameRules::default(),
        }
    }
}
