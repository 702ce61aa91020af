//! Server-wide configuration.

use std::time::Duration;

use faceoff_game::{CategoryConfig, GameConfig};
use faceoff_room::RoomConfig;
use serde::{Deserialize, Serialize};

/// Everything a [`FaceoffServer`](crate::FaceoffServer) needs to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// WebSocket listener address.
    pub ws_addr: String,
    /// HTTP API listener address.
    pub http_addr: String,
    /// A connection that sends nothing for this long is closed.
    pub idle_timeout: Duration,
    pub room: RoomConfig,
    pub game: GameConfig,
    pub categories: CategoryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_addr: "127.0.0.1:8000".to_string(),
            http_addr: "127.0.0.1:8001".to_string(),
            idle_timeout: Duration::from_secs(30 * 60),
            room: RoomConfig::default(),
            game: GameConfig::default(),
            categories: CategoryConfig::default(),
        }
    }
}
