//! Room configuration and lifecycle status.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room the registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfig {
    /// Maximum players allowed in the room.
    pub max_players: usize,

    /// Minimum players required to start the game.
    pub min_players: usize,

    /// Rooms idle for longer than this are removed by the sweep.
    pub room_ttl: Duration,

    /// How often the sweep runs.
    pub sweep_interval: Duration,

    /// Capacity of each room actor's command channel.
    pub channel_size: usize,
}

impl RoomConfig {
    /// The part of the config published with each room snapshot.
    pub fn settings(&self) -> RoomSettings {
        RoomSettings {
            max_players: self.max_players,
            min_players: self.min_players,
        }
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 8,
            min_players: 1,
            room_ttl: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(30 * 60),
            channel_size: 64,
        }
    }
}

/// Per-room limits, as clients see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    pub max_players: usize,
    pub min_players: usize,
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle status of a room.
///
/// ```text
/// Waiting → Active
///    ↓
/// Abandoned
/// ```
///
/// - **Waiting**: accepting new players, no game yet.
/// - **Active**: a game has been started. Only reconnections by name are
///   accepted from here on.
/// - **Abandoned**: the last player left. The registry drops the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Active,
    Abandoned,
}

impl RoomStatus {
    /// Returns `true` if new players may join.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Waiting)
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}
