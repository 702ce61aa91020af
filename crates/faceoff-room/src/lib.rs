//! Rooms for the Faceoff game server.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! member list, the room's game, and the outbound channel of every
//! connected client.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates, expires and routes to rooms
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Room`]: membership rules: join, leave, host transfer, reconnect
//! - [`ServerEvent`]: everything pushed to clients
//! - [`RoomConfig`]: player limits, expiry, channel sizes

mod actor;
mod config;
mod error;
mod events;
mod lobby;
mod registry;

pub use actor::{GameAction, OutboundSender, RoomHandle, RoomInfo};
pub use config::{RoomConfig, RoomSettings, RoomStatus};
pub use error::RoomError;
pub use events::ServerEvent;
pub use lobby::{Disconnect, JoinOutcome, LeaveOutcome, MAX_NAME_LEN, Room, RoomPlayer, validate_name};
pub use registry::{RoomRegistry, RoomStats};
