//! Room membership: join, leave, host transfer and reconnect by name.
//!
//! `Room` is plain data with no I/O. The room actor owns one and is the
//! only thing that mutates it.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use faceoff_protocol::{PlayerId, RoomCode};
use faceoff_transport::ConnectionId;
use serde::{Serialize, Serializer};
use tokio::time::Instant;

use crate::{RoomError, RoomSettings, RoomStatus};

/// Longest accepted display name, in characters.
pub const MAX_NAME_LEN: usize = 32;

/// Trims a display name and checks its length.
pub fn validate_name(name: &str) -> Result<String, RoomError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RoomError::Validation("player name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(RoomError::Validation(format!(
            "player name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_owned())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn is_bound<S: Serializer>(conn: &Option<ConnectionId>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_bool(conn.is_some())
}

// ---------------------------------------------------------------------------
// RoomPlayer
// ---------------------------------------------------------------------------

/// A member of a room. Survives disconnects while a game is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlayer {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    /// The live connection, if any. Published as `connected`.
    #[serde(rename = "connected", serialize_with = "is_bound")]
    pub connection: Option<ConnectionId>,
}

impl RoomPlayer {
    fn new(name: String, is_host: bool, connection: Option<ConnectionId>) -> Self {
        Self {
            id: PlayerId::new(),
            name,
            is_host,
            connection,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub player: RoomPlayer,
    /// `true` when an existing player was re-bound by name.
    pub reconnected: bool,
    /// The connection the player was bound to before, if this join took
    /// it over.
    pub replaced: Option<ConnectionId>,
}

#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    pub player: RoomPlayer,
    pub new_host: Option<PlayerId>,
    /// `true` when the room is now empty.
    pub abandoned: bool,
}

/// What a dropped connection did to the room.
#[derive(Debug, Clone)]
pub enum Disconnect {
    /// No game yet: the player was removed.
    Left(LeaveOutcome),
    /// A game was started: the player stays and may rejoin by name.
    Detached(RoomPlayer),
    /// The connection was not bound to any player.
    NotMember,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A room and its members. Serializes as the room snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub code: RoomCode,
    pub players: Vec<RoomPlayer>,
    pub status: RoomStatus,
    pub settings: RoomSettings,
    pub created_at: u64,
    #[serde(skip)]
    last_activity: Instant,
}

impl Room {
    /// Creates a waiting room whose only member is the host. The host has
    /// no connection until it joins by name.
    pub fn new(code: RoomCode, host_name: &str, settings: RoomSettings) -> Result<Self, RoomError> {
        let host = RoomPlayer::new(validate_name(host_name)?, true, None);
        Ok(Self {
            code,
            players: vec![host],
            status: RoomStatus::Waiting,
            settings,
            created_at: now_millis(),
            last_activity: Instant::now(),
        })
    }

    pub fn host(&self) -> Option<&RoomPlayer> {
        self.players.iter().find(|p| p.is_host)
    }

    pub fn player_by_connection(&self, conn: ConnectionId) -> Option<&RoomPlayer> {
        self.players.iter().find(|p| p.connection == Some(conn))
    }

    pub fn player_by_name(&self, name: &str) -> Option<&RoomPlayer> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.connection.is_some()).count()
    }

    /// Marks the room as used just now.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Joins `conn` as `name`.
    ///
    /// A name already in the room is a reconnection and succeeds in any
    /// status. Otherwise the room must be waiting and not full. An
    /// abandoned room is reported as not found.
    pub fn join(&mut self, conn: ConnectionId, name: &str) -> Result<JoinOutcome, RoomError> {
        let name = validate_name(name)?;
        if self.status == RoomStatus::Abandoned {
            return Err(RoomError::NotFound(self.code.clone()));
        }

        if let Some(bound) = self.player_by_connection(conn) {
            if bound.name != name {
                return Err(RoomError::InvalidState(format!(
                    "connection already joined as {}",
                    bound.name
                )));
            }
        }

        if let Some(existing) = self.players.iter_mut().find(|p| p.name == name) {
            let previous = existing.connection.replace(conn);
            return Ok(JoinOutcome {
                player: existing.clone(),
                reconnected: true,
                replaced: previous.filter(|prev| *prev != conn),
            });
        }

        if !self.status.is_joinable() {
            return Err(RoomError::GameInProgress(self.code.clone()));
        }
        if self.players.len() >= self.settings.max_players {
            return Err(RoomError::RoomFull(self.code.clone()));
        }

        let player = RoomPlayer::new(name, self.players.is_empty(), Some(conn));
        self.players.push(player.clone());
        Ok(JoinOutcome {
            player,
            reconnected: false,
            replaced: None,
        })
    }

    /// Removes the player bound to `conn`. The host role passes to the
    /// first remaining player in list order.
    pub fn leave(&mut self, conn: ConnectionId) -> Option<LeaveOutcome> {
        let index = self
            .players
            .iter()
            .position(|p| p.connection == Some(conn))?;
        let player = self.players.remove(index);

        let mut new_host = None;
        if player.is_host {
            if let Some(first) = self.players.first_mut() {
                first.is_host = true;
                new_host = Some(first.id);
            }
        }

        let abandoned = self.players.is_empty();
        if abandoned {
            self.status = RoomStatus::Abandoned;
        }
        Some(LeaveOutcome {
            player,
            new_host,
            abandoned,
        })
    }

    /// Handles a dropped connection: a leave while waiting, otherwise the
    /// player only loses its connection.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Disconnect {
        if self.status == RoomStatus::Waiting {
            return match self.leave(conn) {
                Some(outcome) => Disconnect::Left(outcome),
                None => Disconnect::NotMember,
            };
        }
        match self
            .players
            .iter_mut()
            .find(|p| p.connection == Some(conn))
        {
            Some(player) => {
                player.connection = None;
                Disconnect::Detached(player.clone())
            }
            None => Disconnect::NotMember,
        }
    }
}
