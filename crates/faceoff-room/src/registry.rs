//! Room registry: creates, tracks, expires, and routes to rooms.

use std::collections::HashMap;
use std::sync::Arc;

use faceoff_game::{CategorySource, Game, GameConfig};
use faceoff_protocol::{ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode};
use faceoff_transport::ConnectionId;
use rand::Rng;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::actor::spawn_room;
use crate::{
    Disconnect, GameAction, JoinOutcome, OutboundSender, Room, RoomConfig, RoomError, RoomHandle,
    RoomStatus,
};

/// Attempts at drawing an unused room code before giving up.
const MAX_CODE_ATTEMPTS: usize = 64;

/// Registry-wide counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStats {
    pub total_rooms: usize,
    pub total_players: usize,
    pub waiting_rooms: usize,
    pub active_rooms: usize,
}

/// Owns every room in the process.
///
/// The map lock is only held to look up, insert, or remove handles; room
/// calls happen after it is released, so rooms never wait on each other.
pub struct RoomRegistry<C> {
    rooms: RwLock<HashMap<RoomCode, RoomHandle>>,
    config: RoomConfig,
    game_config: GameConfig,
    categories: Arc<C>,
}

impl<C: CategorySource> RoomRegistry<C> {
    pub fn new(config: RoomConfig, game_config: GameConfig, categories: C) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            config,
            game_config,
            categories: Arc::new(categories),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates a waiting room with `host_name` as its only member and
    /// returns its snapshot.
    pub async fn create_room(&self, host_name: &str) -> Result<Room, RoomError> {
        let mut rooms = self.rooms.write().await;
        let code = unused_code(&rooms).ok_or(RoomError::CodeSpaceExhausted)?;
        let room = Room::new(code.clone(), host_name, self.config.settings())?;

        let handle = spawn_room(
            room.clone(),
            self.game_config.clone(),
            Arc::clone(&self.categories),
            self.config.min_players,
            self.config.channel_size,
        );
        rooms.insert(code.clone(), handle);
        tracing::info!(room_code = %code, rooms = rooms.len(), "room created");
        Ok(room)
    }

    /// Returns the handle of a live room.
    pub async fn handle(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    /// Joins `conn` to a room, or re-binds it to an existing player with
    /// the same name.
    pub async fn join_room(
        &self,
        code: &RoomCode,
        conn: ConnectionId,
        player_name: &str,
        sender: OutboundSender,
    ) -> Result<JoinOutcome, RoomError> {
        self.handle(code).await?.join(conn, player_name, sender).await
    }

    /// Removes the player bound to `conn`. Returns `false` if the room or
    /// player does not exist. An emptied room is removed.
    pub async fn leave_room(&self, code: &RoomCode, conn: ConnectionId) -> bool {
        let Ok(handle) = self.handle(code).await else {
            return false;
        };
        match handle.leave(conn).await {
            Ok(Some(outcome)) => {
                if outcome.abandoned {
                    self.remove(code, "abandoned").await;
                }
                true
            }
            _ => false,
        }
    }

    /// Handles a closed connection: a leave while the room is waiting,
    /// otherwise the player keeps its seat.
    pub async fn disconnect(&self, code: &RoomCode, conn: ConnectionId) -> Disconnect {
        let Ok(handle) = self.handle(code).await else {
            return Disconnect::NotMember;
        };
        match handle.disconnect(conn).await {
            Ok(result) => {
                if let Disconnect::Left(outcome) = &result {
                    if outcome.abandoned {
                        self.remove(code, "abandoned").await;
                    }
                }
                result
            }
            Err(_) => Disconnect::NotMember,
        }
    }

    /// Routes a game command to a room.
    pub async fn command(
        &self,
        code: &RoomCode,
        conn: ConnectionId,
        action: GameAction,
    ) -> Result<(), RoomError> {
        self.handle(code).await?.command(conn, action).await
    }

    /// Returns a room snapshot and refreshes its activity.
    pub async fn get_room(&self, code: &RoomCode) -> Option<Room> {
        let handle = self.handle(code).await.ok()?;
        handle.snapshot(true).await.ok()
    }

    /// Returns the room's game, if one was started.
    pub async fn game(&self, code: &RoomCode) -> Result<Option<Game>, RoomError> {
        self.handle(code).await?.game().await
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn stats(&self) -> RoomStats {
        let mut stats = RoomStats::default();
        for handle in self.handles().await {
            let Ok(info) = handle.info().await else {
                continue;
            };
            stats.total_rooms += 1;
            stats.total_players += info.player_count;
            match info.status {
                RoomStatus::Waiting => stats.waiting_rooms += 1,
                RoomStatus::Active => stats.active_rooms += 1,
                RoomStatus::Abandoned => {}
            }
        }
        stats
    }

    /// Removes rooms idle for longer than the configured TTL, and rooms
    /// whose actor has stopped. Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let mut expired = Vec::new();
        for handle in self.handles().await {
            match handle.info().await {
                Ok(info) if info.idle_for <= self.config.room_ttl => {}
                _ => expired.push(handle.code().clone()),
            }
        }
        for code in &expired {
            self.remove(code, "expired").await;
        }
        if !expired.is_empty() {
            tracing::info!(removed = expired.len(), "expired rooms swept");
        }
        expired.len()
    }

    /// Runs [`sweep_expired`](Self::sweep_expired) every
    /// `sweep_interval` until the task is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        let period = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                registry.sweep_expired().await;
            }
        })
    }

    /// Stops every room actor. Used at process shutdown.
    pub async fn shutdown_all(&self) {
        let handles: Vec<RoomHandle> = self.rooms.write().await.drain().map(|(_, h)| h).collect();
        for handle in &handles {
            let _ = handle.shutdown().await;
        }
        tracing::info!(rooms = handles.len(), "all rooms shut down");
    }

    async fn handles(&self) -> Vec<RoomHandle> {
        self.rooms.read().await.values().cloned().collect()
    }

    async fn remove(&self, code: &RoomCode, reason: &str) {
        let handle = self.rooms.write().await.remove(code);
        if let Some(handle) = handle {
            let _ = handle.shutdown().await;
            tracing::info!(room_code = %code, reason, "room destroyed");
        }
    }
}

/// Draws random codes until one is not in `rooms`.
fn unused_code(rooms: &HashMap<RoomCode, RoomHandle>) -> Option<RoomCode> {
    let mut rng = rand::rng();
    (0..MAX_CODE_ATTEMPTS)
        .map(|_| {
            let symbols: [usize; ROOM_CODE_LEN] =
                std::array::from_fn(|_| rng.random_range(0..ROOM_CODE_ALPHABET.len()));
            RoomCode::from_symbols(symbols)
        })
        .find(|code| !rooms.contains_key(code))
}

#[cfg(test)]
mod tests {
    use faceoff_game::StaticCategories;

    use super::*;

    fn registry() -> RoomRegistry<StaticCategories> {
        RoomRegistry::new(
            RoomConfig::default(),
            GameConfig::default(),
            StaticCategories::new(),
        )
    }

    #[test]
    fn test_unused_code_is_valid() {
        let code = unused_code(&HashMap::new()).unwrap();
        assert_eq!(code.as_str().len(), ROOM_CODE_LEN);
        assert!(RoomCode::parse(code.as_str()).is_ok());
    }

    #[tokio::test]
    async fn test_create_room_rejects_blank_host() {
        let registry = registry();
        let err = registry.create_room("   ").await.unwrap_err();
        assert!(matches!(err, RoomError::Validation(_)));
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_room_codes_are_unique() {
        let registry = registry();
        let mut codes = std::collections::HashSet::new();
        for i in 0..20 {
            let room = registry.create_room(&format!("Host{i}")).await.unwrap();
            assert!(codes.insert(room.code));
        }
        assert_eq!(registry.room_count().await, 20);
    }

    #[tokio::test]
    async fn test_unknown_room_lookups() {
        let registry = registry();
        let code = RoomCode::parse("NOPE00").unwrap();
        assert!(registry.get_room(&code).await.is_none());
        assert!(!registry.leave_room(&code, ConnectionId::new(1)).await);
        let err = registry
            .command(&code, ConnectionId::new(1), GameAction::Start)
            .await
            .unwrap_err();
        assert!(matches!(err, RoomError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_shutdown_all_empties_registry() {
        let registry = registry();
        registry.create_room("Alice").await.unwrap();
        registry.create_room("Bob").await.unwrap();
        registry.shutdown_all().await;
        assert_eq!(registry.room_count().await, 0);
    }
}
