//! Per-connection handler: frame decoding, command routing, and event
//! delivery.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Bind the connection to the room code in its path, if any
//!   2. Loop: decode inbound frames → route to the room registry, and
//!      forward events the room pushes onto this connection's channel
//!   3. On close, error, or idle timeout → disconnect from the room

use std::sync::Arc;

use faceoff_game::CategorySource;
use faceoff_protocol::{ClientMessage, Codec, RoomCode};
use faceoff_room::{Disconnect, GameAction, OutboundSender, RoomError, RoomRegistry, ServerEvent};
use faceoff_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::FaceoffError;
use crate::server::ServerState;

/// What the loop does after an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Per-connection routing state.
struct Session {
    conn: ConnectionId,
    /// Room named by the upgrade path (`/ws/{code}`).
    path_room: Option<RoomCode>,
    /// Room this connection has joined.
    room: Option<RoomCode>,
    outbound: OutboundSender,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: CategorySource>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), FaceoffError> {
    let conn_id = conn.id();
    let path_room = conn.path().and_then(room_code_from_path);
    tracing::debug!(
        %conn_id,
        peer = %conn.peer_addr(),
        room_code = path_room.as_ref().map(|c| c.as_str()).unwrap_or(""),
        "handling new connection"
    );

    let (outbound, mut events) = mpsc::unbounded_channel();
    let mut session = Session {
        conn: conn_id,
        path_room,
        room: None,
        outbound,
    };

    let result = run_session(&conn, &state, &mut session, &mut events).await;

    // Cleanup runs whether the loop ended cleanly or not.
    if let Some(code) = session.room.take() {
        match state.registry.disconnect(&code, conn_id).await {
            Disconnect::Left(_) => {
                tracing::info!(%conn_id, room_code = %code, "connection closed, player left")
            }
            Disconnect::Detached(player) => {
                tracing::info!(%conn_id, room_code = %code, player_id = %player.id, "connection closed, seat kept")
            }
            Disconnect::NotMember => {}
        }
    }
    result
}

async fn run_session<C: CategorySource>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    session: &mut Session,
    events: &mut mpsc::UnboundedReceiver<ServerEvent>,
) -> Result<(), FaceoffError> {
    let conn_id = session.conn;
    let idle = tokio::time::sleep(state.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            inbound = conn.recv() => {
                idle.as_mut().reset(Instant::now() + state.idle_timeout);
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%conn_id, "connection closed cleanly");
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        return Ok(());
                    }
                };
                if handle_frame(conn, state, session, &data).await == Flow::Close {
                    return Ok(());
                }
            }
            Some(event) = events.recv() => {
                let bytes = state.codec.encode(&event)?;
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(%conn_id, event = event.tag(), error = %e, "send failed");
                    return Err(e.into());
                }
            }
            _ = &mut idle => {
                tracing::info!(%conn_id, "connection timed out");
                let _ = conn.close().await;
                return Ok(());
            }
        }
    }
}

/// Decodes one inbound frame and routes it.
async fn handle_frame<C: CategorySource>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    session: &mut Session,
    data: &[u8],
) -> Flow {
    let conn_id = session.conn;
    let msg = match state.codec.decode_command(data) {
        Ok(Some(msg)) => msg,
        Ok(None) => {
            tracing::debug!(%conn_id, "dropping message with unknown type");
            return Flow::Continue;
        }
        Err(e) if e.is_fatal() => {
            tracing::warn!(%conn_id, error = %e, "malformed frame, closing connection");
            let _ = conn.close().await;
            return Flow::Close;
        }
        Err(e) => {
            session.reply(ServerEvent::error(e.kind(), e.to_string()));
            return Flow::Continue;
        }
    };

    let tag = msg.tag();
    if let Err(e) = session.dispatch(&state.registry, msg).await {
        if matches!(e, RoomError::Unavailable(_)) {
            tracing::warn!(%conn_id, command = tag, error = %e, "command failed");
        } else {
            tracing::debug!(%conn_id, command = tag, error = %e, "command failed");
        }
        session.reply(ServerEvent::from(&e));
    }
    Flow::Continue
}

impl Session {
    /// Queues an event for this connection only.
    fn reply(&self, event: ServerEvent) {
        let _ = self.outbound.send(event);
    }

    async fn dispatch<C: CategorySource>(
        &mut self,
        registry: &RoomRegistry<C>,
        msg: ClientMessage,
    ) -> Result<(), RoomError> {
        match msg {
            ClientMessage::JoinRoom {
                player_name,
                room_code,
            } => {
                let code = match room_code {
                    Some(raw) => {
                        RoomCode::parse(&raw).map_err(|e| RoomError::Validation(e.to_string()))?
                    }
                    None => self
                        .path_room
                        .clone()
                        .ok_or_else(|| RoomError::Validation("room code is required".into()))?,
                };
                if let Some(current) = self.room.as_ref().filter(|c| **c != code) {
                    registry.leave_room(current, self.conn).await;
                    self.room = None;
                }
                registry
                    .join_room(&code, self.conn, &player_name, self.outbound.clone())
                    .await?;
                self.room = Some(code);
                Ok(())
            }
            ClientMessage::LeaveRoom {} => {
                if let Some(code) = self.room.take() {
                    registry.leave_room(&code, self.conn).await;
                }
                Ok(())
            }
            other => {
                let code = self.room.as_ref().ok_or(RoomError::NotMember)?;
                match game_action(other) {
                    Some(action) => registry.command(code, self.conn, action).await,
                    None => Ok(()),
                }
            }
        }
    }
}

/// Maps a game command onto the room's action type.
fn game_action(msg: ClientMessage) -> Option<GameAction> {
    let action = match msg {
        ClientMessage::StartGame {} => GameAction::Start,
        ClientMessage::FlipCard { player_id } => GameAction::Flip { player_id },
        ClientMessage::SubmitAnswer {
            player_id,
            answer,
            category,
        } => GameAction::Answer {
            player_id,
            answer,
            category,
        },
        ClientMessage::ResolveFaceoff { loser_id } => GameAction::Resolve { loser_id },
        ClientMessage::EndGame {} => GameAction::End,
        ClientMessage::JoinRoom { .. } | ClientMessage::LeaveRoom {} => return None,
    };
    Some(action)
}

/// Extracts the room code from an upgrade path like `/ws/ABC123`.
fn room_code_from_path(path: &str) -> Option<RoomCode> {
    let code = path.strip_prefix("/ws/")?.trim_end_matches('/');
    RoomCode::parse(code).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use faceoff_protocol::PlayerId;

    #[test]
    fn test_room_code_from_path() {
        assert_eq!(
            room_code_from_path("/ws/abc123").map(|c| c.as_str().to_owned()),
            Some("ABC123".to_owned())
        );
        assert!(room_code_from_path("/ws/ABC123/").is_some());
        assert!(room_code_from_path("/ws/").is_none());
        assert!(room_code_from_path("/").is_none());
        assert!(room_code_from_path("/ws/TOO-LONG-CODE").is_none());
    }

    #[test]
    fn test_game_action_mapping() {
        let id = PlayerId::new();
        assert_eq!(
            game_action(ClientMessage::FlipCard { player_id: id }),
            Some(GameAction::Flip { player_id: id })
        );
        assert_eq!(
            game_action(ClientMessage::ResolveFaceoff { loser_id: id }),
            Some(GameAction::Resolve { loser_id: id })
        );
        assert_eq!(game_action(ClientMessage::EndGame {}), Some(GameAction::End));
        assert_eq!(game_action(ClientMessage::LeaveRoom {}), None);
    }
}
