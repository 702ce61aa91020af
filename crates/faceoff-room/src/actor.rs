//! Room actor: an isolated Tokio task that owns one room and its game.
//!
//! Commands arrive over a bounded mpsc channel and are handled one at a
//! time, so a room never sees two commands interleave. Rooms never share
//! state with each other.

use std::collections::HashMap;
use std::sync::Arc;

use faceoff_game::{
    CategorySource, FlipOutcome, Game, GameConfig, GameError, GameMachine, GamePlayer,
};
use faceoff_protocol::{PlayerId, RoomCode};
use faceoff_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{Disconnect, JoinOutcome, LeaveOutcome, Room, RoomError, RoomStatus, ServerEvent};

/// Channel sender for delivering events to a connection.
pub type OutboundSender = mpsc::UnboundedSender<ServerEvent>;

/// A game command, already decoded and bound to a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameAction {
    Start,
    Flip {
        player_id: PlayerId,
    },
    Answer {
        player_id: PlayerId,
        answer: String,
        category: String,
    },
    Resolve {
        loser_id: PlayerId,
    },
    End,
}

impl GameAction {
    fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Flip { .. } => "flip",
            Self::Answer { .. } => "answer",
            Self::Resolve { .. } => "resolve",
            Self::End => "end",
        }
    }
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        conn: ConnectionId,
        name: String,
        sender: OutboundSender,
        reply: oneshot::Sender<Result<JoinOutcome, RoomError>>,
    },
    Leave {
        conn: ConnectionId,
        reply: oneshot::Sender<Option<LeaveOutcome>>,
    },
    Disconnect {
        conn: ConnectionId,
        reply: oneshot::Sender<Disconnect>,
    },
    Game {
        conn: ConnectionId,
        action: GameAction,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Snapshot {
        touch: bool,
        reply: oneshot::Sender<Room>,
    },
    GameSnapshot {
        reply: oneshot::Sender<Option<Game>>,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// Room metadata for stats and the expiry sweep.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub status: RoomStatus,
    pub player_count: usize,
    pub idle_for: std::time::Duration,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Sends a command and waits for the actor's reply.
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Joins (or rejoins by name) on behalf of `conn`. Events for this
    /// connection are delivered through `sender`.
    pub async fn join(
        &self,
        conn: ConnectionId,
        name: impl Into<String>,
        sender: OutboundSender,
    ) -> Result<JoinOutcome, RoomError> {
        let name = name.into();
        self.request(|reply| RoomCommand::Join {
            conn,
            name,
            sender,
            reply,
        })
        .await?
    }

    pub async fn leave(&self, conn: ConnectionId) -> Result<Option<LeaveOutcome>, RoomError> {
        self.request(|reply| RoomCommand::Leave { conn, reply }).await
    }

    pub async fn disconnect(&self, conn: ConnectionId) -> Result<Disconnect, RoomError> {
        self.request(|reply| RoomCommand::Disconnect { conn, reply })
            .await
    }

    /// Applies a game command. Resulting events are broadcast by the
    /// actor; only the error comes back here.
    pub async fn command(&self, conn: ConnectionId, action: GameAction) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Game {
            conn,
            action,
            reply,
        })
        .await?
    }

    /// Returns the room snapshot. With `touch`, also counts as activity.
    pub async fn snapshot(&self, touch: bool) -> Result<Room, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { touch, reply })
            .await
    }

    pub async fn game(&self) -> Result<Option<Game>, RoomError> {
        self.request(|reply| RoomCommand::GameSnapshot { reply })
            .await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::Info { reply }).await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<C> {
    room: Room,
    game: Option<Game>,
    machine: GameMachine,
    categories: Arc<C>,
    min_players: usize,
    /// Per-connection outbound channels.
    senders: HashMap<ConnectionId, OutboundSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<C: CategorySource> RoomActor<C> {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(room_code = %self.room.code, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            if !matches!(
                cmd,
                RoomCommand::Info { .. }
                    | RoomCommand::GameSnapshot { .. }
                    | RoomCommand::Snapshot { touch: false, .. }
            ) {
                self.room.touch();
            }
            match cmd {
                RoomCommand::Join {
                    conn,
                    name,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(conn, &name, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { conn, reply } => {
                    let result = self.handle_leave(conn);
                    let _ = reply.send(result);
                }
                RoomCommand::Disconnect { conn, reply } => {
                    let result = self.handle_disconnect(conn);
                    let _ = reply.send(result);
                }
                RoomCommand::Game {
                    conn,
                    action,
                    reply,
                } => {
                    let result = self.handle_game(conn, action).await;
                    let _ = reply.send(result);
                }
                RoomCommand::Snapshot { reply, .. } => {
                    let _ = reply.send(self.room.clone());
                }
                RoomCommand::GameSnapshot { reply } => {
                    let _ = reply.send(self.game.clone());
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_code = %self.room.code, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_code = %self.room.code, "room actor stopped");
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    fn handle_join(
        &mut self,
        conn: ConnectionId,
        name: &str,
        sender: OutboundSender,
    ) -> Result<JoinOutcome, RoomError> {
        let outcome = self.room.join(conn, name)?;
        if let Some(old) = outcome.replaced {
            self.senders.remove(&old);
        }
        self.senders.insert(conn, sender);

        tracing::info!(
            room_code = %self.room.code,
            player_id = %outcome.player.id,
            %conn,
            reconnected = outcome.reconnected,
            players = self.room.players.len(),
            "player joined"
        );

        self.send_to(
            conn,
            ServerEvent::RoomJoined {
                room: self.room.clone(),
                player: outcome.player.clone(),
                reconnected: outcome.reconnected,
            },
        );
        self.broadcast(ServerEvent::PlayerJoined {
            room: self.room.clone(),
            player: outcome.player.clone(),
        });
        Ok(outcome)
    }

    fn handle_leave(&mut self, conn: ConnectionId) -> Option<LeaveOutcome> {
        self.senders.remove(&conn);
        let outcome = self.room.leave(conn)?;
        self.announce_leave(&outcome);
        Some(outcome)
    }

    fn handle_disconnect(&mut self, conn: ConnectionId) -> Disconnect {
        self.senders.remove(&conn);
        let result = self.room.disconnect(conn);
        match &result {
            Disconnect::Left(outcome) => self.announce_leave(outcome),
            Disconnect::Detached(player) => {
                tracing::info!(
                    room_code = %self.room.code,
                    player_id = %player.id,
                    %conn,
                    "player disconnected, seat kept"
                );
            }
            Disconnect::NotMember => {}
        }
        result
    }

    fn announce_leave(&mut self, outcome: &LeaveOutcome) {
        tracing::info!(
            room_code = %self.room.code,
            player_id = %outcome.player.id,
            players = self.room.players.len(),
            "player left"
        );
        if !outcome.abandoned {
            self.broadcast(ServerEvent::PlayerLeft {
                room: self.room.clone(),
                player_id: outcome.player.id,
                new_host_id: outcome.new_host,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Game commands
    // -----------------------------------------------------------------------

    async fn handle_game(&mut self, conn: ConnectionId, action: GameAction) -> Result<(), RoomError> {
        if self.room.player_by_connection(conn).is_none() {
            return Err(RoomError::NotMember);
        }
        tracing::debug!(room_code = %self.room.code, %conn, action = action.name(), "game command");

        if action == GameAction::Start {
            return self.start_game().await;
        }
        let events = self.apply(action)?;
        for event in events {
            self.broadcast(event);
        }
        Ok(())
    }

    async fn start_game(&mut self) -> Result<(), RoomError> {
        if self.game.is_some() {
            return Err(GameError::AlreadyActive(self.room.code.clone()).into());
        }
        if self.room.players.len() < self.min_players {
            return Err(RoomError::InvalidState(format!(
                "at least {} players are needed to start",
                self.min_players
            )));
        }

        // Fetched before anything changes. An empty list still yields a
        // full deck.
        let needed = self.machine.categories_needed();
        let categories = self.categories.generate(needed).await.unwrap_or_else(|e| {
            tracing::warn!(room_code = %self.room.code, error = %e, "category source failed");
            Vec::new()
        });

        let players = self
            .room
            .players
            .iter()
            .map(|p| GamePlayer::new(p.id, p.name.clone(), p.is_host))
            .collect();
        let game = self
            .machine
            .start(self.room.code.clone(), players, categories)?;

        self.room.status = RoomStatus::Active;
        self.broadcast(ServerEvent::GameStarted { game: game.clone() });
        self.game = Some(game);
        Ok(())
    }

    /// Runs a non-start action against the game and returns the events to
    /// broadcast, in order.
    fn apply(&mut self, action: GameAction) -> Result<Vec<ServerEvent>, RoomError> {
        let game = self
            .game
            .as_mut()
            .ok_or_else(|| RoomError::NoGame(self.room.code.clone()))?;

        let events = match action {
            GameAction::Start => Vec::new(),
            GameAction::Flip { player_id } => match self.machine.flip_card(game, player_id)? {
                FlipOutcome::WildDrawn { card, activated } => vec![ServerEvent::CardFlipped {
                    card,
                    wild_drawn: true,
                    activated_wild_card: activated,
                    game: game.clone(),
                }],
                FlipOutcome::Flipped {
                    card,
                    activated,
                    faceoff,
                    ..
                } => {
                    let mut events = Vec::with_capacity(2);
                    if let Some(faceoff) = faceoff {
                        events.push(ServerEvent::FaceoffDetected {
                            faceoff,
                            game: game.clone(),
                        });
                    }
                    events.push(ServerEvent::CardFlipped {
                        card,
                        wild_drawn: false,
                        activated_wild_card: activated,
                        game: game.clone(),
                    });
                    events
                }
                FlipOutcome::GameEnded(final_scores) => vec![ServerEvent::GameEnded {
                    final_scores,
                    game: game.clone(),
                }],
            },
            GameAction::Answer {
                player_id,
                answer,
                category,
            } => {
                let outcome = self
                    .machine
                    .submit_answer(game, player_id, &answer, &category)?;
                vec![ServerEvent::AnswerSubmitted {
                    player_id,
                    answer,
                    category,
                    is_valid: outcome.is_valid,
                    score: outcome.score,
                    game: game.clone(),
                }]
            }
            GameAction::Resolve { loser_id } => {
                let resolution = self.machine.resolve_faceoff(game, loser_id)?;
                vec![ServerEvent::FaceoffResolved {
                    winner_id: resolution.winner_id,
                    loser_id: resolution.loser_id,
                    transferred_card: resolution.transferred_card,
                    next_player_id: resolution.next_player_id,
                    game: game.clone(),
                }]
            }
            GameAction::End => {
                let final_scores = self.machine.end_game(game)?;
                vec![ServerEvent::GameEnded {
                    final_scores,
                    game: game.clone(),
                }]
            }
        };
        Ok(events)
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    /// Sends an event to every connection. Connections whose receiver is
    /// gone are dropped from routing.
    fn broadcast(&mut self, event: ServerEvent) {
        let code = &self.room.code;
        self.senders.retain(|conn, sender| {
            let delivered = sender.send(event.clone()).is_ok();
            if !delivered {
                tracing::debug!(room_code = %code, %conn, event = event.tag(), "dropping dead connection");
            }
            delivered
        });
    }

    fn send_to(&mut self, conn: ConnectionId, event: ServerEvent) {
        let Some(sender) = self.senders.get(&conn) else {
            return;
        };
        if sender.send(event).is_err() {
            tracing::debug!(room_code = %self.room.code, %conn, "dropping dead connection");
            self.senders.remove(&conn);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.room.code.clone(),
            status: self.room.status,
            player_count: self.room.players.len(),
            idle_for: self.room.idle_for(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_room<C: CategorySource>(
    room: Room,
    game_config: GameConfig,
    categories: Arc<C>,
    min_players: usize,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let code = room.code.clone();

    let actor = RoomActor {
        room,
        game: None,
        machine: GameMachine::new(game_config),
        categories,
        min_players,
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
