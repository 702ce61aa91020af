//! Error types for the room layer.

use faceoff_game::GameError;
use faceoff_protocol::{ErrorKind, RoomCode};

/// Message shown to clients for faults they cannot act on.
const INTERNAL_MESSAGE: &str = "internal server error";

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room has no free player slots.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// New players cannot join once a game has started.
    #[error("game already in progress in room {0}")]
    GameInProgress(RoomCode),

    /// The connection has not joined this room.
    #[error("not in a room")]
    NotMember,

    /// A game command arrived before `startGame`.
    #[error("no game in room {0}")]
    NoGame(RoomCode),

    /// A field supplied by the client is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The room is in a state that doesn't allow this operation.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// No free room code was found.
    #[error("could not allocate a room code")]
    CodeSpaceExhausted,

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),

    #[error(transparent)]
    Game(#[from] GameError),
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::NotMember | Self::NoGame(_) => ErrorKind::NotFound,
            Self::RoomFull(_) => ErrorKind::Capacity,
            Self::GameInProgress(_) | Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Validation(_) => ErrorKind::Validation,
            Self::CodeSpaceExhausted | Self::Unavailable(_) => ErrorKind::Internal,
            Self::Game(e) => e.kind(),
        }
    }

    /// The text sent to clients. Internal faults are not described.
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => INTERNAL_MESSAGE.to_owned(),
            _ => self.to_string(),
        }
    }
}
