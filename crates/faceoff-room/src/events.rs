//! Outbound events: everything the server pushes to clients.

use faceoff_game::{Card, Faceoff, FinalScores, Game};
use faceoff_protocol::{ErrorKind, PlayerId};
use serde::Serialize;

use crate::{Room, RoomError, RoomPlayer};

/// An event sent to one connection or broadcast to a room.
///
/// Adjacently tagged: `{"type": "cardFlipped", "data": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Sent only to the connection that joined.
    RoomJoined {
        room: Room,
        player: RoomPlayer,
        reconnected: bool,
    },
    PlayerJoined {
        room: Room,
        player: RoomPlayer,
    },
    PlayerLeft {
        room: Room,
        player_id: PlayerId,
        new_host_id: Option<PlayerId>,
    },
    GameStarted {
        game: Game,
    },
    FaceoffDetected {
        faceoff: Faceoff,
        game: Game,
    },
    CardFlipped {
        card: Card,
        wild_drawn: bool,
        activated_wild_card: Option<Card>,
        game: Game,
    },
    AnswerSubmitted {
        player_id: PlayerId,
        answer: String,
        category: String,
        is_valid: bool,
        score: u32,
        game: Game,
    },
    FaceoffResolved {
        winner_id: PlayerId,
        loser_id: PlayerId,
        transferred_card: Card,
        next_player_id: PlayerId,
        game: Game,
    },
    GameEnded {
        final_scores: FinalScores,
        game: Game,
    },
    /// Sent only to the connection whose command failed.
    Error {
        kind: ErrorKind,
        code: u16,
        message: String,
    },
}

impl ServerEvent {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            kind,
            code: kind.status_code(),
            message: message.into(),
        }
    }

    /// The wire tag, for logging.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::RoomJoined { .. } => "roomJoined",
            Self::PlayerJoined { .. } => "playerJoined",
            Self::PlayerLeft { .. } => "playerLeft",
            Self::GameStarted { .. } => "gameStarted",
            Self::FaceoffDetected { .. } => "faceoffDetected",
            Self::CardFlipped { .. } => "cardFlipped",
            Self::AnswerSubmitted { .. } => "answerSubmitted",
            Self::FaceoffResolved { .. } => "faceoffResolved",
            Self::GameEnded { .. } => "gameEnded",
            Self::Error { .. } => "error",
        }
    }
}

impl From<&RoomError> for ServerEvent {
    fn from(err: &RoomError) -> Self {
        Self::error(err.kind(), err.client_message())
    }
}
