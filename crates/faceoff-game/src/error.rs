//! Error types for game operations.

use faceoff_protocol::{ErrorKind, PlayerId, RoomCode};

/// Errors a game operation can fail with. A failed operation leaves the
/// game untouched.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    /// Someone other than the current player flipped, or the game is not
    /// waiting for a flip.
    #[error("not your turn")]
    NotYourTurn,

    #[error("already flipped this turn")]
    AlreadyFlipped,

    #[error("no active faceoff")]
    NoActiveFaceoff,

    /// The named loser exists but is not one of the two participants.
    #[error("player {0} is not in the faceoff")]
    NotInFaceoff(PlayerId),

    #[error("player {0} has no card to give up")]
    EmptyStack(PlayerId),

    #[error("a game already exists for room {0}")]
    AlreadyActive(RoomCode),

    #[error("game is not in progress")]
    GameNotInProgress,

    #[error("game is already over")]
    GameOver,

    #[error("cannot start a game without players")]
    NoPlayers,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PlayerNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::InvalidState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_error_kinds() {
        assert_eq!(
            GameError::PlayerNotFound(PlayerId::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(GameError::AlreadyFlipped.kind(), ErrorKind::InvalidState);
        assert_eq!(GameError::NotYourTurn.kind().status_code(), 409);
    }
}
