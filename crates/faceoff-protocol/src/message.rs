//! Inbound commands: the closed set of messages a client may send.

use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// A command sent by a client over its room connection.
///
/// Internally tagged, so `{"type": "flipCard", "playerId": "..."}` decodes
/// to [`ClientMessage::FlipCard`]. Commands without fields are struct
/// variants so that clients may send extra keys without being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Join (or rejoin, by matching name) the room.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        player_name: String,
        /// Overrides the room the connection was opened for.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_code: Option<String>,
    },

    /// Leave the room this connection joined.
    LeaveRoom {},

    /// Start the room's game.
    StartGame {},

    /// Draw the next card for `player_id`.
    #[serde(rename_all = "camelCase")]
    FlipCard { player_id: PlayerId },

    /// Shout an answer during a faceoff.
    #[serde(rename_all = "camelCase")]
    SubmitAnswer {
        player_id: PlayerId,
        answer: String,
        category: String,
    },

    /// Concede a faceoff on behalf of `loser_id`.
    #[serde(rename_all = "camelCase")]
    ResolveFaceoff { loser_id: PlayerId },

    /// Finish the game now and publish final scores.
    EndGame {},
}

impl ClientMessage {
    /// Every `type` tag this enum understands.
    pub const TAGS: &'static [&'static str] = &[
        "joinRoom",
        "leaveRoom",
        "startGame",
        "flipCard",
        "submitAnswer",
        "resolveFaceoff",
        "endGame",
    ];

    /// Returns the wire tag of this command, for logging.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "joinRoom",
            Self::LeaveRoom {} => "leaveRoom",
            Self::StartGame {} => "startGame",
            Self::FlipCard { .. } => "flipCard",
            Self::SubmitAnswer { .. } => "submitAnswer",
            Self::ResolveFaceoff { .. } => "resolveFaceoff",
            Self::EndGame {} => "endGame",
        }
    }

    /// Returns `true` if `tag` names one of the commands above.
    pub fn is_known_tag(tag: &str) -> bool {
        Self::TAGS.contains(&tag)
    }
}
