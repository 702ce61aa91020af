//! Error types for the protocol layer.
//!
//! Each Faceoff crate defines its own error enum. A `ProtocolError` always
//! means the problem is in a frame's bytes or shape, never in room or game
//! state.

use crate::ErrorKind;

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame is not valid JSON.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame is JSON but not a tagged object (`{"type": "..."}`).
    ///
    /// Treated like undecodable bytes: the connection that sent it is
    /// dropped.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The frame names a known command but its fields are missing or
    /// have the wrong type.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// Classifies the error for the client-facing `error` event.
    pub fn kind(&self) -> ErrorKind {
        match self {
            #[cfg(feature = "json")]
            Self::Encode(_) => ErrorKind::Internal,
            _ => ErrorKind::Validation,
        }
    }

    /// Returns `true` if the offending connection should be closed
    /// rather than answered.
    pub fn is_fatal(&self) -> bool {
        match self {
            #[cfg(feature = "json")]
            Self::Decode(_) => true,
            Self::MalformedFrame(_) => true,
            _ => false,
        }
    }
}
