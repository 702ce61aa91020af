//! Unified error type for the Faceoff server.

use faceoff_protocol::ProtocolError;
use faceoff_room::RoomError;
use faceoff_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum FaceoffError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, invalid state).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Binding or serving the HTTP listener failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let faceoff_err: FaceoffError = err.into();
        assert!(matches!(faceoff_err, FaceoffError::Transport(_)));
        assert!(faceoff_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let faceoff_err: FaceoffError = err.into();
        assert!(matches!(faceoff_err, FaceoffError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotMember;
        let faceoff_err: FaceoffError = err.into();
        assert!(matches!(faceoff_err, FaceoffError::Room(_)));
        assert_eq!(faceoff_err.to_string(), "not in a room");
    }

    #[test]
    fn test_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
        let faceoff_err: FaceoffError = err.into();
        assert!(matches!(faceoff_err, FaceoffError::Io(_)));
    }
}
