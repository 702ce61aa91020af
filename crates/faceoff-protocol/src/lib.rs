//! Wire protocol for the Faceoff game server.
//!
//! - **Types** ([`PlayerId`], [`RoomCode`], [`ErrorKind`]) shared by every
//!   layer.
//! - **Commands** ([`ClientMessage`]), the closed set of inbound messages.
//! - **Codec** ([`Codec`], [`JsonCodec`]) turning values into frames.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Room actor → Game
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::ClientMessage;
pub use types::{ErrorKind, PlayerId, ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode};
