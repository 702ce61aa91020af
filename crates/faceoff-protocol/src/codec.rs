//! Codec trait and the JSON implementation used on the wire.
//!
//! The room and server layers only need "something that turns values into
//! bytes and back". [`JsonCodec`] is that something today; browsers speak
//! JSON text frames.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;
#[cfg(feature = "json")]
use crate::ClientMessage;

/// Encodes Rust values to bytes and decodes bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(feature = "json")]
impl JsonCodec {
    /// Decodes one inbound frame into a [`ClientMessage`].
    ///
    /// - `Ok(Some(msg))` for a well-formed known command.
    /// - `Ok(None)` for a tagged object whose tag is not a known command.
    /// - `Err(InvalidMessage)` for a known tag with a bad body.
    /// - `Err(Decode | MalformedFrame)` for anything that is not a tagged
    ///   JSON object.
    pub fn decode_command(
        &self,
        data: &[u8],
    ) -> Result<Option<ClientMessage>, ProtocolError> {
        let value: serde_json::Value = self.decode(data)?;
        let tag = match value.get("type").and_then(|t| t.as_str()) {
            Some(tag) => tag,
            None => {
                return Err(ProtocolError::MalformedFrame(
                    "expected an object with a string \"type\"".into(),
                ));
            }
        };
        if !ClientMessage::is_known_tag(tag) {
            return Ok(None);
        }
        let tag = tag.to_owned();
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ProtocolError::InvalidMessage(format!("{tag}: {e}")))
    }
}
