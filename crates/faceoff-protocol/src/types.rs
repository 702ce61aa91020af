//! Identity types and the error taxonomy shared by every layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique, never-reused identifier for a player.
///
/// Generated once when a player first enters a room and carried into the
/// game as a cross-reference key. Serializes as a plain UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Length of every room code.
pub const ROOM_CODE_LEN: usize = 6;

/// Symbols a room code may contain.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A six-character room code made of `A-Z` and `0-9`.
///
/// Construct one with [`RoomCode::parse`] (user input, case-insensitive) or
/// [`RoomCode::from_symbols`] (freshly generated codes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Parses a code typed by a user. Lower-case input is accepted and
    /// upper-cased.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let code = input.trim().to_ascii_uppercase();
        if code.len() != ROOM_CODE_LEN {
            return Err(ProtocolError::InvalidMessage(format!(
                "room code must be {ROOM_CODE_LEN} characters, got {:?}",
                input
            )));
        }
        if !code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)) {
            return Err(ProtocolError::InvalidMessage(format!(
                "room code {input:?} must be alphanumeric"
            )));
        }
        Ok(Self(code))
    }

    /// Builds a code from indices into [`ROOM_CODE_ALPHABET`].
    ///
    /// Indices wrap modulo the alphabet size, so any random source can
    /// feed this.
    pub fn from_symbols(symbols: [usize; ROOM_CODE_LEN]) -> Self {
        let code = symbols
            .iter()
            .map(|i| ROOM_CODE_ALPHABET[i % ROOM_CODE_ALPHABET.len()] as char)
            .collect();
        Self(code)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// The error taxonomy every failed command is reduced to before it
/// reaches a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Room, player, or game absent.
    NotFound,
    /// Wrong turn, wrong status, already flipped, no active faceoff.
    InvalidState,
    /// Room full.
    Capacity,
    /// Missing or malformed field.
    Validation,
    /// Unexpected server-side fault.
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidState => 409,
            Self::Capacity => 403,
            Self::Validation => 400,
            Self::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NotFound"),
            Self::InvalidState => write!(f, "InvalidState"),
            Self::Capacity => write!(f, "Capacity"),
            Self::Validation => write!(f, "Validation"),
            Self::Internal => write!(f, "Internal"),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
