//! Wire protocol between a client and the game authority.
//!
//! Every payload is serialized with [`postcard`] and prefixed with a protocol
//! version byte. Use [`encode_frame`] and [`decode_frame`] for encoding and
//! decoding [`ClientFrame`] / [`ServerFrame`] values.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Current wire-protocol version. Prepended to every serialized payload.
pub const PROTOCOL_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Domain values carried on the wire
// ---------------------------------------------------------------------------

/// Opaque identifier of one game session, assigned by the authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Lifecycle status of a session as reported by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created or joined, not started yet.
    #[default]
    Pending,
    /// Both participants present, moves flowing.
    Playing,
    /// Game ended by checkmate.
    Checkmate,
    /// Game ended by stalemate.
    Stalemate,
    /// Game ended by agreement or rule.
    Draw,
    /// A participant resigned.
    Resign,
}

impl SessionStatus {
    /// Terminal statuses accept no mutation other than a full reset.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Checkmate | Self::Stalemate | Self::Draw | Self::Resign
        )
    }

    /// Protocol spelling of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Playing => "playing",
            Self::Checkmate => "checkmate",
            Self::Stalemate => "stalemate",
            Self::Draw => "draw",
            Self::Resign => "resign",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ply expressed as a pair of algebraic squares, e.g. `e2` -> `e4`.
///
/// The session layer never interprets squares; legality belongs to the rules
/// engine. Parsing only checks that each square names a board coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Origin square.
    pub from: String,
    /// Destination square.
    pub to: String,
}

/// Errors produced when parsing a textual move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveParseError {
    /// The text is not of the form `e2e4` or `e2-e4`.
    #[error("expected a move like e2e4, got {0:?}")]
    Malformed(String),
    /// A square is outside `a1..h8`.
    #[error("not a board square: {0:?}")]
    BadSquare(String),
}

impl Move {
    /// Build a move without validating the squares.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Build a move from two square names, normalising them to lowercase.
    pub fn try_new(from: &str, to: &str) -> Result<Self, MoveParseError> {
        Ok(Self {
            from: parse_square(from)?,
            to: parse_square(to)?,
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.trim().chars().filter(|c| *c != '-').collect();
        if compact.len() != 4 || !compact.is_ascii() {
            return Err(MoveParseError::Malformed(s.to_string()));
        }
        Self::try_new(&compact[..2], &compact[2..])
    }
}

fn parse_square(raw: &str) -> Result<String, MoveParseError> {
    let square = raw.trim().to_ascii_lowercase();
    let mut chars = square.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('a'..='h'), Some('1'..='8'), None) => Ok(square),
        _ => Err(MoveParseError::BadSquare(raw.to_string())),
    }
}

/// Winner record attached to a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    /// Stable identity of the winning participant.
    pub participant_identity: String,
    /// Rating after the game, when the authority tracks one.
    pub rating: Option<u32>,
    /// Contact e-mail of the winner.
    pub email: Option<String>,
    /// Name shown to players.
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Client -> authority events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutboundEvent {
    /// Ask the authority to create a session with the caller as white.
    NewGame {
        /// Identity of the inviter.
        identity: Option<String>,
    },
    /// Join an existing session as black.
    JoinGame {
        /// Session to join.
        session_id: SessionId,
        /// Identity of the joiner.
        identity: Option<String>,
    },
    /// Submit a ply.
    MakeMove {
        /// Session the ply belongs to.
        session_id: SessionId,
        /// The ply.
        mv: Move,
        /// Identity of the mover.
        identity: Option<String>,
    },
    /// Abandon a session.
    LeaveGame {
        /// Session being left.
        session_id: SessionId,
        /// Identity of the leaver.
        identity: Option<String>,
    },
}

impl OutboundEvent {
    /// Protocol event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewGame { .. } => "newGame",
            Self::JoinGame { .. } => "joinGame",
            Self::MakeMove { .. } => "makeMove",
            Self::LeaveGame { .. } => "leaveGame",
        }
    }
}

/// Authority -> client events, plus the channel's own lifecycle events.
///
/// `mover` and `current_mover` are channel handles as assigned in
/// [`ServerFrame::Welcome`]; compare them with the local handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InboundEvent {
    /// Handshake accepted; `handle` identifies this client to the authority.
    Connected {
        /// Handle assigned to this connection.
        handle: String,
    },
    /// The connection is gone. No further events follow.
    Disconnected,
    /// A session requested with `newGame` exists.
    SessionCreated {
        /// Identifier to share with the opponent.
        session_id: SessionId,
        /// Handle of the participant holding the first move.
        current_mover: String,
    },
    /// This client was admitted to the session it asked to join.
    ParticipantJoined {
        /// Joined session.
        session_id: SessionId,
    },
    /// The opponent arrived; the creator moves first.
    SessionStarted {
        /// Session that started, when the authority names it.
        session_id: Option<SessionId>,
    },
    /// A ply was accepted by the authority.
    MoveMade {
        /// Session the ply belongs to, when the authority names it.
        session_id: Option<SessionId>,
        /// Handle of the participant who played the ply.
        mover: String,
        /// The ply.
        mv: Move,
    },
    /// The authority refused this client's latest ply.
    IllegalMove {
        /// Session the refusal belongs to, when the authority names it.
        session_id: Option<SessionId>,
    },
    /// The session reached a terminal status.
    SessionOver {
        /// Session that ended, when the authority names it.
        session_id: Option<SessionId>,
        /// Winner, absent for draws and stalemates.
        winner: Option<Winner>,
        /// Handle of the participant whose action ended the game.
        mover: String,
        /// Final ply, absent when the game ended without one (e.g. resignation).
        last_move: Option<Move>,
        /// Terminal status.
        final_status: SessionStatus,
    },
    /// Application-level error text from the authority.
    ErrorNotice(String),
    /// Transport or handshake failure.
    ConnectionError {
        /// Human-readable reason.
        message: String,
    },
}

impl InboundEvent {
    /// Protocol event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Disconnected => "disconnected",
            Self::SessionCreated { .. } => "sessionCreated",
            Self::ParticipantJoined { .. } => "participantJoined",
            Self::SessionStarted { .. } => "sessionStarted",
            Self::MoveMade { .. } => "moveMade",
            Self::IllegalMove { .. } => "illegalMove",
            Self::SessionOver { .. } => "sessionOver",
            Self::ErrorNotice(_) => "errorNotice",
            Self::ConnectionError { .. } => "connectionError",
        }
    }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Everything a client writes to the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientFrame {
    /// First frame on every connection.
    Hello {
        /// Identity credential.
        token: String,
    },
    /// An application event.
    Event(OutboundEvent),
}

/// Everything the authority writes to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerFrame {
    /// Handshake accepted.
    Welcome {
        /// Handle assigned to the connection.
        handle: String,
    },
    /// Handshake refused; the authority closes the connection afterwards.
    Rejected {
        /// Human-readable reason.
        reason: String,
    },
    /// An application event.
    Event(InboundEvent),
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during payload decoding.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The payload was empty (no version byte).
    #[error("empty payload: no version byte")]
    EmptyPayload,

    /// The version byte does not match [`PROTOCOL_VERSION`].
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Postcard (de)serialization failed.
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
}

// ---------------------------------------------------------------------------
// Serialization helpers
// ---------------------------------------------------------------------------

/// Serialize a frame into a versioned binary payload.
///
/// Wire format: `[version: u8] [postcard-encoded frame]`
pub fn encode_frame<T: Serialize>(frame: &T) -> Result<Vec<u8>, ProtocolError> {
    let body = postcard::to_allocvec(frame)?;
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(PROTOCOL_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Deserialize a versioned binary payload into a frame.
pub fn decode_frame<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    let (&version, body) = data.split_first().ok_or(ProtocolError::EmptyPayload)?;
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }
    Ok(postcard::from_bytes(body)?)
}
