//! Read-only snapshot of a session for rendering.

use std::fmt;

use rook_net::{SessionId, SessionStatus, Winner};

/// Side played by the local client. Creator is white, joiner is black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticipantColor {
    /// Playing the white pieces.
    White,
    /// Playing the black pieces.
    Black,
    /// No session yet.
    #[default]
    Unassigned,
}

impl fmt::Display for ParticipantColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::White => "white",
            Self::Black => "black",
            Self::Unassigned => "none",
        })
    }
}

/// What the rendering surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    /// Active or tentative session.
    pub session_id: Option<SessionId>,
    /// Local side.
    pub color: ParticipantColor,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// The local player may move now.
    pub my_turn: bool,
    /// Position string from the rules engine.
    pub position: String,
    /// Winner, once the game is over and someone won.
    pub winner: Option<Winner>,
}

impl SessionView {
    /// One-line status banner.
    pub fn headline(&self) -> String {
        match self.status {
            _ if self.session_id.is_none() => "No game in progress".to_string(),
            SessionStatus::Pending => "Waiting for opponent to join...".to_string(),
            SessionStatus::Playing if self.my_turn => "It's your turn".to_string(),
            SessionStatus::Playing => "Waiting for opponent to play".to_string(),
            _ => match &self.winner {
                Some(winner) => format!("Game Over! {} wins!", winner.display_name),
                None => "Game Over! It's a draw".to_string(),
            },
        }
    }
}
