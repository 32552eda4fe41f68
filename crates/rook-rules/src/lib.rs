//! Chess rules for the session layer, backed by the `chess` crate.
//!
//! [`ChessRules`] keeps every previous board on a stack so a tentative ply can
//! be taken back. Positions are reported as FEN.

use std::str::FromStr;

use chess::{Board, ChessMove, File, Piece, Rank, Square};
use rook_net::Move;
use rook_session::RulesEngine;
use tracing::trace;

pub use chess::BoardStatus;

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Standard chess on one board.
#[derive(Debug, Clone, Default)]
pub struct ChessRules {
    board: Board,
    history: Vec<Board>,
}

impl ChessRules {
    /// Start from the standard position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary FEN. Returns `None` if it does not describe a
    /// legal position.
    pub fn from_fen(fen: &str) -> Option<Self> {
        let board = Board::from_str(fen).ok()?;
        Some(Self {
            board,
            history: Vec::new(),
        })
    }

    /// Ongoing, checkmate or stalemate.
    pub fn status(&self) -> BoardStatus {
        self.board.status()
    }

    /// Number of plies that can be undone.
    pub fn plies(&self) -> usize {
        self.history.len()
    }

    /// The underlying board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Resolve a from/to pair into a legal move. A pawn reaching the last
    /// rank is promoted to a queen.
    fn resolve(&self, mv: &Move) -> Option<ChessMove> {
        let from = parse_square(&mv.from)?;
        let to = parse_square(&mv.to)?;
        [None, Some(Piece::Queen)]
            .into_iter()
            .map(|promotion| ChessMove::new(from, to, promotion))
            .find(|candidate| self.board.legal(*candidate))
    }
}

impl RulesEngine for ChessRules {
    fn apply_move(&mut self, mv: &Move) -> bool {
        let Some(chess_move) = self.resolve(mv) else {
            trace!(%mv, "illegal move");
            return false;
        };
        let next = self.board.make_move_new(chess_move);
        self.history.push(std::mem::replace(&mut self.board, next));
        true
    }

    fn undo_last(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.board = previous;
                true
            }
            None => false,
        }
    }

    fn position(&self) -> String {
        self.board.to_string()
    }

    fn reset(&mut self) {
        self.board = Board::default();
        self.history.clear();
    }
}

/// `e4` -> `Square`. Case-insensitive.
fn parse_square(name: &str) -> Option<Square> {
    match name.trim().as_bytes() {
        [file @ (b'a'..=b'h' | b'A'..=b'H'), rank @ b'1'..=b'8'] => {
            let file = (file.to_ascii_lowercase() - b'a') as usize;
            let rank = (rank - b'1') as usize;
            Some(Square::make_square(
                Rank::from_index(rank),
                File::from_index(file),
            ))
        }
        _ => None,
    }
}
