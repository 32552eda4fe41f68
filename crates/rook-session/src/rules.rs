//! Rules-engine seam.

use rook_net::Move;

/// Legality and position bookkeeping for one board.
///
/// Implementations never panic on bad input: an illegal or unparsable move is
/// reported as `false` and leaves the position untouched.
pub trait RulesEngine {
    /// Validate `mv` against the current position and apply it if legal.
    fn apply_move(&mut self, mv: &Move) -> bool;

    /// Undo the most recently applied move. Returns `false` when there is
    /// nothing to undo.
    fn undo_last(&mut self) -> bool;

    /// Canonical string of the current position.
    fn position(&self) -> String;

    /// Return to the standard starting position and forget history.
    fn reset(&mut self);
}
