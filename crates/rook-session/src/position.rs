//! Local position store: tentative apply with a bounded one-ply undo.
//!
//! Only a move applied with [`PositionStore::apply_move`] can be rolled back.
//! Authoritative moves and confirmed moves are final.

use rook_net::Move;
use tracing::debug;

use crate::rules::RulesEngine;

/// Result of applying a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Whether the rules engine accepted the move.
    pub accepted: bool,
    /// Position after the attempt (unchanged when rejected).
    pub position: String,
}

/// Owns the board position and the single pending undo.
#[derive(Debug)]
pub struct PositionStore<R> {
    engine: R,
    /// Set while the latest ply is tentative and may still be repudiated.
    undo_armed: bool,
}

impl<R: RulesEngine> PositionStore<R> {
    /// Wrap `engine`, starting from its initial position.
    pub fn new(mut engine: R) -> Self {
        engine.reset();
        Self {
            engine,
            undo_armed: false,
        }
    }

    /// Apply a local move tentatively. Rejection is a normal result.
    pub fn apply_move(&mut self, mv: &Move) -> MoveOutcome {
        let accepted = self.engine.apply_move(mv);
        if accepted {
            self.undo_armed = true;
        }
        debug!(%mv, accepted, "tentative move");
        self.outcome(accepted)
    }

    /// Apply a move the authority already accepted. Never undoable.
    pub fn apply_authoritative(&mut self, mv: &Move) -> MoveOutcome {
        let accepted = self.engine.apply_move(mv);
        if accepted {
            self.undo_armed = false;
        }
        debug!(%mv, accepted, "authoritative move");
        self.outcome(accepted)
    }

    /// Mark the tentative ply as confirmed.
    pub fn commit(&mut self) {
        self.undo_armed = false;
    }

    /// Undo the tentative ply. No-op (returns `false`) when nothing is
    /// tentative, so a second rollback never eats a confirmed move.
    pub fn rollback_last(&mut self) -> bool {
        if !std::mem::replace(&mut self.undo_armed, false) {
            return false;
        }
        self.engine.undo_last()
    }

    /// Return to the starting position.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.undo_armed = false;
    }

    /// Current position string.
    pub fn position(&self) -> String {
        self.engine.position()
    }

    /// Whether a tentative ply is awaiting confirmation.
    pub fn has_tentative(&self) -> bool {
        self.undo_armed
    }

    fn outcome(&self, accepted: bool) -> MoveOutcome {
        MoveOutcome {
            accepted,
            position: self.engine.position(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{START, ScriptedRules};

    fn mv(text: &str) -> Move {
        text.parse().unwrap()
    }

    #[test]
    fn test_apply_then_rollback_restores_position() {
        let mut store = PositionStore::new(ScriptedRules::default());
        let before = store.position();

        let outcome = store.apply_move(&mv("e2e4"));
        assert!(outcome.accepted);
        assert_ne!(outcome.position, before);
        assert!(store.has_tentative());

        assert!(store.rollback_last());
        assert_eq!(store.position(), before);
        assert!(!store.has_tentative());
    }

    #[test]
    fn test_rejected_move_leaves_position() {
        let mut store = PositionStore::new(ScriptedRules::rejecting(&["e2e5"]));
        let outcome = store.apply_move(&mv("e2e5"));
        assert!(!outcome.accepted);
        assert_eq!(outcome.position, START);
        assert!(!store.has_tentative());
    }

    #[test]
    fn test_rollback_is_bounded_to_one_ply() {
        let mut store = PositionStore::new(ScriptedRules::default());
        store.apply_authoritative(&mv("e2e4"));
        store.apply_move(&mv("e7e5"));

        assert!(store.rollback_last());
        assert!(!store.rollback_last());
        assert_eq!(store.position(), format!("{START} e2e4"));
    }

    #[test]
    fn test_committed_move_is_not_rolled_back() {
        let mut store = PositionStore::new(ScriptedRules::default());
        store.apply_move(&mv("e2e4"));
        store.commit();

        assert!(!store.rollback_last());
        assert_eq!(store.position(), format!("{START} e2e4"));
    }

    #[test]
    fn test_reset_clears_history_and_undo() {
        let mut store = PositionStore::new(ScriptedRules::default());
        store.apply_move(&mv("e2e4"));
        store.reset();

        assert_eq!(store.position(), START);
        assert!(!store.rollback_last());
    }
}
