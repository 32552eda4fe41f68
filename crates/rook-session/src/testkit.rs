//! Test doubles for the session collaborators.
//!
//! Each double shares its state through `Rc` so a test can keep a handle after
//! moving the double into a [`GameSession`](crate::GameSession).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rook_net::{ChannelError, EventSender, Move, OutboundEvent};

use crate::identity::{IdentityProvider, UserInfo};
use crate::notice::NoticeSink;
use crate::rules::RulesEngine;

/// Position string of a fresh [`ScriptedRules`].
pub const START: &str = "start";

#[derive(Debug, Default)]
struct Script {
    plies: Vec<Move>,
    rejected: Vec<Move>,
    apply_calls: usize,
}

/// Accepts every move except the scripted rejections. The position is
/// `start` followed by the applied plies.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRules {
    script: Rc<RefCell<Script>>,
}

impl ScriptedRules {
    pub fn rejecting(moves: &[&str]) -> Self {
        let rules = Self::default();
        rules.script.borrow_mut().rejected = moves.iter().filter_map(|m| m.parse().ok()).collect();
        rules
    }

    pub fn apply_calls(&self) -> usize {
        self.script.borrow().apply_calls
    }
}

impl RulesEngine for ScriptedRules {
    fn apply_move(&mut self, mv: &Move) -> bool {
        let mut script = self.script.borrow_mut();
        script.apply_calls += 1;
        if script.rejected.contains(mv) {
            return false;
        }
        script.plies.push(mv.clone());
        true
    }

    fn undo_last(&mut self) -> bool {
        self.script.borrow_mut().plies.pop().is_some()
    }

    fn position(&self) -> String {
        let script = self.script.borrow();
        let mut position = START.to_string();
        for ply in &script.plies {
            position.push(' ');
            position.push_str(&ply.to_string());
        }
        position
    }

    fn reset(&mut self) {
        self.script.borrow_mut().plies.clear();
    }
}

/// Records every outbound event; can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingSender {
    sent: Rc<RefCell<Vec<OutboundEvent>>>,
    broken: Rc<Cell<bool>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<OutboundEvent> {
        self.sent.borrow().clone()
    }

    pub fn break_link(&self) {
        self.broken.set(true);
    }
}

impl EventSender for RecordingSender {
    fn send(&mut self, event: OutboundEvent) -> Result<(), ChannelError> {
        if self.broken.get() {
            return Err(ChannelError::Closed);
        }
        self.sent.borrow_mut().push(event);
        Ok(())
    }
}

/// Collects notices.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    notices: Rc<RefCell<Vec<String>>>,
}

impl CollectingSink {
    pub fn notices(&self) -> Vec<String> {
        self.notices.borrow().clone()
    }
}

impl NoticeSink for CollectingSink {
    fn notify(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }
}

/// Identity whose sign-in state a test can flip.
#[derive(Debug, Clone)]
pub struct SwitchableIdentity {
    signed_in: Rc<Cell<bool>>,
}

impl SwitchableIdentity {
    pub fn signed_in() -> Self {
        Self {
            signed_in: Rc::new(Cell::new(true)),
        }
    }

    pub fn sign_out(&self) {
        self.signed_in.set(false);
    }
}

impl IdentityProvider for SwitchableIdentity {
    fn is_initialized(&self) -> bool {
        true
    }

    fn is_authenticated(&self) -> bool {
        self.signed_in.get()
    }

    fn current_user(&self) -> Option<UserInfo> {
        self.signed_in.get().then(|| UserInfo {
            subject: "sub-alice".to_string(),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
        })
    }
}
