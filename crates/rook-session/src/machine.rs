//! Game session state machine.
//!
//! Every inbound event goes through [`GameSession::handle`], one tagged
//! dispatch keyed by the event variant. User intents are the `create`, `join`,
//! `attempt_move` and `leave` methods. Both paths run on the caller's thread
//! and never overlap, so the machine needs no locking.
//!
//! Mover handles in `sessionCreated` name the participant who moves first;
//! in `moveMade` and `sessionOver` they name the participant who played the
//! ply. Comparing that handle with the local one decides whether a ply is
//! already on the local board.

use rook_net::{
    EventSender, InboundEvent, Move, OutboundEvent, SessionId, SessionStatus, Winner,
};
use tracing::{debug, info, warn};

use crate::identity::IdentityProvider;
use crate::notice::NoticeSink;
use crate::position::PositionStore;
use crate::rules::RulesEngine;
use crate::view::{ParticipantColor, SessionView};

/// Notice emitted when the authority refuses the latest own move.
pub const ILLEGAL_MOVE_NOTICE: &str = "illegal move";

/// Notice emitted when `create` is repeated before the first request was
/// answered.
pub const CREATE_PENDING_NOTICE: &str = "a new game was already requested, leave to cancel it";

/// Notice emitted when a session intent needs a signed-in user.
pub const AUTHENTICATE_NOTICE: &str = "please authenticate";

/// Why an inbound event was dropped without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DiscardReason {
    /// The session already ended; only a reset clears it.
    #[error("session is over")]
    Terminal,
    /// No session is active or being joined.
    #[error("no active session")]
    NoActiveSession,
    /// The event names a different session.
    #[error("event belongs to another session")]
    StaleSession,
    /// `sessionCreated` without an outstanding `newGame`.
    #[error("no game creation outstanding")]
    NotAwaitingCreation,
    /// `participantJoined` without an outstanding `joinGame`.
    #[error("no join outstanding")]
    NotAwaitingJoin,
    /// `sessionStarted` for a session this client did not create or that
    /// already started.
    #[error("session is not waiting to start")]
    NotAwaitingStart,
    /// Move traffic outside of play.
    #[error("session is not in play")]
    NotPlaying,
    /// `sessionOver` carrying a non-terminal status.
    #[error("final status {0} is not terminal")]
    NotTerminal(SessionStatus),
}

/// What [`GameSession::handle`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event was dispatched.
    Applied,
    /// The event was dropped.
    Discarded(DiscardReason),
}

/// Orchestrates one client's view of a session.
pub struct GameSession<R, S> {
    store: PositionStore<R>,
    sender: S,
    identity: Box<dyn IdentityProvider>,
    notices: Box<dyn NoticeSink>,
    /// Handle assigned by the authority at handshake.
    handle: Option<String>,
    session_id: Option<SessionId>,
    color: ParticipantColor,
    status: SessionStatus,
    /// Raw turn flag. Only reported as "my turn" while playing.
    turn: bool,
    winner: Option<Winner>,
    /// A `newGame` was sent and its `sessionCreated` has not arrived.
    awaiting_creation: bool,
}

impl<R: RulesEngine, S: EventSender> GameSession<R, S> {
    /// Build a session in the initial `pending` state with no session id.
    pub fn new(
        rules: R,
        sender: S,
        identity: Box<dyn IdentityProvider>,
        notices: Box<dyn NoticeSink>,
    ) -> Self {
        Self {
            store: PositionStore::new(rules),
            sender,
            identity,
            notices,
            handle: None,
            session_id: None,
            color: ParticipantColor::Unassigned,
            status: SessionStatus::Pending,
            turn: false,
            winner: None,
            awaiting_creation: false,
        }
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Ask the authority for a new session. Returns whether `newGame` was sent.
    pub fn create(&mut self) -> bool {
        if self.awaiting_creation {
            self.notices.notify(CREATE_PENDING_NOTICE);
            return false;
        }
        if !self.can_start_session() {
            debug!(status = %self.status, "create ignored: a session is already open");
            return false;
        }
        let Some(identity) = self.gated_identity() else {
            return false;
        };

        if self.send(OutboundEvent::NewGame { identity }) {
            self.awaiting_creation = true;
            info!("requested a new session");
            true
        } else {
            false
        }
    }

    /// Join the session `id`. Blank ids are ignored. Returns whether
    /// `joinGame` was sent.
    pub fn join(&mut self, id: &str) -> bool {
        let id = id.trim();
        if id.is_empty() {
            debug!("join ignored: empty session id");
            return false;
        }
        if !self.can_start_session() {
            debug!(status = %self.status, "join ignored: a session is already open");
            return false;
        }
        let Some(identity) = self.gated_identity() else {
            return false;
        };

        let session_id = SessionId::new(id);
        if self.send(OutboundEvent::JoinGame {
            session_id: session_id.clone(),
            identity,
        }) {
            info!(%session_id, "joining session");
            self.session_id = Some(session_id);
            true
        } else {
            false
        }
    }

    /// Play `mv` optimistically and submit it. Returns whether `makeMove` was
    /// sent. Off-turn attempts never reach the rules engine.
    pub fn attempt_move(&mut self, mv: Move) -> bool {
        if self.status != SessionStatus::Playing || !self.turn {
            debug!(%mv, "move ignored: not your turn");
            return false;
        }
        let Some(session_id) = self.session_id.clone() else {
            return false;
        };

        if !self.store.apply_move(&mv).accepted {
            debug!(%mv, "move rejected by rules engine");
            return false;
        }

        let identity = self.identity_field();
        if self.send(OutboundEvent::MakeMove {
            session_id,
            mv,
            identity,
        }) {
            self.turn = false;
            true
        } else {
            self.store.rollback_last();
            false
        }
    }

    /// Abandon the current session and reset. Returns whether `leaveGame` was
    /// sent; it is skipped when there is no session or it already ended.
    pub fn leave(&mut self) -> bool {
        let sent = match self.session_id.clone() {
            Some(session_id) if !self.status.is_terminal() => {
                let identity = self.identity_field();
                info!(%session_id, "leaving session");
                self.send(OutboundEvent::LeaveGame {
                    session_id,
                    identity,
                })
            }
            _ => false,
        };
        self.reset();
        sent
    }

    // -----------------------------------------------------------------------
    // Inbound dispatch
    // -----------------------------------------------------------------------

    /// Apply one inbound event. Stale or out-of-place events are discarded
    /// without touching state.
    pub fn handle(&mut self, event: InboundEvent) -> EventOutcome {
        if let Err(reason) = self.admit(&event) {
            warn!(event = event.name(), "discarding inbound event: {reason}");
            return EventOutcome::Discarded(reason);
        }
        debug!(event = event.name(), "inbound event");

        match event {
            InboundEvent::Connected { handle } => {
                info!(%handle, "connected to authority");
                self.handle = Some(handle);
            }
            InboundEvent::Disconnected => {
                info!("disconnected from authority");
            }
            InboundEvent::SessionCreated {
                session_id,
                current_mover,
            } => {
                self.store.reset();
                self.awaiting_creation = false;
                self.turn = self.is_self(&current_mover);
                self.color = ParticipantColor::White;
                self.status = SessionStatus::Pending;
                self.winner = None;
                info!(%session_id, "session created");
                self.session_id = Some(session_id);
            }
            InboundEvent::ParticipantJoined { session_id } => {
                self.store.reset();
                self.turn = false;
                self.color = ParticipantColor::Black;
                self.status = SessionStatus::Playing;
                info!(%session_id, "joined session");
                self.session_id = Some(session_id);
            }
            InboundEvent::SessionStarted { .. } => {
                self.turn = true;
                self.status = SessionStatus::Playing;
                info!("opponent joined, session started");
            }
            InboundEvent::MoveMade { mover, mv, .. } => {
                if self.is_self(&mover) {
                    self.store.commit();
                    self.turn = false;
                } else {
                    self.apply_remote(&mv);
                    self.turn = true;
                }
            }
            InboundEvent::IllegalMove { .. } => {
                self.store.rollback_last();
                self.turn = true;
                self.notices.notify(ILLEGAL_MOVE_NOTICE);
            }
            InboundEvent::SessionOver {
                winner,
                mover,
                last_move,
                final_status,
                ..
            } => {
                if self.is_self(&mover) {
                    self.store.commit();
                } else if let Some(mv) = last_move {
                    self.apply_remote(&mv);
                }
                self.status = final_status;
                self.winner = winner;
                self.turn = false;
                info!(status = %final_status, "session over");
            }
            InboundEvent::ErrorNotice(text) => self.notices.notify(&text),
            InboundEvent::ConnectionError { message } => self.notices.notify(&message),
        }
        EventOutcome::Applied
    }

    fn admit(&self, event: &InboundEvent) -> Result<(), DiscardReason> {
        let state_changing = !matches!(
            event,
            InboundEvent::Connected { .. }
                | InboundEvent::Disconnected
                | InboundEvent::ErrorNotice(_)
                | InboundEvent::ConnectionError { .. }
        );
        if state_changing && self.status.is_terminal() {
            return Err(DiscardReason::Terminal);
        }

        match event {
            InboundEvent::SessionCreated { .. } if !self.awaiting_creation => {
                Err(DiscardReason::NotAwaitingCreation)
            }
            InboundEvent::ParticipantJoined { session_id } => {
                self.in_session(Some(session_id))?;
                if self.status != SessionStatus::Pending
                    || self.color != ParticipantColor::Unassigned
                {
                    return Err(DiscardReason::NotAwaitingJoin);
                }
                Ok(())
            }
            InboundEvent::SessionStarted { session_id } => {
                self.in_session(session_id.as_ref())?;
                if self.status != SessionStatus::Pending || self.color != ParticipantColor::White {
                    return Err(DiscardReason::NotAwaitingStart);
                }
                Ok(())
            }
            InboundEvent::MoveMade { session_id, .. }
            | InboundEvent::IllegalMove { session_id } => {
                self.in_session(session_id.as_ref())?;
                if self.status != SessionStatus::Playing {
                    return Err(DiscardReason::NotPlaying);
                }
                Ok(())
            }
            InboundEvent::SessionOver {
                session_id,
                final_status,
                ..
            } => {
                self.in_session(session_id.as_ref())?;
                if !final_status.is_terminal() {
                    return Err(DiscardReason::NotTerminal(*final_status));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// An event scoped to `id` (or unscoped) matches the active session.
    fn in_session(&self, id: Option<&SessionId>) -> Result<(), DiscardReason> {
        match (&self.session_id, id) {
            (None, _) => Err(DiscardReason::NoActiveSession),
            (Some(current), Some(id)) if current != id => Err(DiscardReason::StaleSession),
            _ => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Snapshot for rendering.
    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.session_id.clone(),
            color: self.color,
            status: self.status,
            my_turn: self.is_my_turn(),
            position: self.store.position(),
            winner: self.winner.clone(),
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn color(&self) -> ParticipantColor {
        self.color
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The raw turn flag. A creator holding the first move sees `true` while
    /// still waiting for the opponent.
    pub fn turn_flag(&self) -> bool {
        self.turn
    }

    /// The local player may move now.
    pub fn is_my_turn(&self) -> bool {
        self.turn && self.status == SessionStatus::Playing
    }

    pub fn winner(&self) -> Option<&Winner> {
        self.winner.as_ref()
    }

    pub fn position(&self) -> String {
        self.store.position()
    }

    /// Handle assigned by the authority, once connected.
    pub fn self_handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn can_start_session(&self) -> bool {
        self.status == SessionStatus::Pending
            && self.session_id.is_none()
            && !self.awaiting_creation
    }

    /// Identity for a create/join request, or `None` when the user must sign
    /// in first.
    fn gated_identity(&self) -> Option<Option<String>> {
        if self.identity.is_initialized() && !self.identity.is_authenticated() {
            self.notices.notify(AUTHENTICATE_NOTICE);
            return None;
        }
        Some(self.identity_field())
    }

    fn identity_field(&self) -> Option<String> {
        self.identity.current_user().map(|user| user.email)
    }

    fn is_self(&self, mover: &str) -> bool {
        self.handle.as_deref() == Some(mover)
    }

    fn apply_remote(&mut self, mv: &Move) {
        if !self.store.apply_authoritative(mv).accepted {
            warn!(%mv, "authority move rejected by local rules engine");
            self.notices.notify(&format!("could not apply opponent move {mv}"));
        }
    }

    /// Queue an outbound event, reporting a dead channel as a notice.
    fn send(&mut self, event: OutboundEvent) -> bool {
        let name = event.name();
        match self.sender.send(event) {
            Ok(()) => {
                debug!(event = name, "outbound event");
                true
            }
            Err(e) => {
                warn!(event = name, "send failed: {e}");
                self.notices.notify(&format!("{name} not sent: {e}"));
                false
            }
        }
    }

    fn reset(&mut self) {
        self.store.reset();
        self.session_id = None;
        self.color = ParticipantColor::Unassigned;
        self.status = SessionStatus::Pending;
        self.turn = false;
        self.winner = None;
        self.awaiting_creation = false;
    }
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
