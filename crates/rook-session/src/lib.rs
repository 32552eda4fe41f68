//! Client-side session synchronization for a two-player chess game.
//!
//! [`GameSession`] keeps a local position consistent with the remote
//! authority. Own moves are applied optimistically through
//! [`PositionStore`] and rolled back if the authority refuses them; the
//! opponent's moves only ever arrive as authoritative events.
//!
//! Collaborators are injected: a [`RulesEngine`] for legality, an
//! [`EventSender`](rook_net::EventSender) for the wire, an
//! [`IdentityProvider`] and a [`NoticeSink`].

pub mod identity;
pub mod machine;
pub mod notice;
pub mod position;
pub mod rules;
pub mod view;

#[cfg(test)]
mod testkit;

pub use identity::{IdentityProvider, StaticIdentity, UserInfo};
pub use machine::{DiscardReason, EventOutcome, GameSession};
pub use notice::{NoticeSink, TracingNoticeSink};
pub use position::{MoveOutcome, PositionStore};
pub use rules::RulesEngine;
pub use view::{ParticipantColor, SessionView};
