//! Session channel to the game authority: wire protocol, length-prefixed
//! framing, and the connection lifecycle (open, handshake, close).

pub mod channel;
pub mod framing;
pub mod protocol;

pub use channel::{
    ChannelConfig, ChannelError, ChannelSender, ConnectionState, ConnectionStateWatch,
    EventSender, SessionChannel,
};
pub use framing::{FrameConfig, FrameError, read_frame, write_frame};
pub use protocol::{
    ClientFrame, InboundEvent, Move, MoveParseError, OutboundEvent, PROTOCOL_VERSION,
    ProtocolError, ServerFrame, SessionId, SessionStatus, Winner, decode_frame, encode_frame,
};
