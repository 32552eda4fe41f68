//! Session channel: one connection to the game authority.
//!
//! [`SessionChannel::open`] returns immediately. A background task connects,
//! performs the token handshake, then splits into a reader and a writer.
//! Everything the connection observes, including failures, is delivered in
//! order as an [`InboundEvent`] through [`SessionChannel::recv`]; transport
//! problems never surface as errors on the public surface.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::framing::{FrameConfig, FrameError, read_frame, write_frame};
use crate::protocol::{
    ClientFrame, InboundEvent, OutboundEvent, ProtocolError, ServerFrame, decode_frame,
    encode_frame,
};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connecting or waiting for the handshake reply.
    Connecting,
    /// Handshake accepted, events flowing.
    Connected,
    /// Connection lost, refused, or intentionally closed.
    Disconnected,
}

/// Observable connection state backed by a [`watch`] channel.
///
/// Multiple subscribers can observe state transitions without polling.
pub struct ConnectionStateWatch {
    tx: watch::Sender<ConnectionState>,
    rx: watch::Receiver<ConnectionState>,
}

impl Default for ConnectionStateWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStateWatch {
    /// Create a new watch initialized to [`ConnectionState::Disconnected`].
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(ConnectionState::Disconnected);
        Self { tx, rx }
    }

    /// Set the current connection state, notifying all subscribers.
    pub fn set(&self, state: ConnectionState) {
        let _ = self.tx.send(state);
    }

    /// Return a new subscriber receiver.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.rx.clone()
    }

    /// Return the current state without blocking.
    pub fn current(&self) -> ConnectionState {
        *self.rx.borrow()
    }
}

/// Tunables for a [`SessionChannel`].
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// How long to wait for `Welcome`/`Rejected` after sending `Hello`.
    pub handshake_timeout: Duration,
    /// Frame limits applied in both directions.
    pub frame: FrameConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
            frame: FrameConfig::default(),
        }
    }
}

/// Errors inside the channel. Only [`ChannelError::Closed`] is ever returned
/// to callers; the rest are reported as [`InboundEvent::ConnectionError`].
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel was closed; the event was not queued.
    #[error("session channel is closed")]
    Closed,

    /// TCP connect failed.
    #[error("could not reach authority at {addr}: {source}")]
    Connect {
        /// Address that was dialled.
        addr: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The authority refused the identity credential.
    #[error("authentication rejected: {0}")]
    Rejected(String),

    /// No handshake reply arrived in time.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// The authority sent an event before accepting the handshake.
    #[error("unexpected {0} before handshake completed")]
    UnexpectedFrame(&'static str),

    /// Framing failure (closed connection, oversized frame, I/O).
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A payload could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Outbound seam used by the session state machine.
pub trait EventSender {
    /// Queue an event for the authority. Fire-and-forget: `Ok` means queued,
    /// not delivered.
    fn send(&mut self, event: OutboundEvent) -> Result<(), ChannelError>;
}

/// Cloneable handle that queues events on a [`SessionChannel`]'s writer.
#[derive(Debug, Clone)]
pub struct ChannelSender {
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl ChannelSender {
    /// Queue an event for the writer task.
    pub fn send(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        self.tx.send(event).map_err(|_| ChannelError::Closed)
    }
}

impl EventSender for ChannelSender {
    fn send(&mut self, event: OutboundEvent) -> Result<(), ChannelError> {
        ChannelSender::send(self, event)
    }
}

/// Handle to one connection to the authority.
///
/// Must be opened from within a tokio runtime. Dropping the handle closes the
/// connection.
pub struct SessionChannel {
    sender: ChannelSender,
    inbound_rx: mpsc::UnboundedReceiver<InboundEvent>,
    state: Arc<ConnectionStateWatch>,
    /// Sending `true` makes the connection tasks exit.
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SessionChannel {
    /// Start connecting to `addr` (`host:port`) and authenticate with `token`.
    ///
    /// The outcome arrives through [`recv`](Self::recv) as
    /// [`InboundEvent::Connected`] or [`InboundEvent::ConnectionError`].
    /// Events sent before the handshake completes are queued and flushed
    /// once it does.
    pub fn open(addr: impl Into<String>, token: impl Into<String>, config: ChannelConfig) -> Self {
        let state = Arc::new(ConnectionStateWatch::new());
        state.set(ConnectionState::Connecting);

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let link = Link {
            addr: addr.into(),
            token: token.into(),
            config,
            state: Arc::clone(&state),
            inbound: inbound_tx,
            shutdown: shutdown_rx,
        };
        let task = tokio::spawn(link.run(outbound_rx));

        Self {
            sender: ChannelSender { tx: outbound_tx },
            inbound_rx,
            state,
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Queue an event for the authority.
    pub fn send(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        self.sender.send(event)
    }

    /// A cloneable sender sharing this channel's writer.
    pub fn sender(&self) -> ChannelSender {
        self.sender.clone()
    }

    /// Next inbound event in arrival order. Returns `None` once the channel
    /// was closed locally or the connection task has finished.
    pub async fn recv(&mut self) -> Option<InboundEvent> {
        if self.is_closed() {
            return None;
        }
        self.inbound_rx.recv().await
    }

    /// Release the connection. Idempotent.
    pub fn close(&self) {
        if self.shutdown_tx.send_replace(true) {
            return;
        }
        self.state.set(ConnectionState::Disconnected);
        info!("session channel closed");
    }

    /// Close, then wait up to `grace` for events already queued to be
    /// written.
    pub async fn shutdown(mut self, grace: Duration) {
        self.close();
        if let Some(task) = self.task.take()
            && tokio::time::timeout(grace, task).await.is_err()
        {
            warn!("session channel did not stop within {grace:?}");
        }
    }

    /// Return the connection state watch.
    pub fn state(&self) -> &Arc<ConnectionStateWatch> {
        &self.state
    }

    fn is_closed(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl Drop for SessionChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Resolves once shutdown was requested or the channel handle is gone.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|closed| *closed).await;
}

/// Background side of a [`SessionChannel`].
struct Link {
    addr: String,
    token: String,
    config: ChannelConfig,
    state: Arc<ConnectionStateWatch>,
    inbound: mpsc::UnboundedSender<InboundEvent>,
    shutdown: watch::Receiver<bool>,
}

impl Link {
    async fn run(self, outbound: mpsc::UnboundedReceiver<OutboundEvent>) {
        let mut shutdown = self.shutdown.clone();
        let established = tokio::select! {
            result = self.establish() => result,
            _ = shutdown_requested(&mut shutdown) => return,
        };

        let (reader, writer, handle) = match established {
            Ok(parts) => parts,
            Err(e) => {
                self.fail(e);
                return;
            }
        };

        info!(addr = %self.addr, %handle, "session channel connected");
        self.state.set(ConnectionState::Connected);
        if self.inbound.send(InboundEvent::Connected { handle }).is_err() {
            return;
        }

        let writer = tokio::spawn(write_loop(
            writer,
            outbound,
            self.config.frame.clone(),
            self.state.subscribe(),
            self.shutdown.clone(),
        ));
        self.read_loop(reader).await;
        let _ = writer.await;
    }

    async fn establish(&self) -> Result<(OwnedReadHalf, OwnedWriteHalf, String), ChannelError> {
        let stream =
            TcpStream::connect(self.addr.as_str())
                .await
                .map_err(|source| ChannelError::Connect {
                    addr: self.addr.clone(),
                    source,
                })?;
        stream.set_nodelay(true).map_err(FrameError::Io)?;
        let (mut reader, mut writer) = stream.into_split();

        let hello = encode_frame(&ClientFrame::Hello {
            token: self.token.clone(),
        })?;
        write_frame(&mut writer, &hello, &self.config.frame).await?;

        let timeout = self.config.handshake_timeout;
        let reply = tokio::time::timeout(timeout, next_server_frame(&mut reader, &self.config.frame))
            .await
            .map_err(|_| ChannelError::HandshakeTimeout(timeout))??;

        match reply {
            ServerFrame::Welcome { handle } => Ok((reader, writer, handle)),
            ServerFrame::Rejected { reason } => Err(ChannelError::Rejected(reason)),
            ServerFrame::Event(event) => Err(ChannelError::UnexpectedFrame(event.name())),
        }
    }

    async fn read_loop(&self, mut reader: OwnedReadHalf) {
        let mut shutdown = self.shutdown.clone();
        loop {
            let frame = tokio::select! {
                frame = next_server_frame(&mut reader, &self.config.frame) => frame,
                _ = shutdown_requested(&mut shutdown) => return,
            };

            match frame {
                Ok(ServerFrame::Event(event)) => {
                    debug!(event = event.name(), "inbound event");
                    if self.inbound.send(event).is_err() {
                        return;
                    }
                }
                Ok(other) => warn!(?other, "ignoring handshake frame on an established channel"),
                Err(ChannelError::Protocol(e)) => warn!("discarding malformed frame: {e}"),
                Err(e) => {
                    self.fail(e);
                    return;
                }
            }
        }
    }

    /// Report a connection-level failure and mark the channel disconnected.
    fn fail(&self, error: ChannelError) {
        if *self.shutdown.borrow() {
            return;
        }
        warn!(addr = %self.addr, "session channel failed: {error}");
        self.state.set(ConnectionState::Disconnected);
        let _ = self.inbound.send(InboundEvent::ConnectionError {
            message: error.to_string(),
        });
        let _ = self.inbound.send(InboundEvent::Disconnected);
    }
}

/// Read frames until one carries content; zero-length frames are keepalives.
async fn next_server_frame(
    reader: &mut OwnedReadHalf,
    config: &FrameConfig,
) -> Result<ServerFrame, ChannelError> {
    loop {
        let payload = read_frame(reader, config).await?;
        if !payload.is_empty() {
            return Ok(decode_frame(&payload)?);
        }
    }
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<OutboundEvent>,
    config: FrameConfig,
    mut state: watch::Receiver<ConnectionState>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let event = tokio::select! {
            event = outbound.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = shutdown_requested(&mut shutdown) => break,
            _ = state.wait_for(|s| *s == ConnectionState::Disconnected) => break,
        };
        if !write_event(&mut writer, event, &config).await {
            break;
        }
    }

    // A local close still delivers what was queued before it, e.g. `leaveGame`.
    if *shutdown.borrow() {
        while let Ok(event) = outbound.try_recv() {
            if !write_event(&mut writer, event, &config).await {
                break;
            }
        }
    }
    let _ = writer.shutdown().await;
}

/// Write one event. Returns `false` once the connection is unusable.
async fn write_event(
    writer: &mut OwnedWriteHalf,
    event: OutboundEvent,
    config: &FrameConfig,
) -> bool {
    let name = event.name();
    let written = match encode_frame(&ClientFrame::Event(event)) {
        Ok(payload) => write_frame(writer, &payload, config)
            .await
            .map_err(ChannelError::from),
        Err(e) => Err(e.into()),
    };

    match written {
        Ok(()) => {
            debug!(event = name, "outbound event");
            true
        }
        Err(
            e @ (ChannelError::Protocol(_)
            | ChannelError::Frame(FrameError::PayloadTooLarge { .. })),
        ) => {
            warn!(event = name, "dropping unsendable event: {e}");
            true
        }
        Err(e) => {
            warn!(event = name, "writer stopped: {e}");
            false
        }
    }
}
