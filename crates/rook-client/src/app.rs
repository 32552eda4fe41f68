//! The interactive loop: stdin commands and authority events feed one
//! [`GameSession`] in arrival order.

use std::io::BufRead;
use std::time::Duration;

use rook_config::Config;
use rook_net::{ChannelConfig, ChannelSender, FrameConfig, InboundEvent, SessionChannel};
use rook_rules::ChessRules;
use rook_session::{GameSession, NoticeSink, SessionView, StaticIdentity, TracingNoticeSink};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::commands::{Command, USAGE};
use crate::render;

/// How long `quit` waits for the final `leaveGame` to be written.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

type Session = GameSession<ChessRules, ChannelSender>;

/// Prints notices next to the board and logs them.
struct TerminalNotices;

impl NoticeSink for TerminalNotices {
    fn notify(&self, message: &str) {
        println!("! {message}");
        TracingNoticeSink.notify(message);
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Connect to the configured authority and play until `quit`, end of input,
/// or loss of the connection.
pub async fn run(config: &Config, identity: StaticIdentity) {
    let channel_config = ChannelConfig {
        handshake_timeout: Duration::from_secs(config.network.handshake_timeout_seconds.into()),
        frame: FrameConfig {
            max_payload_size: config.network.max_payload_size,
        },
    };
    let addr = config.network.authority_addr();
    info!(%addr, "connecting");
    let mut channel =
        SessionChannel::open(addr.clone(), config.identity.token.clone(), channel_config);

    let mut session = GameSession::new(
        ChessRules::new(),
        channel.sender(),
        Box::new(identity),
        Box::new(TerminalNotices),
    );

    println!("Connecting to {addr}...");
    println!("{USAGE}");
    let mut lines = spawn_stdin_reader();

    play(&mut session, &mut channel, &mut lines).await;

    session.leave();
    channel.shutdown(SHUTDOWN_GRACE).await;
}

/// Read stdin on its own thread and forward each line.
///
/// Tokio's stdin parks a blocking read that the runtime waits on at
/// shutdown, so the process could not exit while the prompt is idle. A
/// detached thread is simply abandoned when `main` returns.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("rook-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("failed to read stdin: {e}");
                        return;
                    }
                }
            }
            debug!("stdin closed");
        });
    if let Err(e) = spawned {
        warn!("failed to start stdin reader: {e}");
    }
    rx
}

/// Feed typed lines and authority events to `session` until `quit`, end of
/// input, or the channel reports that the connection is gone.
async fn play(
    session: &mut Session,
    channel: &mut SessionChannel,
    lines: &mut mpsc::UnboundedReceiver<String>,
) {
    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => match Command::parse(&line) {
                    Ok(Some(command)) => {
                        if let Flow::Quit = run_command(session, command) {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                },
                None => break,
            },
            event = channel.recv() => match event {
                Some(event) => on_event(session, event),
                None => {
                    println!("Connection to the game server is gone.");
                    break;
                }
            },
        }
    }
}

fn run_command(session: &mut Session, command: Command) -> Flow {
    let before = session.view();
    match command {
        Command::Create => {
            if session.create() {
                println!("Asked the server for a new game...");
            }
        }
        Command::Join(id) => {
            if session.join(&id) {
                println!("Joining game {id}...");
            }
        }
        Command::Move(mv) => {
            if !session.attempt_move(mv.clone()) {
                println!("{mv} was not played");
            }
        }
        Command::Leave => {
            session.leave();
        }
        Command::Show => print!("{}", render::frame(&session.view())),
        Command::Help => println!("{USAGE}"),
        Command::Quit => return Flow::Quit,
    }
    redraw_if_changed(session, &before);
    Flow::Continue
}

fn on_event(session: &mut Session, event: InboundEvent) {
    if let InboundEvent::Connected { handle } = &event {
        println!("Connected as {handle}.");
    }
    let before = session.view();
    session.handle(event);
    redraw_if_changed(session, &before);
}

fn redraw_if_changed(session: &Session, before: &SessionView) {
    let after = session.view();
    if after != *before {
        print!("{}", render::frame(&after));
    }
}
