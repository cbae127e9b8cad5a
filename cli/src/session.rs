//! Scripted session host.
//!
//! DESIGN
//! ======
//! One task owns the [`Engine`], the [`Channel`] and the socket, and
//! `select!`s over three sources:
//! - inbound frames from room peers
//! - script events, read and paced (`wait`) by a separate feeder task
//! - scheduler ticks for held keys
//!
//! Engine state is never shared, so there are no locks. Outbound frames are
//! fire-and-forget: a failed send ends the session as a lost connection.
//!
//! LIFECYCLE
//! =========
//! 1. Connect, send the join handshake, start the tick scheduler
//! 2. Run until the script ends, then release held keys and linger briefly
//!    for peer frames
//! 3. Cancel the scheduler, close the socket, print the final store
//!
//! A close or transport error before the script finishes is reported as a
//! lost connection. There is no reconnect.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::time::Duration;

use annotations::channel::Channel;
use annotations::consts::TICK_PERIOD;
use annotations::engine::Engine;
use annotations::input::{Key, Modifiers};
use annotations::scheduler::TickScheduler;
use futures_util::{SinkExt, StreamExt};
use protocol::{Inbound, Message, Notice};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::script::{self, ScriptEvent};
use crate::{CliContext, CliError, print_json};

const TICK_BUFFER: usize = 4;
const SCRIPT_BUFFER: usize = 64;

type WsStream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

// =============================================================================
// EVENT HANDLING
// =============================================================================

/// Frames produced by one script event.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Outgoing {
    pub messages: Vec<Message>,
    pub notices: Vec<Notice>,
}

impl From<Vec<Message>> for Outgoing {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages, notices: Vec::new() }
    }
}

/// Per-session bookkeeping the engine doesn't own.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub room: String,
    pub last_created: Option<String>,
}

/// Apply one script event to the engine. `Wait` is handled by the feeder and
/// is a no-op here.
pub(crate) fn handle_event(engine: &mut Engine, session: &mut SessionState, event: ScriptEvent) -> Outgoing {
    match event {
        ScriptEvent::Create(kind) => match engine.create(kind) {
            Ok(out) => {
                session.last_created = engine.editing_id().map(str::to_owned);
                out.into()
            }
            Err(e) => {
                warn!(error = %e, "session: create rejected");
                Outgoing::default()
            }
        },
        ScriptEvent::Edit(id) => engine.start_edit(&id).into(),
        ScriptEvent::EditLast => match session.last_created.clone() {
            Some(id) => engine.start_edit(&id).into(),
            None => {
                warn!("session: edit-last before any create");
                Outgoing::default()
            }
        },
        ScriptEvent::Mode(mode) => {
            engine.set_mode(mode);
            Outgoing::default()
        }
        ScriptEvent::Sensitivity(value) => {
            engine.set_sensitivity(value);
            Outgoing::default()
        }
        ScriptEvent::KeyDown { key, shift } => engine.key_down(&Key::new(key), Modifiers { shift }).into(),
        ScriptEvent::KeyUp { key, shift } => {
            engine.key_up(&Key::new(key), Modifiers { shift });
            Outgoing::default()
        }
        ScriptEvent::Wheel { delta, shift } => engine.wheel(delta, Modifiers { shift }).messages.into(),
        ScriptEvent::Nudge(key) => engine.nudge(key).into(),
        ScriptEvent::Escape => engine.escape().into(),
        ScriptEvent::Blur => {
            engine.clear_keys();
            Outgoing::default()
        }
        ScriptEvent::Delete(id) => engine.delete(&id).into(),
        ScriptEvent::DeleteCurrent => match engine.editing_id().map(str::to_owned) {
            Some(id) => engine.delete(&id).into(),
            None => Outgoing::default(),
        },
        ScriptEvent::Share { kind, url } => {
            let notice = file_notice(kind, url, &session.room);
            engine.record_shared_file(notice.clone());
            Outgoing { messages: Vec::new(), notices: vec![notice] }
        }
        ScriptEvent::List => {
            print_store(engine);
            Outgoing::default()
        }
        ScriptEvent::Wait(_) => Outgoing::default(),
    }
}

pub(crate) fn file_notice(kind: protocol::MediaKind, url: String, room: &str) -> Notice {
    Notice::File { file_type: kind, url, timestamp: crate::now_rfc3339(), room_code: room.to_owned() }
}

/// One-line summary of an inbound frame for the transcript.
pub(crate) fn describe_inbound(inbound: &Inbound) -> String {
    match inbound {
        Inbound::Annotation(msg) => format!("<- {} {}", msg.command(), msg.annotation_id()),
        Inbound::Notice(Notice::File { file_type, url, .. }) => format!("<- file {file_type} {url}"),
    }
}

fn print_store(engine: &Engine) {
    match serde_json::to_string(&engine.store().list()) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => warn!(error = %e, "session: could not render store"),
    }
}

// =============================================================================
// SESSION LOOP
// =============================================================================

#[derive(Debug, Clone)]
pub(crate) struct SessionArgs {
    pub room: String,
    pub script: String,
    pub linger: Duration,
}

enum Exit {
    Finished,
    Lost(String),
}

/// Run a scripted session against the relay.
///
/// # Errors
///
/// Returns [`CliError::ConnectionLost`] when the channel fails before the
/// script completes, or a connect/script I/O error.
pub(crate) async fn run(ctx: &CliContext, args: SessionArgs) -> Result<(), CliError> {
    let mut channel = Channel::new(args.room.clone());
    let mut stream = connect(ctx, &mut channel).await?;

    let mut engine = Engine::new();
    let mut session = SessionState { room: args.room.clone(), last_created: None };

    let (tick_tx, mut tick_rx) = mpsc::channel(TICK_BUFFER);
    let mut scheduler = TickScheduler::new();
    scheduler.start(TICK_PERIOD, tick_tx);

    let reader = open_script(&args.script).await?;
    let (event_tx, mut event_rx) = mpsc::channel(SCRIPT_BUFFER);
    let feeder = tokio::spawn(feed_script(reader, event_tx));

    let linger = tokio::time::sleep(Duration::from_secs(86_400));
    tokio::pin!(linger);
    let mut script_done = false;

    let exit = loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    if let Ok(inbound) = channel.on_text(&text) {
                        println!("{}", describe_inbound(&inbound));
                        engine.apply_inbound(inbound);
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    channel.on_close();
                    break if script_done { Exit::Finished } else { Exit::Lost(channel.state().to_string()) };
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    channel.on_error(e.to_string());
                    break Exit::Lost(channel.state().to_string());
                }
            },
            Some(_tick) = tick_rx.recv() => {
                let out = Outgoing::from(engine.tick());
                if let Err(reason) = send_all(&mut stream, &channel, &out).await {
                    channel.on_error(reason.clone());
                    break Exit::Lost(reason);
                }
            }
            event = event_rx.recv(), if !script_done => match event {
                Some(event) => {
                    debug!(?event, "session: script event");
                    let out = handle_event(&mut engine, &mut session, event);
                    if let Err(reason) = send_all(&mut stream, &channel, &out).await {
                        channel.on_error(reason.clone());
                        break Exit::Lost(reason);
                    }
                }
                None => {
                    engine.clear_keys();
                    script_done = true;
                    linger.as_mut().reset(tokio::time::Instant::now() + args.linger);
                }
            },
            () = &mut linger, if script_done => break Exit::Finished,
        }
    };

    scheduler.cancel();
    feeder.abort();
    if channel.is_open() {
        if let Err(e) = stream.close(None).await {
            debug!(error = %e, "session: close handshake failed");
        }
        channel.on_close();
    }

    match exit {
        Exit::Finished => {
            info!(room = %args.room, annotations = engine.store().len(), "session: finished");
            print_json(&serde_json::to_value(engine.store().list())?)
        }
        Exit::Lost(reason) => Err(CliError::ConnectionLost(reason)),
    }
}

/// Open a channel, announce `notice`, and close. Used after an upload.
///
/// # Errors
///
/// Returns a connect error or [`CliError::ConnectionLost`] if the send fails.
pub(crate) async fn announce(ctx: &CliContext, room: &str, notice: &Notice) -> Result<(), CliError> {
    let mut channel = Channel::new(room);
    let mut stream = connect(ctx, &mut channel).await?;
    let out = Outgoing { messages: Vec::new(), notices: vec![notice.clone()] };
    send_all(&mut stream, &channel, &out).await.map_err(CliError::ConnectionLost)?;
    if let Err(e) = stream.close(None).await {
        debug!(error = %e, "announce: close handshake failed");
    }
    channel.on_close();
    Ok(())
}

async fn connect(ctx: &CliContext, channel: &mut Channel) -> Result<WsStream, CliError> {
    let url = crate::ws_url(&ctx.base_url)?;
    let (mut stream, _) = match connect_async(url.as_str()).await {
        Ok(connected) => connected,
        Err(e) => {
            channel.on_error(e.to_string());
            return Err(CliError::WsConnect(Box::new(e)));
        }
    };
    let handshake = channel.on_open()?;
    stream
        .send(WsMessage::Text(handshake.into()))
        .await
        .map_err(|e| CliError::WsConnect(Box::new(e)))?;
    Ok(stream)
}

/// Encode and send every frame in order. Encode failures are logged and the
/// frame dropped; a transport failure is returned as the lost-connection reason.
async fn send_all(stream: &mut WsStream, channel: &Channel, out: &Outgoing) -> Result<(), String> {
    let encoded = out
        .messages
        .iter()
        .map(|msg| channel.encode(msg))
        .chain(out.notices.iter().map(|notice| channel.encode_notice(notice)));
    for frame in encoded {
        match frame {
            Ok(text) => {
                debug!(frame = %text, "session: send");
                stream.send(WsMessage::Text(text.into())).await.map_err(|e| e.to_string())?;
            }
            Err(e) => warn!(error = %e, "session: dropped outbound frame"),
        }
    }
    Ok(())
}

// =============================================================================
// SCRIPT FEEDER
// =============================================================================

async fn open_script(source: &str) -> Result<Box<dyn AsyncBufRead + Unpin + Send>, CliError> {
    if source == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(source)
        .await
        .map_err(|e| CliError::Script(format!("open {source}: {e}")))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Read lines, sleep on `wait`, forward everything else. Bad lines are
/// reported and skipped.
async fn feed_script(reader: Box<dyn AsyncBufRead + Unpin + Send>, tx: mpsc::Sender<ScriptEvent>) {
    let mut lines = reader.lines();
    let mut lineno = 0_usize;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "script: read failed");
                break;
            }
        };
        lineno = lineno.saturating_add(1);
        match script::parse_line(&line) {
            Ok(None) => {}
            Ok(Some(ScriptEvent::Wait(duration))) => tokio::time::sleep(duration).await,
            Ok(Some(event)) => {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            Err(e) => eprintln!("script:{lineno}: {e}"),
        }
    }
}
