//! WebSocket handler: room-scoped frame relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client frames → classify → join or relay
//! - Frames relayed by room peers → forward to client
//!
//! The relay is stateless about annotations. A valid frame is forwarded to
//! every other client in the sender's room exactly as received; it is never
//! echoed back and never rewritten. Classification lives in
//! `process_inbound_text`, which returns an `Outcome` so tests can exercise it
//! without a socket.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → wait for the join handshake
//! 2. Handshake joins the room; other frames before it are dropped
//! 3. Annotation frames and file notices → relay to room peers
//! 4. Close → part the room (empty rooms are evicted)
//! 5. Queue overflow → the room evicts the client; the socket is closed with
//!    code 1013 so the peer reconnects instead of drifting out of sync

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;

use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::response::Response;
use protocol::{CodecError, Inbound, JoinHandshake};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services;
use crate::state::{AppState, ConnectedClient};

// =============================================================================
// OUTCOME
// =============================================================================

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Handshake accepted; the client is now in `room`.
    Joined { room: String, peers: usize },
    /// Frame forwarded to `delivered` peers.
    Relayed { delivered: usize },
    /// Frame discarded; the connection stays open.
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DropReason {
    /// A non-handshake frame arrived before the join.
    NotJoined,
    /// Handshake named an unusable room code.
    InvalidRoom,
    /// Not JSON, or a frame missing required fields.
    Malformed,
    /// JSON that is neither an annotation frame, a file notice, nor a handshake.
    Unrecognized,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for frames relayed by room peers.
    let (client, mut client_rx) = ConnectedClient::new(state.config.room_client_buffer);

    info!(%client_id, "ws: client connected");
    let mut current_room: Option<String> = None;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!(%client_id, error = %e, "ws: receive failed");
                        break;
                    }
                };
                match msg {
                    Message::Text(text) => {
                        let outcome = process_inbound_text(&state, &mut current_room, client_id, &client, &text).await;
                        debug!(%client_id, ?outcome, "ws: inbound frame");
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(text) = client_rx.recv() => {
                if let Err(e) = socket.send(Message::Text(text.into())).await {
                    debug!(%client_id, error = %e, "ws: send failed");
                    break;
                }
            }
            () = client.evicted.notified() => {
                warn!(%client_id, room = ?current_room, "ws: evicted for falling behind; closing");
                let frame = CloseFrame { code: close_code::AGAIN, reason: "relay queue overflow".into() };
                if let Err(e) = socket.send(Message::Close(Some(frame))).await {
                    debug!(%client_id, error = %e, "ws: close send failed");
                }
                break;
            }
        }
    }

    if let Some(room) = current_room {
        services::room::part_room(&state, &room, client_id).await;
    }
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME HANDLING
// =============================================================================

/// Classify one inbound text frame and join or relay it.
///
/// Before the join, only a handshake is accepted. After the join, annotation
/// frames and file notices are relayed verbatim; a second handshake moves the
/// client to the named room.
pub(crate) async fn process_inbound_text(
    state: &AppState,
    current_room: &mut Option<String>,
    client_id: Uuid,
    client: &ConnectedClient,
    text: &str,
) -> Outcome {
    let Some(room) = current_room.clone() else {
        return match protocol::decode_handshake(text) {
            Ok(handshake) => join(state, current_room, client_id, client, handshake).await,
            Err(e) => {
                warn!(%client_id, error = %e, "ws: frame before join handshake dropped");
                Outcome::Dropped(DropReason::NotJoined)
            }
        };
    };

    match protocol::decode_inbound(text) {
        Ok(inbound) => {
            match &inbound {
                Inbound::Annotation(msg) => {
                    debug!(%client_id, %room, command = msg.command(), annotation_id = msg.annotation_id(), "ws: relay");
                }
                Inbound::Notice(_) => info!(%client_id, %room, "ws: relay file notice"),
            }
            let delivered = services::room::broadcast(state, &room, text, Some(client_id)).await;
            Outcome::Relayed { delivered }
        }
        Err(CodecError::Unrecognized) => match protocol::decode_handshake(text) {
            Ok(handshake) => join(state, current_room, client_id, client, handshake).await,
            Err(_) => {
                warn!(%client_id, %room, "ws: unrecognized frame dropped");
                Outcome::Dropped(DropReason::Unrecognized)
            }
        },
        Err(e) => {
            warn!(%client_id, %room, error = %e, "ws: malformed frame dropped");
            Outcome::Dropped(DropReason::Malformed)
        }
    }
}

async fn join(
    state: &AppState,
    current_room: &mut Option<String>,
    client_id: Uuid,
    client: &ConnectedClient,
    handshake: JoinHandshake,
) -> Outcome {
    let room = handshake.annotation_room_code.trim().to_owned();
    if !services::room::is_valid_room_code(&room) {
        warn!(%client_id, room = %handshake.annotation_room_code, "ws: handshake with invalid room code");
        return Outcome::Dropped(DropReason::InvalidRoom);
    }

    // Part current room if already joined.
    if let Some(old_room) = current_room.take() {
        services::room::part_room(state, &old_room, client_id).await;
    }

    let peers = services::room::join_room(state, &room, client_id, client.clone()).await;
    info!(%client_id, %room, client = %handshake.client, peers, "ws: joined room");
    *current_room = Some(room.clone());
    Outcome::Joined { room, peers }
}
