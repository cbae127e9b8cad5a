//! Room service: join, part, and fan-out.
//!
//! DESIGN
//! ======
//! A room is a set of connected clients keyed by room code. It is created on
//! first join and evicted when the last client parts. The relay never inspects
//! annotation state; it forwards frame text as received.
//!
//! Updates are additive, so a peer that misses one frame diverges for good.
//! Fan-out therefore never skips a peer: one whose outbound queue is full is
//! evicted from the room and its connection closed, so the client sees a lost
//! connection instead of silently wrong state. The sender is never blocked by
//! a slow peer.

#[cfg(test)]
#[path = "room_test.rs"]
mod room_test;

use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::{AppState, ConnectedClient, RoomState};

pub const MAX_ROOM_CODE_LEN: usize = 64;

/// Room codes name directories in the media store, so they are restricted to
/// ASCII alphanumerics, `-` and `_`.
#[must_use]
pub fn is_valid_room_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_ROOM_CODE_LEN
        && code.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Add a client to a room, creating the room if needed. Returns the number of
/// other clients already present.
pub async fn join_room(state: &AppState, room: &str, client_id: Uuid, client: ConnectedClient) -> usize {
    let mut rooms = state.rooms.write().await;
    let room_state = rooms.entry(room.to_owned()).or_insert_with(RoomState::new);
    room_state.clients.insert(client_id, client);
    let peers = room_state.clients.len() - 1;
    info!(%room, %client_id, peers, "client joined room");
    peers
}

/// Remove a client from a room. Evicts the room when it becomes empty.
pub async fn part_room(state: &AppState, room: &str, client_id: Uuid) {
    let mut rooms = state.rooms.write().await;
    let Some(room_state) = rooms.get_mut(room) else {
        return;
    };

    room_state.clients.remove(&client_id);
    info!(%room, %client_id, remaining = room_state.clients.len(), "client left room");

    if room_state.clients.is_empty() {
        rooms.remove(room);
        info!(%room, "evicted empty room");
    }
}

/// Queue `text` for every client in the room except `exclude`. Returns how
/// many peers accepted the frame.
///
/// Peers whose queue is full are removed from the room and told to close.
/// The room is evicted if that leaves it empty.
pub async fn broadcast(state: &AppState, room: &str, text: &str, exclude: Option<Uuid>) -> usize {
    let mut rooms = state.rooms.write().await;
    let Some(room_state) = rooms.get_mut(room) else {
        return 0;
    };

    let mut delivered = 0;
    let mut lagging = Vec::new();
    for (client_id, client) in &room_state.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        match client.tx.try_send(text.to_owned()) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => lagging.push(*client_id),
            Err(TrySendError::Closed(_)) => debug!(%room, %client_id, "peer already gone"),
        }
    }

    for client_id in lagging {
        if let Some(client) = room_state.clients.remove(&client_id) {
            warn!(%room, %client_id, "peer queue full; evicting peer");
            client.evicted.notify_one();
        }
    }
    if room_state.clients.is_empty() {
        rooms.remove(room);
        info!(%room, "evicted empty room");
    }
    delivered
}
