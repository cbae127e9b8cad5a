//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the live room map and the media store. A room exists only while
//! at least one client is joined; the relay keeps no annotation history.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Notify, RwLock, mpsc};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::services::media::MediaStore;

// =============================================================================
// ROOM STATE
// =============================================================================

/// One connection's handle as seen by its room.
#[derive(Clone)]
pub struct ConnectedClient {
    /// Outbound queue of relayed frames.
    pub tx: mpsc::Sender<String>,
    /// Signalled when the room drops this client for falling behind.
    pub evicted: Arc<Notify>,
}

impl ConnectedClient {
    #[must_use]
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx, evicted: Arc::new(Notify::new()) }, rx)
    }
}

/// Connected clients of one room, keyed by `client_id`.
pub struct RoomState {
    pub clients: HashMap<Uuid, ConnectedClient>,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self { clients: HashMap::new() }
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<String, RoomState>>>,
    pub media: Arc<dyn MediaStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, media: Arc<dyn MediaStore>) -> Self {
        Self { rooms: Arc::new(RwLock::new(HashMap::new())), media, config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::path::PathBuf;

    use super::*;
    use crate::services::media::DiskMediaStore;

    /// Fresh upload root under the system temp dir, unique per call.
    #[must_use]
    pub fn temp_upload_dir() -> PathBuf {
        std::env::temp_dir().join(format!("annoroom-test-{}", Uuid::new_v4()))
    }

    /// `AppState` backed by a disk store in a fresh temp dir.
    #[must_use]
    pub fn test_app_state() -> AppState {
        let upload_dir = temp_upload_dir();
        let media = Arc::new(DiskMediaStore::new(&upload_dir));
        let config = ServerConfig { upload_dir, ..ServerConfig::default() };
        AppState::new(config, media)
    }

    /// Join a fake client to `room` and return its id and receiver.
    pub async fn seed_client(state: &AppState, room: &str) -> (Uuid, mpsc::Receiver<String>) {
        let client_id = Uuid::new_v4();
        let (client, rx) = ConnectedClient::new(state.config.room_client_buffer);
        crate::services::room::join_room(state, room, client_id, client).await;
        (client_id, rx)
    }

    /// Number of clients currently joined to `room`.
    pub async fn room_size(state: &AppState, room: &str) -> usize {
        state.rooms.read().await.get(room).map_or(0, |r| r.clients.len())
    }

    /// Serve the full router on an ephemeral local port.
    pub async fn spawn_server(state: AppState) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
        let addr = listener.local_addr().expect("test listener address");
        tokio::spawn(async move {
            axum::serve(listener, crate::routes::app(state)).await.expect("test server");
        });
        addr
    }
}
