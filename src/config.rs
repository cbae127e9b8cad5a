//! Server configuration, read once from the environment at startup.
//!
//! Unset or unparseable variables fall back to the defaults below.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_UPLOAD_DIR: &str = "./public/uploads";
pub const DEFAULT_ROOM_CLIENT_BUFFER: usize = 256;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Root of the on-disk media store. Also served at `/uploads`.
    pub upload_dir: PathBuf,
    /// Per-connection outbound queue depth. Peers that fall this far behind
    /// miss frames rather than stall the room.
    pub room_client_buffer: usize,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            upload_dir: std::env::var("UPLOAD_DIR").map_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR), PathBuf::from),
            room_client_buffer: env_parse("ROOM_CLIENT_BUFFER", DEFAULT_ROOM_CLIENT_BUFFER).max(1),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            room_client_buffer: DEFAULT_ROOM_CLIENT_BUFFER,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
