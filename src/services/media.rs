//! Media store: reference files uploaded to a room.
//!
//! DESIGN
//! ======
//! Storage sits behind the [`MediaStore`] trait so handlers never touch the
//! filesystem directly. The default [`DiskMediaStore`] lays files out as
//! `<root>/<room>/<kind>/<millis>_<name>`; the same tree is served read-only
//! at `/uploads`, so a stored file's public URL mirrors its relative path.
//!
//! Room codes and filenames arrive from clients and become path components.
//! Room codes are validated and filenames reduced to a safe basename before
//! any path is built.

#[cfg(test)]
#[path = "media_test.rs"]
mod media_test;

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use protocol::MediaKind;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::ErrorCode;
use crate::services::room::is_valid_room_code;

/// Public mount point of the store.
pub const PUBLIC_PREFIX: &str = "/uploads";

const MAX_SAVE_ATTEMPTS: u32 = 16;
const FALLBACK_FILENAME: &str = "upload";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("No file uploaded")]
    MissingFile,
    #[error("Session code is required")]
    MissingRoom,
    #[error("Invalid session code: {0}")]
    InvalidRoom(String),
    #[error("Invalid file type. Please upload {expected}.")]
    InvalidType { expected: &'static str, got: String },
    #[error("Unknown upload kind: {0}")]
    UnknownKind(String),
    #[error("Malformed upload: {0}")]
    Multipart(String),
    #[error("Storage failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorCode for MediaError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingFile => "E_MISSING_FILE",
            Self::MissingRoom => "E_MISSING_ROOM",
            Self::InvalidRoom(_) => "E_INVALID_ROOM",
            Self::InvalidType { .. } => "E_INVALID_TYPE",
            Self::UnknownKind(_) => "E_UNKNOWN_KIND",
            Self::Multipart(_) => "E_MULTIPART",
            Self::Io(_) => "E_IO",
        }
    }
}

/// Result of a successful store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Public URL under [`PUBLIC_PREFIX`].
    pub url: String,
    /// Sanitized original name.
    pub filename: String,
    /// Name on disk, unique within the room and kind.
    pub saved_filename: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    pub filename: String,
    pub url: String,
    pub size: u64,
    pub upload_time: Option<String>,
    pub is_file: bool,
}

/// Stored files of one room, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MediaListing {
    pub pdf: Vec<MediaEntry>,
    pub image: Vec<MediaEntry>,
    pub video: Vec<MediaEntry>,
}

impl MediaListing {
    #[must_use]
    pub fn total(&self) -> usize {
        self.pdf.len() + self.image.len() + self.video.len()
    }

    fn entries_mut(&mut self, kind: MediaKind) -> &mut Vec<MediaEntry> {
        match kind {
            MediaKind::Pdf => &mut self.pdf,
            MediaKind::Image => &mut self.image,
            MediaKind::Video => &mut self.video,
        }
    }
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist `bytes` for `room` and return where they can be fetched.
    async fn store(&self, room: &str, kind: MediaKind, filename: &str, bytes: &[u8]) -> Result<StoredMedia, MediaError>;

    /// Everything stored for `room`. A room with no uploads lists as empty.
    async fn list(&self, room: &str) -> Result<MediaListing, MediaError>;
}

// =============================================================================
// VALIDATION
// =============================================================================

fn expected_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Pdf => "a PDF file",
        MediaKind::Image => "an image file",
        MediaKind::Video => "a video file",
    }
}

/// Check the declared content type against the upload kind.
///
/// # Errors
///
/// Returns [`MediaError::InvalidType`] when the type is missing or belongs to
/// another kind.
pub fn check_content_type(kind: MediaKind, content_type: Option<&str>) -> Result<(), MediaError> {
    let got = content_type.unwrap_or_default().trim().to_ascii_lowercase();
    let accepted = match kind {
        MediaKind::Pdf => got == "application/pdf",
        MediaKind::Image => got.starts_with("image/"),
        MediaKind::Video => got.starts_with("video/"),
    };
    if accepted { Ok(()) } else { Err(MediaError::InvalidType { expected: expected_type(kind), got }) }
}

/// Validate a client-supplied room code for use as a path component.
///
/// # Errors
///
/// Returns [`MediaError::MissingRoom`] for a blank code and
/// [`MediaError::InvalidRoom`] for anything else that is not a valid code.
pub fn check_room(room: &str) -> Result<&str, MediaError> {
    let room = room.trim();
    if room.is_empty() {
        return Err(MediaError::MissingRoom);
    }
    if !is_valid_room_code(room) {
        return Err(MediaError::InvalidRoom(room.to_owned()));
    }
    Ok(room)
}

/// Reduce a client filename to a safe basename.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() { FALLBACK_FILENAME.to_owned() } else { cleaned.to_owned() }
}

// =============================================================================
// PDF PAGES
// =============================================================================

/// Estimate a PDF's page count by counting `/Type /Page` dictionaries
/// (excluding `/Type /Pages` tree nodes). `None` when no page objects are
/// found, e.g. for compressed object streams.
#[must_use]
pub fn pdf_page_count(bytes: &[u8]) -> Option<usize> {
    const TYPE: &[u8] = b"/Type";
    const PAGE: &[u8] = b"/Page";

    let mut count = 0;
    let mut i = 0;
    while let Some(offset) = find(&bytes[i..], TYPE) {
        let mut j = i + offset + TYPE.len();
        while bytes.get(j).is_some_and(u8::is_ascii_whitespace) {
            j += 1;
        }
        if bytes[j..].starts_with(PAGE) && bytes.get(j + PAGE.len()) != Some(&b's') {
            count += 1;
        }
        i = j;
    }
    (count > 0).then_some(count)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// =============================================================================
// DISK STORE
// =============================================================================

pub struct DiskMediaStore {
    root: PathBuf,
}

impl DiskMediaStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn kind_dir(&self, room: &str, kind: MediaKind) -> PathBuf {
        self.root.join(room).join(kind.as_str())
    }
}

fn public_url(room: &str, kind: MediaKind, filename: &str) -> String {
    format!("{PUBLIC_PREFIX}/{room}/{kind}/{filename}")
}

fn unix_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis())
}

fn format_time(at: SystemTime) -> Option<String> {
    match OffsetDateTime::from(at).format(&Rfc3339) {
        Ok(formatted) => Some(formatted),
        Err(e) => {
            tracing::debug!(error = %e, "media: unformattable mtime");
            None
        }
    }
}

#[async_trait]
impl MediaStore for DiskMediaStore {
    async fn store(&self, room: &str, kind: MediaKind, filename: &str, bytes: &[u8]) -> Result<StoredMedia, MediaError> {
        let room = check_room(room)?;
        let filename = sanitize_filename(filename);
        let dir = self.kind_dir(room, kind);
        tokio::fs::create_dir_all(&dir).await?;

        let stamp = unix_millis();
        let mut attempt = 0;
        let (saved_filename, mut file) = loop {
            let candidate = if attempt == 0 { format!("{stamp}_{filename}") } else { format!("{stamp}-{attempt}_{filename}") };
            match tokio::fs::OpenOptions::new().write(true).create_new(true).open(dir.join(&candidate)).await {
                Ok(file) => break (candidate, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt + 1 < MAX_SAVE_ATTEMPTS => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        };
        file.write_all(bytes).await?;
        file.flush().await?;

        let size = bytes.len() as u64;
        info!(%room, %kind, file = %saved_filename, size, "media: stored");
        Ok(StoredMedia { url: public_url(room, kind, &saved_filename), filename, saved_filename, size })
    }

    async fn list(&self, room: &str) -> Result<MediaListing, MediaError> {
        let room = check_room(room)?;
        let mut listing = MediaListing::default();

        for kind in MediaKind::ALL {
            let mut dir = match tokio::fs::read_dir(self.kind_dir(room, kind)).await {
                Ok(dir) => dir,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let entries = listing.entries_mut(kind);
            while let Some(entry) = dir.next_entry().await? {
                let metadata = entry.metadata().await?;
                let filename = entry.file_name().to_string_lossy().into_owned();
                entries.push(MediaEntry {
                    url: public_url(room, kind, &filename),
                    filename,
                    size: metadata.len(),
                    upload_time: metadata.modified().ok().and_then(format_time),
                    is_file: metadata.is_file(),
                });
            }
            entries.sort_by(|a, b| a.filename.cmp(&b.filename));
        }

        Ok(listing)
    }
}
