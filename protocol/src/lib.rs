//! Shared wire model and JSON codec for the annotation channel.
//!
//! This crate owns the representation used by both the relay server and
//! clients. Every frame is a single JSON text message. Annotation frames are
//! tagged by `command`; the only other inbound kind is the `file` notice that
//! announces an uploaded reference document.
//!
//! DESIGN
//! ======
//! - `create` carries an absolute transform; `update` carries a delta that
//!   receivers add onto their stored transform. There is no absolute update.
//! - `select` / `deselect` are advisory. Nothing on the wire enforces them.
//! - The join handshake is not a `command` frame; it is sent exactly once,
//!   immediately after the channel opens.

mod vec3;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use vec3::Vec3;

/// Client kind reported in the join handshake.
pub const CLIENT_KIND_WEB: &str = "web";

// =============================================================================
// ERRORS
// =============================================================================

/// Error returned by the decode functions.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not valid JSON or does not match the expected shape.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Valid JSON object that is neither a `command` frame nor a `file` notice.
    #[error("unrecognized frame")]
    Unrecognized,
}

// =============================================================================
// SHAPES AND MEDIA
// =============================================================================

/// Marker shape drawn for an annotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    Circle,
    Square,
    Arrow,
    Triangle,
}

impl ShapeKind {
    /// Every shape, in selector order.
    pub const ALL: [Self; 4] = [Self::Circle, Self::Square, Self::Arrow, Self::Triangle];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Circle => "Circle",
            Self::Square => "Square",
            Self::Arrow => "Arrow",
            Self::Triangle => "Triangle",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = String;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown shape: {s}"))
    }
}

/// Kind of uploaded reference material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Pdf,
    Image,
    Video,
}

impl MediaKind {
    pub const ALL: [Self; 3] = [Self::Pdf, Self::Image, Self::Video];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown media kind: {s}"))
    }
}

// =============================================================================
// FRAMES
// =============================================================================

/// First frame on every channel. Scopes the connection to one room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinHandshake {
    pub client: String,
    #[serde(rename = "annotationRoomCode")]
    pub annotation_room_code: String,
}

impl JoinHandshake {
    #[must_use]
    pub fn web(room_code: impl Into<String>) -> Self {
        Self { client: CLIENT_KIND_WEB.to_owned(), annotation_room_code: room_code.into() }
    }
}

/// An annotation command frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Message {
    /// New annotation with an absolute transform.
    Create {
        #[serde(rename = "type")]
        kind: ShapeKind,
        #[serde(rename = "annotationId")]
        annotation_id: String,
        position: Vec3,
        rotation: Vec3,
        scale: Vec3,
    },
    /// Additive delta for each triple.
    Update {
        #[serde(rename = "annotationId")]
        annotation_id: String,
        position: Vec3,
        rotation: Vec3,
        scale: Vec3,
    },
    Select {
        #[serde(rename = "annotationId")]
        annotation_id: String,
    },
    Deselect {
        #[serde(rename = "annotationId")]
        annotation_id: String,
    },
    Delete {
        #[serde(rename = "annotationId")]
        annotation_id: String,
    },
}

impl Message {
    /// The annotation this frame refers to.
    #[must_use]
    pub fn annotation_id(&self) -> &str {
        match self {
            Self::Create { annotation_id, .. }
            | Self::Update { annotation_id, .. }
            | Self::Select { annotation_id }
            | Self::Deselect { annotation_id }
            | Self::Delete { annotation_id } => annotation_id,
        }
    }

    /// Wire name of the command.
    #[must_use]
    pub fn command(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Select { .. } => "select",
            Self::Deselect { .. } => "deselect",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Out-of-band notices sharing the channel with annotation commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Notice {
    /// A reference file was uploaded and is available at `url`.
    File {
        #[serde(rename = "fileType")]
        file_type: MediaKind,
        url: String,
        timestamp: String,
        #[serde(rename = "roomCode")]
        room_code: String,
    },
}

/// Any frame a client may receive after joining.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    Annotation(Message),
    Notice(Notice),
}

// =============================================================================
// CODEC
// =============================================================================

/// Serialize any frame to its JSON text form.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] only if serialization fails, which cannot
/// happen for the frame types in this crate.
pub fn encode<T: Serialize>(frame: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string(frame)?)
}

/// Decode one inbound text frame.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] for invalid JSON or a `command` frame
/// with missing/mistyped fields, and [`CodecError::Unrecognized`] for JSON
/// objects that carry neither `command` nor a known `type`.
pub fn decode_inbound(text: &str) -> Result<Inbound, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    if value.get("command").is_some() {
        return Ok(Inbound::Annotation(serde_json::from_value(value)?));
    }
    if value.get("type").is_some() {
        return Ok(Inbound::Notice(serde_json::from_value(value)?));
    }
    Err(CodecError::Unrecognized)
}

/// Decode the join handshake.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] when the text is not a handshake.
pub fn decode_handshake(text: &str) -> Result<JoinHandshake, CodecError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
