//! Transport channel lifecycle and frame codec.
//!
//! The channel is a state machine over one duplex text connection per room.
//! It does no I/O itself; the host owns the socket and reports what happened
//! (`on_open`, `on_text`, `on_close`, `on_error`). In return the channel hands
//! back the handshake to send, decoded inbound frames, and encoded outbound
//! frames.
//!
//! DESIGN
//! ======
//! - The join handshake is produced exactly once, on the `Connecting -> Open`
//!   transition.
//! - A malformed inbound frame is logged and dropped; the channel stays open.
//! - `Closed` and `Errored` are terminal. There is no reconnect; the host
//!   surfaces the failure and the user starts a new session.

#[cfg(test)]
#[path = "channel_test.rs"]
mod channel_test;

use std::fmt;

use protocol::{CodecError, Inbound, JoinHandshake, Message, Notice};
use tracing::{info, warn};

/// Connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
    Errored(String),
}

impl ChannelState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Errored(_))
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
            Self::Errored(reason) => write!(f, "errored: {reason}"),
        }
    }
}

/// Error raised by channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("parse error: {0}")]
    Parse(#[from] CodecError),
    #[error("channel not open ({0})")]
    NotOpen(ChannelState),
}

/// Channel for one room.
#[derive(Debug)]
pub struct Channel {
    room_code: String,
    state: ChannelState,
}

impl Channel {
    #[must_use]
    pub fn new(room_code: impl Into<String>) -> Self {
        Self { room_code: room_code.into(), state: ChannelState::Connecting }
    }

    #[must_use]
    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    #[must_use]
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    /// Transport became ready. Returns the handshake to send.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotOpen`] unless the channel was `Connecting`.
    pub fn on_open(&mut self) -> Result<String, ChannelError> {
        if self.state != ChannelState::Connecting {
            return Err(ChannelError::NotOpen(self.state.clone()));
        }
        let handshake = protocol::encode(&JoinHandshake::web(self.room_code.clone()))?;
        self.state = ChannelState::Open;
        info!(room = %self.room_code, "channel: open");
        Ok(handshake)
    }

    /// Decode one inbound text frame. Malformed frames are logged here.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Parse`] for frames that don't decode, and
    /// [`ChannelError::NotOpen`] when not open.
    pub fn on_text(&self, text: &str) -> Result<Inbound, ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::NotOpen(self.state.clone()));
        }
        protocol::decode_inbound(text).map_err(|e| {
            warn!(room = %self.room_code, error = %e, "channel: dropped malformed frame");
            ChannelError::Parse(e)
        })
    }

    /// Encode an outbound annotation frame.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotOpen`] unless the channel is open.
    pub fn encode(&self, msg: &Message) -> Result<String, ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::NotOpen(self.state.clone()));
        }
        Ok(protocol::encode(msg)?)
    }

    /// Encode an outbound notice.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotOpen`] unless the channel is open.
    pub fn encode_notice(&self, notice: &Notice) -> Result<String, ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::NotOpen(self.state.clone()));
        }
        Ok(protocol::encode(notice)?)
    }

    /// Transport closed. Ignored once terminal.
    pub fn on_close(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        info!(room = %self.room_code, "channel: closed");
        self.state = ChannelState::Closed;
    }

    /// Transport failed. Ignored once terminal.
    pub fn on_error(&mut self, reason: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }
        let reason = reason.into();
        warn!(room = %self.room_code, %reason, "channel: errored");
        self.state = ChannelState::Errored(reason);
    }
}
