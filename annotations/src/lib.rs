//! Client-side core for shared 3D annotations.
//!
//! Every participant in a room keeps its own copy of the annotation set. This
//! crate owns that copy and everything that mutates it: the local edit
//! session, keyboard/wheel input, the delta codec that turns local edits into
//! additive `update` frames, and the transport channel state machine. The host
//! (the CLI session loop, or any other frontend) feeds raw events into
//! [`engine::Engine`] and sends whatever [`protocol::Message`]s come back.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Single update entry point tying the modules together |
//! | [`store`] | In-memory annotation store |
//! | [`edit`] | Edit session state machine and edit modes |
//! | [`delta`] | Delta computation and inbound delta application |
//! | [`input`] | Held-key tracking and per-mode axis mapping |
//! | [`transform`] | Position/rotation/scale value type |
//! | [`channel`] | Transport channel lifecycle and frame codec |
//! | [`scheduler`] | Fixed-period tick source for held keys |
//! | [`ids`] | Annotation id and room code generation |
//! | [`consts`] | Shared numeric constants (tick period, sensitivity, wheel factors) |

pub mod channel;
pub mod consts;
pub mod delta;
pub mod edit;
pub mod engine;
pub mod ids;
pub mod input;
pub mod scheduler;
pub mod store;
pub mod transform;
