//! Wire protocol for Sketchwire.
//!
//! This crate defines the "language" the game client and server speak:
//!
//! - **Types** ([`DrawPoint`], [`PhaseUpdate`], [`ChatEvent`], etc.):
//!   the payload structures that travel on the wire.
//! - **Messages** ([`Message`], [`MessageType`]): the tagged union of all
//!   payloads, and the registry mapping `type` strings to payload kinds.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages are
//!   converted to and from frame bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing so.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw frames) and the
//! game state. It doesn't know about connections, phases, or canvases.
//!
//! ```text
//! Transport (frames) → Protocol (Message) → Canvas / Phase / Aggregator
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod message;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use message::{Message, MessageType};
pub use types::{
    AnnouncementEvent, AnnouncementKind, ChatEvent, ClientId, Color,
    DisconnectRequest, DrawAction, DrawActionKind, DrawPoint, ErrorEvent,
    ErrorKind, JoinHandshake, KeepAlive, ParticipantInfo, ParticipantState,
    Phase, PhaseChange, PhaseUpdate, RosterUpdate, RoundHistory,
    SetWordToGuess, StrokePhase, WordsToPick,
};
