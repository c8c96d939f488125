//! Error types for the protocol layer.
//!
//! Each crate in Sketchwire defines its own error enum. A `ProtocolError`
//! always means a frame could not be turned into a [`crate::Message`] (or
//! back), never a networking or game-rule problem.

use crate::MessageType;

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame is not valid JSON at all.
    #[error("malformed frame: {0}")]
    Malformed(serde_json::Error),

    /// The frame is a JSON object without a string `type` field.
    #[error("frame has no `type` discriminator")]
    MissingType,

    /// The `type` is known but the payload does not match its shape.
    ///
    /// Unknown types are *not* an error: they decode to
    /// [`crate::Message::Unrecognized`].
    #[error("decode failed for {message_type}: {source}")]
    Decode {
        message_type: MessageType,
        #[source]
        source: serde_json::Error,
    },

    /// The message is invalid at the protocol level, e.g. an envelope
    /// that is a JSON array instead of an object.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
