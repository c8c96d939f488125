//! The [`Message`] sum type and the [`MessageType`] registry.
//!
//! Every frame on the wire is one flat JSON object whose `type` field
//! names the payload kind:
//!
//! ```text
//! {"type": "TYPE_PING", "playerName": "ada"}
//! ```
//!
//! [`MessageType`] is the single place that maps those strings to payload
//! kinds. The codec consults it on decode and asks [`Message`] for it on
//! encode, so adding a message kind means touching exactly this file.

use std::fmt;

use serde_json::Value;

use crate::types::{
    AnnouncementEvent, ChatEvent, DisconnectRequest, DrawAction, DrawPoint,
    ErrorEvent, JoinHandshake, KeepAlive, ParticipantState, PhaseUpdate,
    RosterUpdate, RoundHistory, SetWordToGuess, WordsToPick,
};

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// Every message kind this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    DrawData,
    DrawAction,
    RoundHistory,
    PhaseUpdate,
    ParticipantState,
    RosterUpdate,
    Chat,
    Announcement,
    JoinHandshake,
    KeepAlive,
    Error,
    WordsToPick,
    SetWordToGuess,
    DisconnectRequest,
}

/// Prefix the server puts on every type string.
const TYPE_PREFIX: &str = "TYPE_";

impl MessageType {
    /// All registered kinds, in no particular order.
    pub const ALL: [MessageType; 14] = [
        Self::DrawData,
        Self::DrawAction,
        Self::RoundHistory,
        Self::PhaseUpdate,
        Self::ParticipantState,
        Self::RosterUpdate,
        Self::Chat,
        Self::Announcement,
        Self::JoinHandshake,
        Self::KeepAlive,
        Self::Error,
        Self::WordsToPick,
        Self::SetWordToGuess,
        Self::DisconnectRequest,
    ];

    /// The exact string written to the `type` field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DrawData => "TYPE_DRAW_DATA",
            Self::DrawAction => "TYPE_DRAW_ACTION",
            Self::RoundHistory => "TYPE_CUR_ROUND_DRAW_DATA",
            Self::PhaseUpdate => "TYPE_GAME_PHASE_UPDATE",
            Self::ParticipantState => "TYPE_GAME_STATE",
            Self::RosterUpdate => "TYPE_PLAYERS_LIST",
            Self::Chat => "TYPE_CHAT_MESSAGE",
            Self::Announcement => "TYPE_ANNOUNCEMENT",
            Self::JoinHandshake => "TYPE_JOIN_ROOM_HANDSHAKE",
            Self::KeepAlive => "TYPE_PING",
            Self::Error => "TYPE_GAME_ERROR",
            Self::WordsToPick => "TYPE_WORDS_TO_PICK_HOLDER",
            Self::SetWordToGuess => "TYPE_SET_WORD_TO_GUESS",
            Self::DisconnectRequest => "TYPE_DISCONNECT_REQUEST",
        }
    }

    /// Looks up a wire type string.
    ///
    /// Accepts both the prefixed form (`TYPE_PING`) and the bare form
    /// (`PING`). Returns `None` for anything not registered.
    pub fn from_wire(name: &str) -> Option<Self> {
        let bare = name.strip_prefix(TYPE_PREFIX).unwrap_or(name);
        Self::ALL
            .into_iter()
            .find(|t| &t.as_str()[TYPE_PREFIX.len()..] == bare)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A decoded frame.
///
/// One variant per [`MessageType`] plus [`Message::Unrecognized`], which
/// keeps frames from newer servers instead of failing on them. An
/// unrecognized frame re-encodes to exactly what was received.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    DrawPoint(DrawPoint),
    DrawAction(DrawAction),
    RoundHistory(RoundHistory),
    PhaseUpdate(PhaseUpdate),
    ParticipantState(ParticipantState),
    RosterUpdate(RosterUpdate),
    Chat(ChatEvent),
    Announcement(AnnouncementEvent),
    JoinHandshake(JoinHandshake),
    KeepAlive(KeepAlive),
    Error(ErrorEvent),
    WordsToPick(WordsToPick),
    SetWordToGuess(SetWordToGuess),
    Disconnect(DisconnectRequest),
    /// A frame whose `type` is not registered. `payload` is the frame
    /// minus its `type` field.
    Unrecognized { type_name: String, payload: Value },
}

impl Message {
    /// The registered kind, or `None` for [`Message::Unrecognized`].
    pub fn message_type(&self) -> Option<MessageType> {
        let t = match self {
            Self::DrawPoint(_) => MessageType::DrawData,
            Self::DrawAction(_) => MessageType::DrawAction,
            Self::RoundHistory(_) => MessageType::RoundHistory,
            Self::PhaseUpdate(_) => MessageType::PhaseUpdate,
            Self::ParticipantState(_) => MessageType::ParticipantState,
            Self::RosterUpdate(_) => MessageType::RosterUpdate,
            Self::Chat(_) => MessageType::Chat,
            Self::Announcement(_) => MessageType::Announcement,
            Self::JoinHandshake(_) => MessageType::JoinHandshake,
            Self::KeepAlive(_) => MessageType::KeepAlive,
            Self::Error(_) => MessageType::Error,
            Self::WordsToPick(_) => MessageType::WordsToPick,
            Self::SetWordToGuess(_) => MessageType::SetWordToGuess,
            Self::Disconnect(_) => MessageType::DisconnectRequest,
            Self::Unrecognized { .. } => return None,
        };
        Some(t)
    }

    /// The string this message carries in its `type` field.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Unrecognized { type_name, .. } => type_name,
            other => other
                .message_type()
                .map_or(TYPE_PREFIX, MessageType::as_str),
        }
    }

    /// Serializes the payload (without `type`) to a JSON value.
    pub(crate) fn payload_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::DrawPoint(p) => serde_json::to_value(p),
            Self::DrawAction(p) => serde_json::to_value(p),
            Self::RoundHistory(p) => serde_json::to_value(p),
            Self::PhaseUpdate(p) => serde_json::to_value(p),
            Self::ParticipantState(p) => serde_json::to_value(p),
            Self::RosterUpdate(p) => serde_json::to_value(p),
            Self::Chat(p) => serde_json::to_value(p),
            Self::Announcement(p) => serde_json::to_value(p),
            Self::JoinHandshake(p) => serde_json::to_value(p),
            Self::KeepAlive(p) => serde_json::to_value(p),
            Self::Error(p) => serde_json::to_value(p),
            Self::WordsToPick(p) => serde_json::to_value(p),
            Self::SetWordToGuess(p) => serde_json::to_value(p),
            Self::Disconnect(p) => serde_json::to_value(p),
            Self::Unrecognized { payload, .. } => Ok(payload.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_prefixed_name_resolves() {
        assert_eq!(
            MessageType::from_wire("TYPE_GAME_PHASE_UPDATE"),
            Some(MessageType::PhaseUpdate)
        );
    }

    #[test]
    fn test_from_wire_bare_name_resolves() {
        assert_eq!(
            MessageType::from_wire("CUR_ROUND_DRAW_DATA"),
            Some(MessageType::RoundHistory)
        );
    }

    #[test]
    fn test_from_wire_unknown_name_is_none() {
        assert_eq!(MessageType::from_wire("FUTURE_TYPE"), None);
        assert_eq!(MessageType::from_wire(""), None);
    }

    #[test]
    fn test_every_type_resolves_its_own_name() {
        for t in MessageType::ALL {
            assert_eq!(MessageType::from_wire(t.as_str()), Some(t));
        }
    }

    #[test]
    fn test_unrecognized_keeps_type_name() {
        let msg = Message::Unrecognized {
            type_name: "FUTURE_TYPE".into(),
            payload: Value::Null,
        };
        assert_eq!(msg.type_name(), "FUTURE_TYPE");
        assert_eq!(msg.message_type(), None);
    }

    #[test]
    fn test_type_name_of_keep_alive() {
        let msg = Message::KeepAlive(KeepAlive::default());
        assert_eq!(msg.type_name(), "TYPE_PING");
    }
}
