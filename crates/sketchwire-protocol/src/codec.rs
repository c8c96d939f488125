//! Codec trait and the JSON implementation.
//!
//! A "codec" (coder/decoder) converts between [`Message`] values and raw
//! frame bytes. The transport session only needs something that
//! implements [`Codec`]; tests can plug in their own.
//!
//! Decoding is two-step: parse the frame into a generic JSON object, pull
//! out `type`, then deserialize the remainder as the payload registered for
//! that type. Doing it by hand instead of with `#[serde(tag = "type")]`
//! lets unknown types fall through to [`Message::Unrecognized`] rather
//! than failing the whole frame.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::message::{Message, MessageType};
use crate::types::RoundHistory;
use crate::ProtocolError;

/// Name of the discriminator field in every frame.
const TYPE_FIELD: &str = "type";

/// Converts messages to frame bytes and back.
///
/// `Send + Sync + 'static` because the codec is moved into the transport
/// session's background task and used from whichever worker thread Tokio
/// schedules it on.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a message into one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode(&self, message: &Message) -> Result<Vec<u8>, ProtocolError>;

    /// Parses one frame.
    ///
    /// # Errors
    /// Returns an error if the frame is not a JSON object, lacks a `type`,
    /// or carries a known type with a mismatched payload. Unknown types
    /// succeed as [`Message::Unrecognized`].
    fn decode(&self, data: &[u8]) -> Result<Message, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] for the server's flat JSON frames.
///
/// ```rust
/// use sketchwire_protocol::{Codec, JsonCodec, KeepAlive, Message};
///
/// let codec = JsonCodec;
/// let msg = Message::KeepAlive(KeepAlive { participant_name: Some("ada".into()) });
///
/// let bytes = codec.encode(&msg).unwrap();
/// assert_eq!(codec.decode(&bytes).unwrap(), msg);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, message: &Message) -> Result<Vec<u8>, ProtocolError> {
        let mut object = match message
            .payload_value()
            .map_err(ProtocolError::Encode)?
        {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ProtocolError::InvalidMessage(format!(
                    "payload of {} is not an object: {other}",
                    message.type_name()
                )));
            }
        };
        object.insert(
            TYPE_FIELD.to_owned(),
            Value::String(message.type_name().to_owned()),
        );
        serde_json::to_vec(&Value::Object(object)).map_err(ProtocolError::Encode)
    }

    fn decode(&self, data: &[u8]) -> Result<Message, ProtocolError> {
        let value: Value =
            serde_json::from_slice(data).map_err(ProtocolError::Malformed)?;

        let Value::Object(mut object) = value else {
            return Err(ProtocolError::InvalidMessage(
                "frame is not a JSON object".into(),
            ));
        };

        let type_name = match object.remove(TYPE_FIELD) {
            Some(Value::String(name)) => name,
            _ => return Err(ProtocolError::MissingType),
        };

        let payload = Value::Object(object);

        let Some(message_type) = MessageType::from_wire(&type_name) else {
            warn!(%type_name, "unrecognized message type");
            return Ok(Message::Unrecognized { type_name, payload });
        };

        let message = match message_type {
            MessageType::DrawData => {
                Message::DrawPoint(from_payload(message_type, payload)?)
            }
            MessageType::DrawAction => {
                Message::DrawAction(from_payload(message_type, payload)?)
            }
            MessageType::RoundHistory => {
                Message::RoundHistory(from_payload(message_type, payload)?)
            }
            MessageType::PhaseUpdate => {
                Message::PhaseUpdate(from_payload(message_type, payload)?)
            }
            MessageType::ParticipantState => {
                Message::ParticipantState(from_payload(message_type, payload)?)
            }
            MessageType::RosterUpdate => {
                Message::RosterUpdate(from_payload(message_type, payload)?)
            }
            MessageType::Chat => {
                Message::Chat(from_payload(message_type, payload)?)
            }
            MessageType::Announcement => {
                Message::Announcement(from_payload(message_type, payload)?)
            }
            MessageType::JoinHandshake => {
                Message::JoinHandshake(from_payload(message_type, payload)?)
            }
            MessageType::KeepAlive => {
                Message::KeepAlive(from_payload(message_type, payload)?)
            }
            MessageType::Error => {
                Message::Error(from_payload(message_type, payload)?)
            }
            MessageType::WordsToPick => {
                Message::WordsToPick(from_payload(message_type, payload)?)
            }
            MessageType::SetWordToGuess => {
                Message::SetWordToGuess(from_payload(message_type, payload)?)
            }
            MessageType::DisconnectRequest => {
                Message::Disconnect(from_payload(message_type, payload)?)
            }
        };
        Ok(message)
    }
}

/// Deserializes a payload as the type registered for `message_type`.
fn from_payload<T: DeserializeOwned>(
    message_type: MessageType,
    payload: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(payload)
        .map_err(|source| ProtocolError::Decode { message_type, source })
}

impl RoundHistory {
    /// Decodes every entry of the replay log, in order.
    ///
    /// Each entry gets its own `Result` so that one corrupt entry does not
    /// hide the strokes around it.
    pub fn decode_entries<C: Codec>(
        &self,
        codec: &C,
    ) -> Vec<Result<Message, ProtocolError>> {
        self.entries
            .iter()
            .map(|entry| codec.decode(entry.as_bytes()))
            .collect()
    }
}

// =========================================================================
// Tests
// =========================================================================
