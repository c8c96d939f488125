//! Unified error type for the Sketchwire client.
//!
//! Each layer defines its own error enum. `ClientError` wraps them all
//! so that application code can use a single error type with `?`.

use sketchwire_canvas::CanvasError;
use sketchwire_game::GameError;
use sketchwire_protocol::ProtocolError;
use sketchwire_transport::TransportError;

/// Top-level error type for the Sketchwire client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error(transparent)]
    Game(#[from] GameError),

    /// The configuration cannot produce a working client.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// The client has stopped (left the room, hit an application error,
    /// or every handle was dropped).
    #[error("client has stopped")]
    Closed,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_from_transport_error() {
        let err: ClientError = TransportError::NotConnected.into();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.to_string(), TransportError::NotConnected.to_string());
    }

    #[test]
    fn test_client_error_from_protocol_error() {
        let err: ClientError = ProtocolError::MissingType.into();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[test]
    fn test_client_error_from_canvas_error() {
        let err: ClientError = CanvasError::EmptyCanvas.into();
        assert!(matches!(err, ClientError::Canvas(CanvasError::EmptyCanvas)));
    }

    #[test]
    fn test_client_error_from_game_error() {
        let err: ClientError = GameError::EmptyChatMessage.into();
        assert!(matches!(
            err,
            ClientError::Game(GameError::EmptyChatMessage)
        ));
    }

    #[test]
    fn test_client_error_closed_display() {
        assert_eq!(ClientError::Closed.to_string(), "client has stopped");
    }
}
