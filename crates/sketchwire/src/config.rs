//! Client configuration.
//!
//! [`ClientConfig`] gathers everything a [`GameClient`](crate::GameClient)
//! needs: where the server is, who the local participant is, and the
//! tunables of every layer underneath.

use sketchwire_canvas::CanvasConfig;
use sketchwire_protocol::ClientId;
use sketchwire_tick::CountdownConfig;
use sketchwire_transport::SessionConfig;
use tracing::warn;

use crate::ClientError;

/// Settings for one game client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the game server.
    ///
    /// Default: `ws://127.0.0.1:8080/ws/draw`.
    pub server_url: String,
    /// Display name of the local participant.
    pub participant_name: String,
    /// Room to join.
    pub room_name: String,
    /// Identity of this installation. `None` generates a fresh random id
    /// when the client starts. The id is never stored.
    pub client_id: Option<ClientId>,
    pub session: SessionConfig,
    pub canvas: CanvasConfig,
    pub countdown: CountdownConfig,
    /// Capacity of the [`ClientEvent`](crate::ClientEvent) broadcast.
    /// Slow subscribers lag and skip events past this many.
    ///
    /// Default: 256.
    pub event_capacity: usize,
    /// Capacity of the command queue into the client actor.
    ///
    /// Default: 32.
    pub command_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8080/ws/draw".to_string(),
            participant_name: String::new(),
            room_name: String::new(),
            client_id: None,
            session: SessionConfig::default(),
            canvas: CanvasConfig::default(),
            countdown: CountdownConfig::default(),
            event_capacity: 256,
            command_capacity: 32,
        }
    }
}

impl ClientConfig {
    /// Returns a copy with every layer's tunables clamped to sane ranges.
    pub fn validated(mut self) -> Self {
        self.session = self.session.validated();
        self.canvas = self.canvas.validated();
        self.countdown = self.countdown.validated();
        if self.event_capacity == 0 {
            warn!("event_capacity was 0, using 1");
            self.event_capacity = 1;
        }
        if self.command_capacity == 0 {
            warn!("command_capacity was 0, using 1");
            self.command_capacity = 1;
        }
        self
    }

    /// Checks the fields no default can fill in.
    ///
    /// # Errors
    /// [`ClientError::InvalidConfig`] when the participant name, room name
    /// or server URL is blank.
    pub fn check(&self) -> Result<(), ClientError> {
        if self.participant_name.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "participant name is empty".into(),
            ));
        }
        if self.room_name.trim().is_empty() {
            return Err(ClientError::InvalidConfig("room name is empty".into()));
        }
        if self.server_url.trim().is_empty() {
            return Err(ClientError::InvalidConfig("server url is empty".into()));
        }
        Ok(())
    }

    /// The configured client id, or a freshly generated one.
    pub fn client_id_or_generate(&self) -> ClientId {
        self.client_id.clone().unwrap_or_else(generate_client_id)
    }
}

/// Generates a random client id: 16 random bytes as 32 lowercase hex
/// characters.
pub fn generate_client_id() -> ClientId {
    let bytes: [u8; 16] = rand::random();
    ClientId::new(bytes.iter().map(|b| format!("{b:02x}")).collect::<String>())
}

// =========================================================================
// Tests
// =========================================================================
