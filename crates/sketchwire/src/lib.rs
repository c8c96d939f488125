//! # Sketchwire
//!
//! Client-side sync core for multiplayer draw-and-guess games.
//!
//! The server is the single source of truth for the game: who draws, which
//! phase the game is in, how long is left. Sketchwire keeps a client's view
//! of that state consistent across reordering, reconnects and late joins,
//! and turns local input into protocol messages.
//!
//! ## Layers
//!
//! | Crate | Role |
//! |---|---|
//! | `sketchwire-protocol` | wire types and the JSON codec |
//! | `sketchwire-transport` | reconnecting WebSocket session |
//! | `sketchwire-canvas` | stroke synchronization |
//! | `sketchwire-game` | phase machine and session aggregator |
//! | `sketchwire-tick` | local countdown between server updates |
//!
//! This crate wires them together into a [`GameClient`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sketchwire::prelude::*;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let (client, mut events) = GameClient::builder()
//!     .server_url("ws://localhost:8080/ws/draw")
//!     .participant_name("ada")
//!     .room_name("lobby")
//!     .connect()?;
//!
//! client.resize(1080.0, 1080.0).await?;
//! while let Ok(event) = events.recv().await {
//!     if event == ClientEvent::Stopped {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod dispatcher;
mod error;

pub use client::{ClientEvents, GameClient, GameClientBuilder};
pub use config::{ClientConfig, generate_client_id};
pub use dispatcher::{ClientEvent, Dispatch, GameCore, GameSnapshot};
pub use error::ClientError;

pub use sketchwire_canvas as canvas;
pub use sketchwire_game as game;
pub use sketchwire_protocol as protocol;
pub use sketchwire_tick as tick;
pub use sketchwire_transport as transport;

/// Convenient re-exports for building a client.
pub mod prelude {
    pub use crate::{
        ClientConfig, ClientError, ClientEvent, ClientEvents, GameClient,
        GameClientBuilder, GameSnapshot,
    };
    pub use sketchwire_canvas::{
        CanvasConfig, CanvasSize, DevicePoint, PathSegment, Stroke,
        StrokeStyle,
    };
    pub use sketchwire_game::{FeedItem, GameError, PhaseFlags};
    pub use sketchwire_protocol::{
        ClientId, Color, ErrorEvent, ErrorKind, ParticipantInfo, Phase,
        StrokePhase,
    };
    pub use sketchwire_tick::CountdownConfig;
    pub use sketchwire_transport::{SessionConfig, TransportError};
}
