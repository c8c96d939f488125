//! `GameClient` builder and client actor.
//!
//! This is the entry point for joining a game. It ties together all the
//! layers: transport session → codec → game core → UI events.
//!
//! ```text
//!                     ┌──────────────── ClientActor task ────────────────┐
//!  GameClient ──cmd──►│ commands ─► GameCore (local input) ─► send       │
//!                     │ inbound  ─┬─ opened / lost ─► handshake / reset  │
//!  SessionEvents ────►│           └─ message ─► GameCore::dispatch       │──► broadcast<ClientEvent>
//!                     │ ticker   ─► countdown                            │
//!                     └──────────────────────────────────────────────────┘
//! ```
//!
//! The actor is the only owner of game state, so there are no locks.
//! Connection changes and messages arrive on one ordered stream, so every
//! message is dispatched against the connection it came in on: the join
//! handshake is queued before the first message of a connection is seen,
//! and a connection loss is handled after its last message.
//!
//! Local game commands (draw, chat, pick) are refused with
//! [`TransportError::NotConnected`](sketchwire_transport::TransportError)
//! until the handshake for the current connection has been queued.

use std::time::{SystemTime, UNIX_EPOCH};

use sketchwire_canvas::{CanvasConfig, DevicePoint, StrokeStyle};
use sketchwire_game::{CountdownCommand, LocalParticipant};
use sketchwire_protocol::{
    ClientId, Codec, DisconnectRequest, JsonCodec, Message, StrokePhase,
};
use sketchwire_tick::{CountdownConfig, CountdownTicker};
use sketchwire_transport::{
    ConnectionEvent, SessionConfig, SessionEvent, SessionEvents, SessionHandle,
    Transport, TransportError, TransportSession, WebSocketTransport,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, trace};

use crate::dispatcher::{ClientEvent, Dispatch, GameCore, GameSnapshot};
use crate::{ClientConfig, ClientError};

/// Receiving end of a client's [`ClientEvent`] broadcast.
pub type ClientEvents = broadcast::Receiver<ClientEvent>;

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a [`GameClient`].
///
/// # Example
///
/// ```rust,ignore
/// use sketchwire::prelude::*;
///
/// let (client, mut events) = GameClient::builder()
///     .server_url("ws://localhost:8080/ws/draw")
///     .participant_name("ada")
///     .room_name("lobby")
///     .connect()?;
/// while let Ok(event) = events.recv().await {
///     println!("{event:?}");
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct GameClientBuilder {
    config: ClientConfig,
}

impl GameClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn participant_name(mut self, name: impl Into<String>) -> Self {
        self.config.participant_name = name.into();
        self
    }

    pub fn room_name(mut self, name: impl Into<String>) -> Self {
        self.config.room_name = name.into();
        self
    }

    /// Uses a stored installation id instead of generating one.
    pub fn client_id(mut self, id: ClientId) -> Self {
        self.config.client_id = Some(id);
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    pub fn canvas_config(mut self, config: CanvasConfig) -> Self {
        self.config.canvas = config;
        self
    }

    pub fn countdown_config(mut self, config: CountdownConfig) -> Self {
        self.config.countdown = config;
        self
    }

    /// Starts the client over a WebSocket to the configured server URL.
    ///
    /// Must be called inside a Tokio runtime. The first dial happens
    /// immediately; the returned receiver sees every event from the start.
    ///
    /// # Errors
    /// [`ClientError::InvalidConfig`] when the participant name, room name
    /// or URL is blank.
    pub fn connect(self) -> Result<(GameClient, ClientEvents), ClientError> {
        self.config.check()?;
        let transport = WebSocketTransport::new(self.config.server_url.clone());
        self.connect_with(transport)
    }

    /// Like [`connect`](Self::connect), over any [`Transport`].
    pub fn connect_with<T: Transport>(
        self,
        transport: T,
    ) -> Result<(GameClient, ClientEvents), ClientError> {
        self.config.check()?;
        let config = self.config.validated();

        let local = LocalParticipant {
            name: config.participant_name.clone(),
            client_id: config.client_id_or_generate(),
            room_name: config.room_name.clone(),
        };
        info!(
            participant = %local.name,
            room = %local.room_name,
            client_id = %local.client_id,
            url = %config.server_url,
            "starting game client"
        );

        let (session, inbound) =
            TransportSession::spawn(transport, JsonCodec, config.session.clone());
        let (commands_tx, commands_rx) = mpsc::channel(config.command_capacity);
        let (events_tx, events_rx) = broadcast::channel(config.event_capacity);

        let actor = ClientActor {
            core: GameCore::new(local.clone(), config.canvas.clone(), JsonCodec),
            session: session.clone(),
            inbound,
            commands: commands_rx,
            events: events_tx.clone(),
            ticker: CountdownTicker::new(config.countdown.clone()),
            joined: false,
        };
        tokio::spawn(actor.run());

        let client = GameClient {
            commands: commands_tx,
            events: events_tx,
            session,
            local,
        };
        Ok((client, events_rx))
    }
}

// ---------------------------------------------------------------------------
// Client handle
// ---------------------------------------------------------------------------

/// Commands sent from [`GameClient`] handles to the actor.
enum Command {
    Pointer {
        point: DevicePoint,
        phase: StrokePhase,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    Undo {
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    Chat {
        text: String,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    PickWord {
        word: String,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    Resize {
        width: f32,
        height: f32,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    SetStyle {
        style: StrokeStyle,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<GameSnapshot>,
    },
    Suspend {
        reply: oneshot::Sender<()>,
    },
    Resume {
        reply: oneshot::Sender<()>,
    },
    Leave {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running game client. Cheap to clone.
///
/// Every method talks to the client actor. Once the actor has stopped
/// (after [`leave`](Self::leave), an application error from the server,
/// or when every handle is dropped) they return [`ClientError::Closed`].
#[derive(Debug, Clone)]
pub struct GameClient {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<ClientEvent>,
    session: SessionHandle,
    local: LocalParticipant,
}

impl GameClient {
    /// Creates a new builder.
    pub fn builder() -> GameClientBuilder {
        GameClientBuilder::new()
    }

    /// Who this client plays as.
    pub fn local(&self) -> &LocalParticipant {
        &self.local
    }

    /// A new receiver for events published from now on.
    pub fn subscribe(&self) -> ClientEvents {
        self.events.subscribe()
    }

    /// Whether a server connection is open right now.
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Whether the client is suspended (see [`suspend`](Self::suspend)).
    pub fn is_suspended(&self) -> bool {
        self.session.is_paused()
    }

    /// Feeds pointer input from the canvas, in device pixels.
    ///
    /// # Errors
    /// - [`GameError::NotDrawingParticipant`](sketchwire_game::GameError)
    ///   unless the local participant is drawing in an active round.
    /// - [`CanvasError::EmptyCanvas`](sketchwire_canvas::CanvasError)
    ///   before the first [`resize`](Self::resize).
    /// - [`TransportError::NotConnected`](sketchwire_transport::TransportError)
    ///   before the join handshake of the current connection. The canvas
    ///   is left untouched.
    /// - Any other transport error when the point could not be queued.
    ///   The local canvas keeps the point.
    pub async fn pointer(
        &self,
        point: DevicePoint,
        phase: StrokePhase,
    ) -> Result<(), ClientError> {
        self.request(|reply| Command::Pointer {
            point,
            phase,
            reply,
        })
        .await?
    }

    /// Undoes the newest stroke. Same rules as [`pointer`](Self::pointer).
    pub async fn undo(&self) -> Result<(), ClientError> {
        self.request(|reply| Command::Undo { reply }).await?
    }

    /// Sends a chat message (or a guess).
    ///
    /// # Errors
    /// [`GameError::EmptyChatMessage`](sketchwire_game::GameError) for
    /// blank text, or a transport error.
    pub async fn chat(&self, text: impl Into<String>) -> Result<(), ClientError> {
        let text = text.into();
        self.request(|reply| Command::Chat { text, reply }).await?
    }

    /// Picks one of the words the server offered.
    pub async fn pick_word(&self, word: impl Into<String>) -> Result<(), ClientError> {
        let word = word.into();
        self.request(|reply| Command::PickWord { word, reply }).await?
    }

    /// Reports the laid-out canvas size in device pixels.
    pub async fn resize(&self, width: f32, height: f32) -> Result<(), ClientError> {
        self.request(|reply| Command::Resize {
            width,
            height,
            reply,
        })
        .await?
    }

    /// Sets the pen for local strokes started from now on.
    pub async fn set_style(&self, style: StrokeStyle) -> Result<(), ClientError> {
        self.request(|reply| Command::SetStyle { style, reply }).await
    }

    /// A copy of the current game state.
    pub async fn snapshot(&self) -> Result<GameSnapshot, ClientError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Steps away without giving up the seat, e.g. while the app is in the
    /// background: tells the server the disconnect is temporary, closes
    /// the connection and stops reconnecting until [`resume`](Self::resume).
    /// The client keeps running and its events end in `ConnectionLost`.
    pub async fn suspend(&self) -> Result<(), ClientError> {
        self.request(|reply| Command::Suspend { reply }).await
    }

    /// Reconnects after [`suspend`](Self::suspend). The server sees the
    /// same client id in the new join handshake. No-op when not suspended.
    pub async fn resume(&self) -> Result<(), ClientError> {
        self.request(|reply| Command::Resume { reply }).await
    }

    /// Leaves the room for good: tells the server, closes the session, and
    /// stops the client.
    pub async fn leave(&self) -> Result<(), ClientError> {
        self.request(|reply| Command::Leave { reply }).await
    }

    async fn request<R>(
        &self,
        command: impl FnOnce(oneshot::Sender<R>) -> Command,
    ) -> Result<R, ClientError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| ClientError::Closed)?;
        reply_rx.await.map_err(|_| ClientError::Closed)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

struct ClientActor<C: Codec> {
    core: GameCore<C>,
    session: SessionHandle,
    inbound: SessionEvents,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<ClientEvent>,
    ticker: CountdownTicker,
    /// The join handshake went out on the current connection.
    joined: bool,
}

impl<C: Codec> ClientActor<C> {
    async fn run(mut self) {
        debug!("client actor started");

        loop {
            let flow = tokio::select! {
                biased;

                inbound = self.inbound.recv() => match inbound {
                    Some(SessionEvent::Connection(event)) => {
                        self.on_connection_event(event)
                    }
                    Some(SessionEvent::Message(message)) => {
                        let dispatch = self.core.dispatch(message);
                        self.apply(dispatch)
                    }
                    None => Flow::Stop,
                },

                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => {
                        debug!("every client handle dropped");
                        Flow::Stop
                    }
                },

                tick = self.ticker.wait_for_tick() => {
                    let event = self.core.countdown_tick(tick.remaining_millis);
                    self.publish(event);
                    Flow::Continue
                }
            };

            if flow == Flow::Stop {
                break;
            }
        }

        self.ticker.cancel();
        self.session.close();
        self.publish(ClientEvent::Stopped);
        info!(participant = %self.core.session().local().name, "game client stopped");
    }

    fn on_connection_event(&mut self, event: ConnectionEvent) -> Flow {
        match event {
            ConnectionEvent::Opened => {
                let dispatch = self.core.connection_opened();
                let flow = self.apply(dispatch);
                self.joined = true;
                flow
            }
            ConnectionEvent::Closed => {
                self.joined = false;
                let dispatch = self.core.connection_lost(None);
                self.apply(dispatch)
            }
            ConnectionEvent::Failed { reason } => {
                self.joined = false;
                let dispatch = self.core.connection_lost(Some(reason));
                self.apply(dispatch)
            }
        }
    }

    fn on_command(&mut self, command: Command) -> Flow {
        match command {
            Command::Pointer {
                point,
                phase,
                reply,
            } => {
                let result = self
                    .ensure_joined()
                    .and_then(|()| self.core.pointer(point, phase))
                    .and_then(|draw| {
                        self.publish(ClientEvent::CanvasChanged);
                        self.send(Message::DrawPoint(draw))
                    });
                let _ = reply.send(result);
            }
            Command::Undo { reply } => {
                let result = self
                    .ensure_joined()
                    .and_then(|()| self.core.undo())
                    .and_then(|undo| {
                        self.publish(ClientEvent::CanvasChanged);
                        self.send(Message::DrawAction(undo))
                    });
                let _ = reply.send(result);
            }
            Command::Chat { text, reply } => {
                let result = self
                    .ensure_joined()
                    .and_then(|()| self.core.chat(&text, now_millis()))
                    .and_then(|chat| self.send(Message::Chat(chat)));
                let _ = reply.send(result);
            }
            Command::PickWord { word, reply } => {
                let result = self
                    .ensure_joined()
                    .and_then(|()| self.core.pick_word(&word))
                    .and_then(|pick| self.send(Message::SetWordToGuess(pick)));
                let _ = reply.send(result);
            }
            Command::Resize {
                width,
                height,
                reply,
            } => {
                let result = self.core.resize(width, height).map_err(Into::into);
                let _ = reply.send(result);
            }
            Command::SetStyle { style, reply } => {
                self.core.set_style(style);
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.core.snapshot());
            }
            Command::Suspend { reply } => {
                info!("suspending");
                if self.joined {
                    let _ = self.send(Message::Disconnect(DisconnectRequest::temporary()));
                }
                self.joined = false;
                self.session.pause();
                let _ = reply.send(());
            }
            Command::Resume { reply } => {
                if self.session.is_paused() {
                    info!("resuming");
                    self.session.resume();
                }
                let _ = reply.send(());
            }
            Command::Leave { reply } => {
                info!("leaving the room");
                if self.joined {
                    let _ = self.send(Message::Disconnect(DisconnectRequest::permanent()));
                }
                let _ = reply.send(());
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Carries out what the core asked for: sends, ticker, notifications.
    fn apply(&mut self, dispatch: Dispatch) -> Flow {
        for message in dispatch.outbound {
            let _ = self.send(message);
        }
        match dispatch.countdown {
            Some(CountdownCommand::Restart(millis)) => self.ticker.start(millis),
            Some(CountdownCommand::Cancel) => self.ticker.cancel(),
            Some(CountdownCommand::Keep) | None => {}
        }
        for event in dispatch.events {
            self.publish(event);
        }
        if dispatch.terminal {
            info!("server reported an application error, stopping");
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    fn ensure_joined(&self) -> Result<(), ClientError> {
        if self.joined {
            Ok(())
        } else {
            debug!("local command before join handshake");
            Err(TransportError::NotConnected.into())
        }
    }

    fn send(&self, message: Message) -> Result<(), ClientError> {
        self.session.send(message).map_err(|e| {
            debug!(error = %e, "outbound message dropped");
            ClientError::Transport(e)
        })
    }

    fn publish(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            trace!("no event subscribers");
        }
    }
}

/// Wall-clock milliseconds since the Unix epoch, for chat timestamps.
fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Actor tests driven step by step, without running its loop, over a
    //! transport whose connections never deliver anything.

    use sketchwire_game::GameError;
    use sketchwire_transport::{Connection, ConnectionId};

    use super::*;

    struct IdleConnection;

    impl Connection for IdleConnection {
        type Error = TransportError;

        async fn send(&self, _data: &[u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
            std::future::pending().await
        }

        async fn close(&self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn id(&self) -> ConnectionId {
            ConnectionId::new(1)
        }
    }

    struct IdleTransport;

    impl Transport for IdleTransport {
        type Connection = IdleConnection;
        type Error = TransportError;

        async fn connect(&self) -> Result<Self::Connection, Self::Error> {
            Ok(IdleConnection)
        }
    }

    /// An actor whose session is connected but whose `Opened` has not
    /// been handled yet.
    async fn connected_actor() -> ClientActor<JsonCodec> {
        let (session, mut inbound) =
            TransportSession::spawn(IdleTransport, JsonCodec, SessionConfig::default());
        assert_eq!(
            inbound.recv().await,
            Some(ConnectionEvent::Opened.into())
        );
        assert!(session.is_connected());

        let local = LocalParticipant {
            name: "ada".into(),
            client_id: ClientId::new("c-ada"),
            room_name: "lobby".into(),
        };
        let (_commands_tx, commands) = mpsc::channel(1);
        let (events, _) = broadcast::channel(16);
        ClientActor {
            core: GameCore::new(local, CanvasConfig::default(), JsonCodec),
            session,
            inbound,
            commands,
            events,
            ticker: CountdownTicker::new(CountdownConfig::default()),
            joined: false,
        }
    }

    async fn chat(actor: &mut ClientActor<JsonCodec>, text: &str) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        actor.on_command(Command::Chat {
            text: text.into(),
            reply,
        });
        rx.await.expect("actor should reply")
    }

    #[tokio::test]
    async fn test_game_commands_before_handshake_are_refused() {
        let mut actor = connected_actor().await;

        assert!(matches!(
            chat(&mut actor, "hi").await,
            Err(ClientError::Transport(TransportError::NotConnected))
        ));

        actor.on_connection_event(ConnectionEvent::Opened);
        assert!(chat(&mut actor, "hi").await.is_ok());
        actor.session.close();
    }

    #[tokio::test]
    async fn test_refused_pointer_leaves_canvas_untouched() {
        let mut actor = connected_actor().await;
        actor.core.resize(1000.0, 1000.0).unwrap();

        let (reply, rx) = oneshot::channel();
        actor.on_command(Command::Pointer {
            point: DevicePoint::new(10.0, 10.0),
            phase: StrokePhase::Down,
            reply,
        });

        assert!(matches!(
            rx.await.unwrap(),
            Err(ClientError::Transport(TransportError::NotConnected))
        ));
        assert!(actor.core.canvas().current_stroke().is_none());
        actor.session.close();
    }

    #[tokio::test]
    async fn test_connection_loss_revokes_join() {
        let mut actor = connected_actor().await;
        actor.on_connection_event(ConnectionEvent::Opened);

        actor.on_connection_event(ConnectionEvent::Closed);

        assert!(!actor.joined);
        assert!(matches!(
            chat(&mut actor, "hi").await,
            Err(ClientError::Transport(TransportError::NotConnected))
        ));
        // Game rules still apply once joined again.
        actor.on_connection_event(ConnectionEvent::Opened);
        assert!(matches!(
            chat(&mut actor, " ").await,
            Err(ClientError::Game(GameError::EmptyChatMessage))
        ));
        actor.session.close();
    }
}
