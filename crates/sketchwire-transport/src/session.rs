//! Reconnecting message session.
//!
//! [`TransportSession`] owns one logical conversation with the server. It
//! runs as its own Tokio task (the "actor"), dials through a [`Transport`],
//! decodes inbound frames with a [`Codec`], and hands the rest of the
//! client one ordered stream of [`SessionEvent`]s: connection changes
//! ([`ConnectionEvent`]) interleaved with decoded [`Message`]s.
//!
//! ```text
//!            ┌──────────── SessionActor task ─────────────┐
//! handle ──► │ outbound queue ─► encode ─► Connection::send│
//!            │ Connection::recv ─► decode ─┐               │
//!            │ connect / drop / backoff ───┴─► inbound     │──► consumer
//!            └─────────────────────────────────────────────┘
//! ```
//!
//! Everything a connection delivered is queued before its `Closed`, and
//! nothing from the next connection is queued before its `Opened`.
//!
//! ## Reconnect policy
//!
//! Linear: after any drop or failed dial the actor sleeps a fixed
//! `reconnect_interval` and dials again, forever, until
//! [`SessionHandle::close`] is called. Consumers never see the retry loop,
//! only the resulting `Closed` / `Failed` / `Opened` events.
//!
//! [`SessionHandle::pause`] closes the open connection (after flushing the
//! outbound queue) and holds off dialing until [`SessionHandle::resume`].
//!
//! ## Outbound while disconnected
//!
//! [`SessionHandle::send`] refuses messages while no connection is open,
//! and anything still queued when a connection drops is discarded. The
//! game server rebuilds client state on rejoin, so replaying stale input
//! would do more harm than good.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sketchwire_protocol::{Codec, Message};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::{Connection, Transport, TransportError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for a [`TransportSession`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause between a drop (or failed dial) and the next dial.
    ///
    /// Default: 3 seconds.
    pub reconnect_interval: Duration,
    /// Capacity of the outbound queue feeding the connection.
    ///
    /// Default: 64.
    pub outbound_capacity: usize,
    /// Capacity of the inbound [`SessionEvent`] stream.
    ///
    /// Default: 256.
    pub inbound_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_interval: Duration::from_millis(3000),
            outbound_capacity: 64,
            inbound_capacity: 256,
        }
    }
}

impl SessionConfig {
    /// Shortest reconnect pause we accept. Dialing in a hot loop against a
    /// server that refuses us helps nobody.
    pub const MIN_RECONNECT_INTERVAL: Duration = Duration::from_millis(10);

    /// Clamp any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TransportSession::spawn`]. Rules:
    /// - `reconnect_interval` at least [`Self::MIN_RECONNECT_INTERVAL`].
    /// - Both capacities at least 1 (Tokio panics on a zero-capacity
    ///   bounded channel).
    pub fn validated(mut self) -> Self {
        if self.reconnect_interval < Self::MIN_RECONNECT_INTERVAL {
            warn!(
                interval_ms = self.reconnect_interval.as_millis() as u64,
                "reconnect_interval below minimum, clamping"
            );
            self.reconnect_interval = Self::MIN_RECONNECT_INTERVAL;
        }
        if self.outbound_capacity == 0 {
            warn!("outbound_capacity is 0, using 1");
            self.outbound_capacity = 1;
        }
        if self.inbound_capacity == 0 {
            warn!("inbound_capacity is 0, using 1");
            self.inbound_capacity = 1;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Public surface
// ---------------------------------------------------------------------------

/// Connection lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection is open; sends are accepted from now on.
    Opened,
    /// The open connection ended (server close, I/O error,
    /// [`SessionHandle::pause`] or [`SessionHandle::close`]).
    Closed,
    /// A dial attempt failed. Another one follows after the backoff.
    Failed { reason: String },
}

/// One item of a session's inbound stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connection(ConnectionEvent),
    /// A decoded frame from the currently open connection.
    Message(Message),
}

impl From<ConnectionEvent> for SessionEvent {
    fn from(event: ConnectionEvent) -> Self {
        Self::Connection(event)
    }
}

impl From<Message> for SessionEvent {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

/// The receiving end a session hands back from [`TransportSession::spawn`].
/// Ends (returns `None`) once the session is closed.
pub type SessionEvents = mpsc::Receiver<SessionEvent>;

/// What the handle asks of the session actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Run,
    Pause,
    Shutdown,
}

/// Handle to a running session. Cheap to clone.
///
/// Dropping every handle has the same effect as calling
/// [`SessionHandle::close`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    outbound: mpsc::Sender<Message>,
    connected: Arc<AtomicBool>,
    control: Arc<watch::Sender<Control>>,
}

impl SessionHandle {
    /// Queues a message for the current connection. Fire-and-forget: a
    /// successful return means "queued", not "delivered".
    ///
    /// # Errors
    /// - [`TransportError::NotConnected`] when no connection is open.
    /// - [`TransportError::QueueFull`] when the outbound queue is full.
    /// - [`TransportError::Shutdown`] after the session stopped.
    ///
    /// In every error case the message is dropped.
    pub fn send(&self, message: Message) -> Result<(), TransportError> {
        if !self.is_connected() {
            debug!(
                type_name = message.type_name(),
                "dropping outbound message while disconnected"
            );
            return Err(TransportError::NotConnected);
        }
        self.outbound.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(message) => {
                warn!(
                    type_name = message.type_name(),
                    "outbound queue full, dropping message"
                );
                TransportError::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => TransportError::Shutdown,
        })
    }

    /// Whether a connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Closes the open connection (flushing queued messages first) and
    /// stops dialing until [`Self::resume`]. The session itself stays
    /// alive. No-op after [`Self::close`].
    pub fn pause(&self) {
        self.control.send_if_modified(|control| {
            if *control == Control::Run {
                *control = Control::Pause;
                true
            } else {
                false
            }
        });
    }

    /// Dials again after [`Self::pause`]. No-op unless paused.
    pub fn resume(&self) {
        self.control.send_if_modified(|control| {
            if *control == Control::Pause {
                *control = Control::Run;
                true
            } else {
                false
            }
        });
    }

    /// Whether the session is paused.
    pub fn is_paused(&self) -> bool {
        *self.control.borrow() == Control::Pause
    }

    /// Stops the session: messages already queued are flushed, the open
    /// connection (if any) is closed, no further reconnects happen, and
    /// the inbound stream ends.
    pub fn close(&self) {
        self.control.send_replace(Control::Shutdown);
    }
}

/// Entry point for starting a session.
pub struct TransportSession;

impl TransportSession {
    /// Spawns the session actor on the current Tokio runtime and returns
    /// its handle and inbound stream. The first dial happens immediately.
    pub fn spawn<T, C>(
        transport: T,
        codec: C,
        config: SessionConfig,
    ) -> (SessionHandle, SessionEvents)
    where
        T: Transport,
        C: Codec,
    {
        let config = config.validated();
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity);
        let (control_tx, control_rx) = watch::channel(Control::Run);
        let connected = Arc::new(AtomicBool::new(false));

        let actor = SessionActor {
            transport,
            codec,
            config,
            outbound: outbound_rx,
            inbound: inbound_tx,
            connected: Arc::clone(&connected),
            control: control_rx,
        };
        tokio::spawn(actor.run());

        let handle = SessionHandle {
            outbound: outbound_tx,
            connected,
            control: Arc::new(control_tx),
        };
        (handle, inbound_rx)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Why [`SessionActor::drive`] returned.
enum DriveEnd {
    /// The connection dropped; reconnect after the backoff.
    Dropped,
    /// Paused by the handle; wait for a resume before dialing.
    Paused,
    /// The session is shutting down.
    Shutdown,
}

struct SessionActor<T: Transport, C: Codec> {
    transport: T,
    codec: C,
    config: SessionConfig,
    outbound: mpsc::Receiver<Message>,
    inbound: mpsc::Sender<SessionEvent>,
    connected: Arc<AtomicBool>,
    control: watch::Receiver<Control>,
}

impl<T: Transport, C: Codec> SessionActor<T, C> {
    async fn run(mut self) {
        info!("transport session started");

        loop {
            if !running(&mut self.control).await {
                break;
            }

            let dialed = tokio::select! {
                result = self.transport.connect() => result,
                control = interrupted(&mut self.control) => match control {
                    Control::Pause => continue,
                    _ => break,
                },
            };

            match dialed {
                Ok(conn) => {
                    let id = conn.id();
                    self.connected.store(true, Ordering::Release);
                    info!(%id, "connection opened");
                    self.emit(ConnectionEvent::Opened).await;

                    let end = self.drive(&conn).await;

                    self.connected.store(false, Ordering::Release);
                    if let Err(e) = conn.close().await {
                        debug!(%id, error = %e, "close after drop failed");
                    }
                    self.discard_stale_outbound();
                    info!(%id, "connection closed");
                    self.emit(ConnectionEvent::Closed).await;

                    match end {
                        DriveEnd::Shutdown => break,
                        DriveEnd::Paused => {
                            info!(%id, "session paused");
                            continue;
                        }
                        DriveEnd::Dropped => {}
                    }
                }
                Err(e) => {
                    warn!(error = %e, "connect failed");
                    self.emit(ConnectionEvent::Failed {
                        reason: e.to_string(),
                    })
                    .await;
                }
            }

            debug!(
                interval_ms = self.config.reconnect_interval.as_millis() as u64,
                "reconnecting after backoff"
            );
            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_interval) => {}
                control = interrupted(&mut self.control) => match control {
                    Control::Pause => continue,
                    _ => break,
                },
            }
        }

        self.connected.store(false, Ordering::Release);
        info!("transport session stopped");
    }

    /// Pumps frames both ways until the connection ends.
    async fn drive(&mut self, conn: &T::Connection) -> DriveEnd {
        loop {
            tokio::select! {
                control = interrupted(&mut self.control) => {
                    self.flush_outbound(conn).await;
                    return match control {
                        Control::Pause => DriveEnd::Paused,
                        _ => DriveEnd::Shutdown,
                    };
                }

                outbound = self.outbound.recv() => {
                    let Some(message) = outbound else {
                        return DriveEnd::Shutdown;
                    };
                    if !send_one(&self.codec, conn, &message).await {
                        return DriveEnd::Dropped;
                    }
                }

                inbound = conn.recv() => match inbound {
                    Ok(Some(bytes)) => match self.codec.decode(&bytes) {
                        Ok(message) => self.forward(message.into()).await,
                        Err(e) => {
                            warn!(error = %e, "dropping undecodable frame");
                        }
                    },
                    Ok(None) => {
                        info!(id = %conn.id(), "server closed the connection");
                        return DriveEnd::Dropped;
                    }
                    Err(e) => {
                        warn!(id = %conn.id(), error = %e, "receive failed");
                        return DriveEnd::Dropped;
                    }
                },
            }
        }
    }

    /// Sends whatever is still queued before a requested pause or
    /// shutdown, so a farewell message queued right before
    /// [`SessionHandle::close`] still goes out.
    async fn flush_outbound(&mut self, conn: &T::Connection) {
        let mut flushed = 0usize;
        while let Ok(message) = self.outbound.try_recv() {
            if !send_one(&self.codec, conn, &message).await {
                break;
            }
            flushed += 1;
        }
        if flushed > 0 {
            debug!(flushed, "flushed outbound queue before shutdown");
        }
    }

    /// Empties the outbound queue after a drop.
    fn discard_stale_outbound(&mut self) {
        let mut discarded = 0usize;
        while self.outbound.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "discarded outbound messages from dropped connection");
        }
    }

    async fn emit(&self, event: ConnectionEvent) {
        self.forward(event.into()).await;
    }

    async fn forward(&self, event: SessionEvent) {
        if self.inbound.send(event).await.is_err() {
            debug!("inbound stream dropped by consumer");
        }
    }
}

/// Encodes and sends one message. Returns `false` when the connection
/// failed; an unencodable message is logged and skipped.
async fn send_one<C: Codec, K: Connection>(
    codec: &C,
    conn: &K,
    message: &Message,
) -> bool {
    let bytes = match codec.encode(message) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                type_name = message.type_name(),
                error = %e,
                "dropping unencodable message"
            );
            return true;
        }
    };
    if let Err(e) = conn.send(&bytes).await {
        warn!(id = %conn.id(), error = %e, "send failed");
        return false;
    }
    true
}

/// Waits out a pause. `false` once the session must stop: after
/// [`SessionHandle::close`] or when every handle is dropped.
async fn running(control: &mut watch::Receiver<Control>) -> bool {
    loop {
        match *control.borrow_and_update() {
            Control::Run => return true,
            Control::Shutdown => return false,
            Control::Pause => {}
        }
        if control.changed().await.is_err() {
            return false;
        }
    }
}

/// Resolves with the new control value once the handle asks for anything
/// but [`Control::Run`]. Dropping every handle counts as shutdown.
async fn interrupted(control: &mut watch::Receiver<Control>) -> Control {
    loop {
        let current = *control.borrow_and_update();
        if current != Control::Run {
            return current;
        }
        if control.changed().await.is_err() {
            return Control::Shutdown;
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
