/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Dialing the server failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A message was handed to the session while no connection was open.
    /// The message is dropped, not buffered for the next connection.
    #[error("not connected")]
    NotConnected,

    /// The outbound queue is at capacity. The message is dropped.
    #[error("outbound queue full")]
    QueueFull,

    /// The session was closed and will not reconnect.
    #[error("transport shut down")]
    Shutdown,
}
