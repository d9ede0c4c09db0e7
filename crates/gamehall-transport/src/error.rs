/// Errors that can occur in the transport layer.
///
/// Each variant wraps the underlying I/O error; WebSocket protocol errors
/// are folded into an `io::Error` with a matching kind.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Writing a frame to the peer failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading a frame from the peer failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding, accepting, or the WebSocket upgrade failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}
