//! Transport abstraction layer for gamehall.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the persistent, ordered, server-push channel a client talks through.
//! Nothing here knows about rooms or events; a connection only moves frames.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

/// Accepts new incoming connections.
///
/// Dropping the transport closes the listener. Connections already
/// accepted stay open.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that can send and receive frames.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a binary frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Sends a text frame to the remote peer.
    ///
    /// Defaults to a binary send of the UTF-8 bytes. Transports with a
    /// distinct text frame type (WebSocket) should override this.
    async fn send_text(&self, text: &str) -> Result<(), Self::Error> {
        self.send(text.as_bytes()).await
    }

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;
}
