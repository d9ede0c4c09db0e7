//! `GamehallServer` builder and server loop.
//!
//! This is the entry point for running a gamehall server. It ties the
//! layers together: transport → protocol → gateway → room coordinator.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gamehall_protocol::{Codec, ConnectionId, JsonCodec};
use gamehall_room::{Coordinator, RoomConfig};
use gamehall_transport::{Transport, WebSocketTransport};

use crate::GamehallError;
use crate::gateway::Gateway;
use crate::handler::handle_connection;

/// Address used when the builder is not given one.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";

/// How long a connection may stay silent before it is treated as closed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) gateway: Arc<Gateway>,
    pub(crate) coordinator: Coordinator<Arc<Gateway>>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

impl<C: Codec> ServerState<C> {
    /// Takes `conn` out of its rooms and forgets it. Runs once per
    /// connection no matter how often it is called.
    pub(crate) fn disconnect(&self, conn: ConnectionId) {
        if self.gateway.begin_close(conn) {
            let room = self.gateway.room_of(conn);
            self.coordinator.disconnect(conn);
            self.gateway.forget(conn);
            tracing::debug!(%conn, room = ?room, "connection disconnected");
        }
    }
}

/// Builder for configuring and starting a gamehall server.
///
/// # Example
///
/// ```rust,no_run
/// use gamehall::prelude::*;
///
/// # async fn start() -> Result<(), GamehallError> {
/// let server = GamehallServer::builder()
///     .bind("0.0.0.0:3001")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GamehallServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    idle_timeout: Duration,
}

impl GamehallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            room_config: RoomConfig::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Sets the address to bind the server to. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Binds the listener and assembles the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<GamehallServer<JsonCodec>, GamehallError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let gateway = Arc::new(Gateway::new());
        let state = Arc::new(ServerState {
            coordinator: Coordinator::with_config(Arc::clone(&gateway), self.room_config),
            gateway,
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(GamehallServer { transport, state })
    }
}

impl Default for GamehallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound gamehall server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GamehallServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl GamehallServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> GamehallServerBuilder {
        GamehallServerBuilder::new()
    }
}

impl<C: Codec> GamehallServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.state.gateway
    }

    pub fn coordinator(&self) -> &Coordinator<Arc<Gateway>> {
        &self.state.coordinator
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task per accepted connection. A failed accept or
    /// upgrade is logged and the loop carries on. Runs until the future is
    /// dropped.
    pub async fn run(mut self) -> Result<(), GamehallError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "gamehall server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
