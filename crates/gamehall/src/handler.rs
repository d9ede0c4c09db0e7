//! Per-connection handler: greeting, event loop, and disconnect.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register with the gateway and send `connected{id}`
//!   2. Spawn a writer that drains the connection's outbound queue
//!   3. Loop: receive frames, decode events, hand them to the coordinator
//!   4. On close, error, or idle timeout: leave every room exactly once

use std::sync::Arc;

use gamehall_protocol::{ClientEvent, Codec, ConnectionId, ProtocolError, ServerEvent};
use gamehall_room::Outbox;
use gamehall_transport::{Connection, WebSocketConnection};

use crate::GamehallError;
use crate::server::ServerState;

/// Drop guard that runs the disconnect path when the handler exits.
///
/// Fires even if the handler panics or returns early with `?`.
struct DisconnectGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        self.state.disconnect(self.conn_id);
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), GamehallError> {
    let conn = Arc::new(conn);
    let (conn_id, mut outbound) = state.gateway.accept();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };
    state.gateway.send(conn_id, ServerEvent::Connected { id: conn_id });

    let writer = tokio::spawn({
        let conn = Arc::clone(&conn);
        let state = Arc::clone(&state);
        async move {
            while let Some(event) = outbound.recv().await {
                if let Err(e) = write_event(&*conn, &state.codec, &event).await {
                    tracing::debug!(%conn_id, error = %e, "write failed");
                    break;
                }
            }
        }
    });

    let result = read_loop(&conn, &state, conn_id).await;

    // Leaving rooms drops the outbound sender, so the writer flushes what
    // is queued and stops.
    drop(guard);
    if let Err(e) = writer.await {
        tracing::debug!(%conn_id, error = %e, "writer task failed");
    }
    if let Err(e) = conn.close().await {
        tracing::trace!(%conn_id, error = %e, "close after disconnect");
    }
    result
}

async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    conn_id: ConnectionId,
) -> Result<(), GamehallError> {
    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                return Ok(());
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                return Err(e.into());
            }
            Err(_) => {
                tracing::info!(%conn_id, "connection timed out");
                return Ok(());
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode event");
                continue;
            }
        };

        tracing::trace!(
            %conn_id,
            event = event.name(),
            room_id = %event.room_id(),
            "event received"
        );
        state.coordinator.handle(conn_id, event);
    }
}

async fn write_event<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    event: &ServerEvent,
) -> Result<(), GamehallError> {
    let bytes = codec.encode(event)?;
    if codec.is_text() {
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| ProtocolError::InvalidMessage(e.to_string()))?;
        conn.send_text(text).await?;
    } else {
        conn.send(&bytes).await?;
    }
    Ok(())
}
