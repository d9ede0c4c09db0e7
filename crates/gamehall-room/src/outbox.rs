//! The push primitive the coordinator delivers events through.

use std::sync::Arc;

use gamehall_protocol::{ConnectionId, RoomId, ServerEvent};

/// Outbound side of the connection gateway, as seen by the coordinator.
///
/// Implementations must only enqueue: the coordinator calls these while it
/// holds a room's lock, so a method that waits on a slow client would stall
/// that room. Delivery to a connection that is gone is dropped silently.
pub trait Outbox: Send + Sync + 'static {
    /// Pushes one event to exactly one connection.
    fn send(&self, conn: ConnectionId, event: ServerEvent);

    /// Pushes one event to every connection associated with `room_id`.
    /// A no-op if no connection is.
    fn broadcast(&self, room_id: &RoomId, event: ServerEvent);

    /// Records which room `conn` currently belongs to (`None` for no room).
    fn associate(&self, conn: ConnectionId, room_id: Option<RoomId>);
}

impl<T: Outbox + ?Sized> Outbox for Arc<T> {
    fn send(&self, conn: ConnectionId, event: ServerEvent) {
        (**self).send(conn, event);
    }

    fn broadcast(&self, room_id: &RoomId, event: ServerEvent) {
        (**self).broadcast(room_id, event);
    }

    fn associate(&self, conn: ConnectionId, room_id: Option<RoomId>) {
        (**self).associate(conn, room_id);
    }
}
