//! Connection gateway: identifiers, outbound queues, and room addressing.
//!
//! The gateway has no game semantics. It mints a [`ConnectionId`] per
//! accepted channel, keeps an unbounded outbound queue for it, remembers
//! which room the coordinator placed it in, and pushes events to one
//! connection or to every connection in a room.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use gamehall_protocol::{ConnectionId, RoomId, ServerEvent};
use gamehall_room::Outbox;
use tokio::sync::mpsc;

/// Receiving end of a connection's outbound queue, drained by its writer.
pub type OutboundReceiver = mpsc::UnboundedReceiver<ServerEvent>;

struct Peer {
    sender: mpsc::UnboundedSender<ServerEvent>,
    room: Option<RoomId>,
    /// Set once the disconnect path has started; no more deliveries.
    closing: bool,
}

impl Peer {
    fn deliver(&self, conn: ConnectionId, event: ServerEvent) {
        if self.closing {
            return;
        }
        if self.sender.send(event).is_err() {
            tracing::debug!(%conn, "outbound queue closed, event dropped");
        }
    }
}

/// Registry of live connections.
///
/// `rooms` indexes `peers` by room so a broadcast touches only the room's
/// members. Locks are always taken index first, and a `peers` guard is never
/// held while touching the index.
pub struct Gateway {
    peers: DashMap<ConnectionId, Peer>,
    rooms: DashMap<RoomId, HashSet<ConnectionId>>,
    next_id: AtomicU64,
}

impl Gateway {
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
            rooms: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a new channel with no room.
    ///
    /// Returns its identifier and the queue its writer should drain.
    pub fn accept(&self) -> (ConnectionId, OutboundReceiver) {
        let conn = ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        self.peers.insert(
            conn,
            Peer {
                sender,
                room: None,
                closing: false,
            },
        );
        tracing::debug!(%conn, "connection registered");
        (conn, receiver)
    }

    /// Marks `conn` as closing.
    ///
    /// Returns `true` only for the first call on a known connection, which
    /// is how the disconnect path runs exactly once.
    pub fn begin_close(&self, conn: ConnectionId) -> bool {
        match self.peers.get_mut(&conn) {
            Some(mut peer) if !peer.closing => {
                peer.closing = true;
                true
            }
            _ => false,
        }
    }

    /// Drops `conn` and its outbound queue.
    pub fn forget(&self, conn: ConnectionId) {
        if let Some((_, peer)) = self.peers.remove(&conn) {
            if let Some(room_id) = &peer.room {
                self.unindex(conn, room_id);
            }
            tracing::debug!(%conn, "connection forgotten");
        }
    }

    /// The room `conn` is currently associated with.
    pub fn room_of(&self, conn: ConnectionId) -> Option<RoomId> {
        self.peers.get(&conn).and_then(|peer| peer.room.clone())
    }

    pub fn connection_count(&self) -> usize {
        self.peers.len()
    }

    fn unindex(&self, conn: ConnectionId, room_id: &RoomId) {
        self.rooms.remove_if_mut(room_id, |_, members| {
            members.remove(&conn);
            members.is_empty()
        });
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}

impl Outbox for Gateway {
    fn send(&self, conn: ConnectionId, event: ServerEvent) {
        match self.peers.get(&conn) {
            Some(peer) => peer.deliver(conn, event),
            None => {
                tracing::debug!(%conn, event = event.name(), "send to unknown connection dropped");
            }
        }
    }

    fn broadcast(&self, room_id: &RoomId, event: ServerEvent) {
        let Some(members) = self.rooms.get(room_id) else {
            return;
        };
        for &conn in members.iter() {
            if let Some(peer) = self.peers.get(&conn) {
                peer.deliver(conn, event.clone());
            }
        }
    }

    fn associate(&self, conn: ConnectionId, room_id: Option<RoomId>) {
        let previous = match self.peers.get_mut(&conn) {
            Some(mut peer) => {
                if peer.room == room_id {
                    return;
                }
                std::mem::replace(&mut peer.room, room_id.clone())
            }
            None => return,
        };
        if let Some(old) = &previous {
            self.unindex(conn, old);
        }
        if let Some(new) = room_id {
            self.rooms.entry(new).or_default().insert(conn);
        }
    }
}
