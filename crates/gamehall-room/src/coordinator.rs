//! The room coordinator: owns the room registry and decides, for every
//! inbound event, what to change and whom to tell.
//!
//! # Locking
//!
//! Rooms live in a sharded [`DashMap`]. Every read-modify-write of a room
//! runs under that room's entry guard, and the `roomUpdate` announcing the
//! change is enqueued before the guard drops, so members see snapshots in
//! the order they were taken. Events for different rooms only contend when
//! their keys share a shard, and the [`Outbox`] never blocks.
//!
//! The coordinator never holds two room guards at once.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use gamehall_protocol::{ClientEvent, ConnectionId, RoomId, ServerEvent};

use crate::room::{Admission, RoomInfo};
use crate::{Outbox, Room, RoomConfig, RoomError};

/// Owns all room state and implements the join/start/play/leave flow.
///
/// A room is in the registry if and only if it has at least one player:
/// it is created by the first successful join to an unseen id and removed
/// the moment its roster empties.
pub struct Coordinator<O: Outbox> {
    rooms: DashMap<RoomId, Room>,
    outbox: O,
    config: RoomConfig,
}

impl<O: Outbox> Coordinator<O> {
    /// Creates a coordinator with the default [`RoomConfig`].
    pub fn new(outbox: O) -> Self {
        Self::with_config(outbox, RoomConfig::default())
    }

    pub fn with_config(outbox: O, config: RoomConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            outbox,
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    /// Dispatches one inbound event from `conn`.
    ///
    /// Rejections are answered to the requester only: `roomFull` for a
    /// full room, `error{message}` for authority and precondition
    /// failures. Events naming a room that doesn't exist are dropped.
    pub fn handle(&self, conn: ConnectionId, event: ClientEvent) {
        let result = match event {
            ClientEvent::Join { room_id, name } => {
                self.join(conn, room_id, &name)
            }
            ClientEvent::StartGame { room_id } => {
                self.start_game(conn, &room_id)
            }
            ClientEvent::PlayerChoice {
                room_id, choice, ..
            } => self.relay(
                conn,
                &room_id,
                ServerEvent::PlayerChoice {
                    player_id: conn,
                    choice,
                },
            ),
            ClientEvent::TdChoice(payload) => {
                let (room_id, data) = payload.into_parts_from(conn);
                self.relay(conn, &room_id, ServerEvent::TdChoice(data))
            }
            ClientEvent::TdChallenge(payload) => {
                let (room_id, data) = payload.into_parts();
                self.relay(conn, &room_id, ServerEvent::TdChallenge(data))
            }
            ClientEvent::TdComplete(payload) => {
                let (room_id, data) = payload.into_parts();
                self.relay(conn, &room_id, ServerEvent::TdComplete(data))
            }
            ClientEvent::TdToggle(payload) => {
                let (room_id, data) = payload.into_parts();
                self.relay(conn, &room_id, ServerEvent::TdToggle(data))
            }
            ClientEvent::TdResponse(payload) => {
                let (room_id, data) = payload.into_parts();
                self.relay(conn, &room_id, ServerEvent::TdResponse(data))
            }
        };

        if let Err(e) = result {
            self.reject(conn, e);
        }
    }

    /// Adds `conn` to `room_id` under `name`, creating the room if needed.
    ///
    /// A connection already on the roster is renamed in place and the
    /// snapshot goes to it directly and then to the whole room. A
    /// connection sitting in a different room leaves that room first.
    ///
    /// # Errors
    /// [`RoomError::RoomFull`] if the room already holds
    /// `config.max_players` other players.
    pub fn join(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
        name: &str,
    ) -> Result<(), RoomError> {
        let previous: Vec<RoomId> = self
            .rooms_of(conn)
            .into_iter()
            .filter(|r| *r != room_id)
            .collect();
        if !previous.is_empty() {
            self.outbox.associate(conn, None);
            for old in &previous {
                self.leave(conn, old);
            }
        }

        // A room only enters the registry once its first player is on the
        // roster, so no reader ever sees it empty.
        let (room, admission) = match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(entry) => {
                let mut room = entry.into_ref();
                let admission = room.admit(conn, name, &self.config)?;
                (room, admission)
            }
            Entry::Vacant(entry) => {
                let mut fresh = Room::new(room_id.clone());
                let admission = fresh.admit(conn, name, &self.config)?;
                tracing::info!(%room_id, "room created");
                (entry.insert(fresh), admission)
            }
        };

        self.outbox.associate(conn, Some(room_id.clone()));
        match admission {
            Admission::Renamed => {
                tracing::debug!(%conn, %room_id, "player renamed");
                let update = room.snapshot();
                self.outbox.send(conn, update.clone());
                self.outbox.broadcast(&room_id, update);
            }
            Admission::Added => {
                tracing::info!(
                    %conn,
                    %room_id,
                    players = room.len(),
                    "player joined"
                );
                self.outbox.broadcast(&room_id, room.snapshot());
            }
        }
        Ok(())
    }

    /// Moves `room_id` to `playing` on behalf of its creator.
    ///
    /// On success every member gets `gameStarted` followed by the updated
    /// `roomUpdate`.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if the room doesn't exist
    /// - [`RoomError::NotCreator`] if `conn` is not first on the roster
    /// - [`RoomError::NotEnoughPlayers`] below the configured minimum
    pub fn start_game(
        &self,
        conn: ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), RoomError> {
        let mut room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        room.start(conn, &self.config)?;
        tracing::info!(%room_id, players = room.len(), "game started");

        self.outbox.broadcast(room_id, ServerEvent::GameStarted {});
        self.outbox.broadcast(room_id, room.snapshot());
        Ok(())
    }

    /// Broadcasts a relay event to every member of `room_id`, the sender
    /// included. Nothing about the room changes and the sender's
    /// membership is not checked.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if the room doesn't exist.
    pub fn relay(
        &self,
        conn: ConnectionId,
        room_id: &RoomId,
        event: ServerEvent,
    ) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        tracing::trace!(%conn, %room_id, event = event.name(), "relaying");
        self.outbox.broadcast(room.id(), event);
        Ok(())
    }

    /// Removes `conn` from every room it is in.
    ///
    /// Rooms left empty are deleted without a broadcast; the others revert
    /// to `waiting` and get a fresh `roomUpdate`. Calling this again for
    /// the same connection does nothing.
    pub fn disconnect(&self, conn: ConnectionId) {
        let rooms = self.rooms_of(conn);
        if rooms.is_empty() {
            tracing::debug!(%conn, "disconnect: not in any room");
            return;
        }

        self.outbox.associate(conn, None);
        for room_id in &rooms {
            self.leave(conn, room_id);
        }
    }

    /// Returns a snapshot of one room.
    pub fn room(&self, room_id: &RoomId) -> Option<RoomInfo> {
        self.rooms.get(room_id).map(|room| room.info())
    }

    /// Number of rooms in the registry.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Ids of every room listing `conn` on its roster.
    pub fn rooms_of(&self, conn: ConnectionId) -> Vec<RoomId> {
        self.rooms
            .iter()
            .filter(|entry| entry.value().contains(conn))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Takes `conn` off the roster of `room_id`. The room is deleted in
    /// the same locked step that empties it.
    fn leave(&self, conn: ConnectionId, room_id: &RoomId) {
        let deleted = self.rooms.remove_if_mut(room_id, |_, room| {
            if !room.remove(conn) {
                return false;
            }
            tracing::info!(
                %conn,
                %room_id,
                players = room.len(),
                "player left"
            );
            if room.is_empty() {
                return true;
            }
            self.outbox.broadcast(room_id, room.snapshot());
            false
        });

        if deleted.is_some() {
            tracing::info!(%room_id, "room deleted");
        }
    }

    fn reject(&self, conn: ConnectionId, err: RoomError) {
        match err {
            RoomError::NotFound(room_id) => {
                tracing::debug!(%conn, %room_id, "ignoring event for unknown room");
            }
            RoomError::RoomFull(room_id) => {
                tracing::debug!(%conn, %room_id, "join rejected: room full");
                self.outbox.send(conn, ServerEvent::RoomFull {});
            }
            err @ (RoomError::NotCreator(_)
            | RoomError::NotEnoughPlayers { .. }) => {
                tracing::debug!(%conn, error = %err, "start rejected");
                self.outbox.send(
                    conn,
                    ServerEvent::Error {
                        message: err.to_string(),
                    },
                );
            }
        }
    }
}
