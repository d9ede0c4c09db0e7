//! A single room: its roster and status.
//!
//! `Room` is plain data with synchronous transitions. It never talks to
//! the network; the [`Coordinator`](crate::Coordinator) holds the room's
//! lock, calls these, and announces the result.

use gamehall_protocol::{ConnectionId, PlayerView, RoomId, RoomStatus, ServerEvent};

use crate::{RoomConfig, RoomError};

/// A connection's participation in one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
}

/// How a successful join changed the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The connection was already listed; only its name was updated.
    Renamed,
    /// A new player was appended to the end of the roster.
    Added,
}

/// A snapshot of a room, detached from the registry lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub status: RoomStatus,
    pub players: Vec<PlayerView>,
}

impl RoomInfo {
    /// Number of players in the snapshot.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

/// Session state of one room.
///
/// The roster is kept in join order and never re-sorted. Whoever sits at
/// index 0 is the creator and the only player allowed to start the game;
/// there is no separate owner field that could drift from the list.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    status: RoomStatus,
    players: Vec<Player>,
}

impl Room {
    /// Creates an empty room in `waiting`.
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            status: RoomStatus::Waiting,
            players: Vec::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Returns `true` if `conn` is on the roster.
    pub fn contains(&self, conn: ConnectionId) -> bool {
        self.players.iter().any(|p| p.id == conn)
    }

    /// The player currently allowed to start the game.
    pub fn creator(&self) -> Option<ConnectionId> {
        self.players.first().map(|p| p.id)
    }

    /// Adds `conn` under `name`, or renames it if it is already listed.
    ///
    /// An empty `name` becomes `config.default_player_name`. Adding a
    /// player resets the status to `waiting`; renaming leaves it alone.
    ///
    /// # Errors
    /// [`RoomError::RoomFull`] if a new player would exceed
    /// `config.max_players`. The roster is unchanged in that case.
    pub fn admit(
        &mut self,
        conn: ConnectionId,
        name: &str,
        config: &RoomConfig,
    ) -> Result<Admission, RoomError> {
        let name = if name.is_empty() {
            config.default_player_name.clone()
        } else {
            name.to_string()
        };

        if let Some(player) = self.players.iter_mut().find(|p| p.id == conn) {
            player.name = name;
            return Ok(Admission::Renamed);
        }

        if self.players.len() >= config.max_players {
            return Err(RoomError::RoomFull(self.id.clone()));
        }

        self.players.push(Player { id: conn, name });
        self.status = RoomStatus::Waiting;
        Ok(Admission::Added)
    }

    /// Removes `conn` from the roster, keeping the survivors' order.
    ///
    /// Returns `true` if a player was removed, in which case the status
    /// is back to `waiting`.
    pub fn remove(&mut self, conn: ConnectionId) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.id != conn);
        let removed = self.players.len() != before;
        if removed {
            self.status = RoomStatus::Waiting;
        }
        removed
    }

    /// Moves the room to `playing`.
    ///
    /// # Errors
    /// - [`RoomError::NotCreator`] if `conn` is not at the head of the roster
    /// - [`RoomError::NotEnoughPlayers`] if fewer than
    ///   `config.min_players_to_start` players are present
    pub fn start(
        &mut self,
        conn: ConnectionId,
        config: &RoomConfig,
    ) -> Result<(), RoomError> {
        if self.creator() != Some(conn) {
            return Err(RoomError::NotCreator(conn));
        }
        if self.players.len() < config.min_players_to_start {
            return Err(RoomError::NotEnoughPlayers {
                required: config.min_players_to_start,
                present: self.players.len(),
            });
        }
        self.status = RoomStatus::Playing;
        Ok(())
    }

    /// The roster as clients see it.
    pub fn roster(&self) -> Vec<PlayerView> {
        self.players
            .iter()
            .map(|p| PlayerView {
                id: p.id,
                name: p.name.clone(),
            })
            .collect()
    }

    /// The `roomUpdate` event describing the current state.
    pub fn snapshot(&self) -> ServerEvent {
        ServerEvent::RoomUpdate {
            status: self.status,
            players: self.roster(),
        }
    }

    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.id.clone(),
            status: self.status,
            players: self.roster(),
        }
    }
}
