//! Error types for the room layer.

use gamehall_protocol::{ConnectionId, RoomId};

/// A rejected room request.
///
/// None of these are transient: the coordinator answers the requester (or
/// drops the event) and the room is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The room already holds the maximum number of players.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// Someone other than the player at the head of the roster asked to
    /// start the game.
    #[error("only the room creator can start the game")]
    NotCreator(ConnectionId),

    /// The creator asked to start with too few players present.
    #[error("at least {required} players are needed to start")]
    NotEnoughPlayers { required: usize, present: usize },

    /// No room with this identifier exists (it may just have emptied).
    #[error("room {0} not found")]
    NotFound(RoomId),
}
