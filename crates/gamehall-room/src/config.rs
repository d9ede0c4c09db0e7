//! Room configuration.

use serde::{Deserialize, Serialize};

/// Limits and defaults applied to every room.
///
/// The server builder takes one of these; tests tweak individual fields
/// with struct update syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum players a room holds. Joins beyond this get `roomFull`.
    pub max_players: usize,

    /// Minimum players present before the creator may start the game.
    pub min_players_to_start: usize,

    /// Display name given to players who join with an empty name.
    pub default_player_name: String,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 4,
            min_players_to_start: 2,
            default_player_name: "Player".to_string(),
        }
    }
}
