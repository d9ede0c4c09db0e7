//! Inbound and outbound events.
//!
//! Every frame is an adjacently tagged object:
//!
//! ```text
//! { "event": "join", "data": { "roomId": "r1", "name": "Alice" } }
//! ```
//!
//! The sender of an inbound event is never read from `data`; the gateway
//! attaches the connection it arrived on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ConnectionId, PlayerView, RoomId, RoomStatus};

// ---------------------------------------------------------------------------
// ClientEvent
// ---------------------------------------------------------------------------

/// Events a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Enter (or create) a room under a display name.
    Join {
        room_id: RoomId,
        #[serde(default)]
        name: String,
    },

    /// Ask to move the room from `waiting` to `playing`. Creator only.
    StartGame { room_id: RoomId },

    /// A move in the main game. `player_id` is accepted for compatibility
    /// with older clients but the relayed id always comes from the socket.
    PlayerChoice {
        room_id: RoomId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_id: Option<Value>,
        choice: Value,
    },

    /// Mini-game pick. Relayed with the sender stamped as `playerId`.
    #[serde(rename = "td_choice")]
    TdChoice(RelayPayload),

    #[serde(rename = "td_challenge")]
    TdChallenge(RelayPayload),

    #[serde(rename = "td_complete")]
    TdComplete(RelayPayload),

    #[serde(rename = "td_toggle")]
    TdToggle(RelayPayload),

    #[serde(rename = "td_response")]
    TdResponse(RelayPayload),
}

/// Body of an auxiliary relay event: the target room plus whatever else
/// the client sent, kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayPayload {
    pub room_id: RoomId,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl RelayPayload {
    pub fn new(room_id: RoomId, data: Map<String, Value>) -> Self {
        Self { room_id, data }
    }

    /// Splits off the room; the rest is what members receive.
    pub fn into_parts(self) -> (RoomId, Map<String, Value>) {
        (self.room_id, self.data)
    }

    /// Like [`into_parts`](Self::into_parts), with `playerId` set to the
    /// sender, replacing any id the client supplied.
    pub fn into_parts_from(self, sender: ConnectionId) -> (RoomId, Map<String, Value>) {
        let (room_id, mut data) = self.into_parts();
        data.insert("playerId".into(), Value::from(sender.into_inner()));
        (room_id, data)
    }
}

impl ClientEvent {
    /// The room this event refers to.
    pub fn room_id(&self) -> &RoomId {
        match self {
            Self::Join { room_id, .. }
            | Self::StartGame { room_id }
            | Self::PlayerChoice { room_id, .. } => room_id,
            Self::TdChoice(payload)
            | Self::TdChallenge(payload)
            | Self::TdComplete(payload)
            | Self::TdToggle(payload)
            | Self::TdResponse(payload) => &payload.room_id,
        }
    }

    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::StartGame { .. } => "startGame",
            Self::PlayerChoice { .. } => "playerChoice",
            Self::TdChoice(_) => "td_choice",
            Self::TdChallenge(_) => "td_challenge",
            Self::TdComplete(_) => "td_complete",
            Self::TdToggle(_) => "td_toggle",
            Self::TdResponse(_) => "td_response",
        }
    }
}

// ---------------------------------------------------------------------------
// ServerEvent
// ---------------------------------------------------------------------------

/// Events the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// First frame on every connection: the id this client is known by.
    Connected { id: ConnectionId },

    /// Full roster and status snapshot. Sent on every membership or
    /// status change.
    RoomUpdate {
        status: RoomStatus,
        players: Vec<PlayerView>,
    },

    /// The requested room already holds the maximum number of players.
    RoomFull {},

    /// The creator started the game.
    GameStarted {},

    /// A rejected request, addressed to the requester only.
    Error { message: String },

    /// A relayed main-game move.
    PlayerChoice { player_id: ConnectionId, choice: Value },

    /// The relayed mini-game events carry the client's payload minus
    /// `roomId`. `td_choice` also carries the sender as `playerId`.
    #[serde(rename = "td_choice")]
    TdChoice(Map<String, Value>),

    #[serde(rename = "td_challenge")]
    TdChallenge(Map<String, Value>),

    #[serde(rename = "td_complete")]
    TdComplete(Map<String, Value>),

    #[serde(rename = "td_toggle")]
    TdToggle(Map<String, Value>),

    #[serde(rename = "td_response")]
    TdResponse(Map<String, Value>),
}

impl ServerEvent {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::RoomUpdate { .. } => "roomUpdate",
            Self::RoomFull {} => "roomFull",
            Self::GameStarted {} => "gameStarted",
            Self::Error { .. } => "error",
            Self::PlayerChoice { .. } => "playerChoice",
            Self::TdChoice(_) => "td_choice",
            Self::TdChallenge(_) => "td_challenge",
            Self::TdComplete(_) => "td_complete",
            Self::TdToggle(_) => "td_toggle",
            Self::TdResponse(_) => "td_response",
        }
    }
}
