//! # Gamehall
//!
//! Real-time room coordination for small turn-based browser games.
//!
//! Clients connect over WebSocket, join a named room of up to four
//! players, and the room's creator starts the game. From then on the
//! server relays every move and mini-game event to the whole room and
//! cleans up when players leave.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gamehall::prelude::*;
//!
//! # async fn start() -> Result<(), GamehallError> {
//! let server = GamehallServer::builder()
//!     .bind("0.0.0.0:3001")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod gateway;
mod handler;
pub mod history;
mod server;

pub use error::GamehallError;
pub use gateway::{Gateway, OutboundReceiver};
pub use server::{
    DEFAULT_BIND_ADDR, DEFAULT_IDLE_TIMEOUT, GamehallServer, GamehallServerBuilder,
};

pub mod prelude {
    pub use crate::history::{InMemoryMatchStore, MatchQuery, MatchStore, NewMatch};
    pub use crate::{GamehallError, GamehallServer, GamehallServerBuilder, Gateway};
    pub use gamehall_protocol::{ClientEvent, ConnectionId, RoomId, RoomStatus, ServerEvent};
    pub use gamehall_room::{Coordinator, Outbox, RoomConfig};
}
