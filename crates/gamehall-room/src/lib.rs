//! Room coordination for gamehall.
//!
//! Tracks which connections sit in which room, gates game start to the
//! room's creator, relays moves, and cleans up when players leave.
//!
//! # Key types
//!
//! - [`Coordinator`]: owns the room registry and handles every inbound event
//! - [`Room`]: one room's ordered roster and status
//! - [`Outbox`]: the push primitive the coordinator delivers through
//! - [`RoomConfig`]: capacity and start threshold
//! - [`RoomError`]: rejected requests

mod config;
mod coordinator;
mod error;
mod outbox;
mod room;

pub use config::RoomConfig;
pub use coordinator::Coordinator;
pub use error::RoomError;
pub use outbox::Outbox;
pub use room::{Admission, Player, Room, RoomInfo};
