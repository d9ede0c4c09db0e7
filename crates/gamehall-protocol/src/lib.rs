//! Wire protocol for gamehall.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`ConnectionId`], [`RoomId`], [`RoomStatus`],
//!   [`PlayerView`]): identities and roster entries.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): every frame on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong on the way.
//!
//! It knows nothing about sockets or room state.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Room coordinator
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use events::{ClientEvent, RelayPayload, ServerEvent};
pub use types::{ConnectionId, PlayerView, RoomId, RoomStatus};
