//! Unified error type for gamehall.

use gamehall_protocol::ProtocolError;
use gamehall_room::RoomError;
use gamehall_transport::TransportError;

use crate::history::HistoryError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GamehallError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A rejected room request.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The match-history store refused or failed a request.
    #[error(transparent)]
    History(#[from] HistoryError),
}
