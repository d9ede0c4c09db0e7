//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into an event).
    ///
    /// Common causes: malformed JSON, an unknown `event` name, or a
    /// missing required field in `data`.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but can't be used as-is, e.g. a text codec
    /// produced bytes that aren't valid UTF-8.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
