//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
///
/// Wrapping the `serde_json` errors keeps callers on a single error type
/// regardless of which codec produced the failure.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or an
    /// unknown action tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
