//! Unified error type for the Gridlock server.

use gridlock_protocol::ProtocolError;
use gridlock_room::RoomError;
use gridlock_transport::TransportError;

/// Top-level error that wraps all layer-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls,
/// so `?` converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GridlockError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, illegal move).
    #[error(transparent)]
    Room(#[from] RoomError),
}
