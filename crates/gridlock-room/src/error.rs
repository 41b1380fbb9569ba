//! Error types for the room layer.

use gridlock_protocol::{ErrorKind, RoomCode};
use gridlock_transport::ConnectionId;

/// Errors that can occur during room operations.
///
/// Every variant is a recoverable, local rejection: nothing here mutates
/// room state, and nothing is broadcast. Variants with a wire form map to
/// an [`ErrorKind`] via [`kind`](Self::kind); the rest are swallowed by
/// the transport adapter.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room exists under the given code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// Both seats are occupied.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The connection already holds a seat in some room.
    #[error("{0} is already in room {1}")]
    AlreadyInRoom(ConnectionId, RoomCode),

    /// The connection is not associated with any room.
    #[error("{0} is not in any room")]
    UnknownRoom(ConnectionId),

    /// The connection holds no seat in the room it addressed.
    #[error("{0} holds no seat in room {1}")]
    NotSeated(ConnectionId, RoomCode),

    /// The cell index is outside the board.
    #[error("cell index {0} is out of range")]
    InvalidCell(usize),

    /// It is the other seat's turn.
    #[error("not your turn")]
    NotYourTurn,

    /// The target cell already holds a mark.
    #[error("cell {0} is already occupied")]
    CellOccupied(usize),

    /// The board is already terminal.
    #[error("game is already over")]
    GameAlreadyOver,

    /// The room's command channel is closed (actor gone).
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// The wire-visible rejection kind, if this error has one.
    ///
    /// `None` means the action is silently ignored: moves and resets from
    /// roomless or unseated connections get no reply, per the protocol
    /// table, and a closed actor channel only means the room raced its
    /// own destruction.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::NotFound(_) => Some(ErrorKind::NotFound),
            Self::RoomFull(_) => Some(ErrorKind::RoomFull),
            Self::AlreadyInRoom(..) => Some(ErrorKind::AlreadyInRoom),
            Self::InvalidCell(_) => Some(ErrorKind::InvalidCell),
            Self::NotYourTurn => Some(ErrorKind::NotYourTurn),
            Self::CellOccupied(_) => Some(ErrorKind::CellOccupied),
            Self::GameAlreadyOver => Some(ErrorKind::GameAlreadyOver),
            Self::UnknownRoom(_)
            | Self::NotSeated(..)
            | Self::Unavailable(_) => None,
        }
    }
}
