//! Per-room lifecycle state.

use std::fmt;

/// The lifecycle state of a room session.
///
/// ```text
/// WaitingForPlayers ⇄ InProgress → Finished
///         ↑ ______________________ ↓ (reset)
/// ```
///
/// - **WaitingForPlayers**: at least one seat is open. Moves are still
///   accepted from whoever is seated; a creator may open the board while
///   waiting for an opponent.
/// - **InProgress**: both seats occupied, board not terminal.
/// - **Finished**: the board holds a winner or is full. A reset returns
///   the room to `InProgress` (or `WaitingForPlayers` if a seat has been
///   vacated meanwhile).
///
/// The phase is bookkeeping for snapshots and logs; move legality is
/// always re-derived from the board and seats themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    WaitingForPlayers,
    InProgress,
    Finished,
}

impl GamePhase {
    /// Returns `true` once the board has reached a terminal state.
    pub fn is_over(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
