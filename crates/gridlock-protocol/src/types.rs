//! Wire types: the actions clients send and the events the server emits.
//!
//! Everything here is serialized with internally tagged JSON
//! (`#[serde(tag = "type")]`), so a move arrives as
//! `{ "type": "Move", "cell": 4 }`, easy to produce and branch on from a
//! browser client.

use std::fmt;

use gridlock_board::{Board, Mark};
use gridlock_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Room codes
// ---------------------------------------------------------------------------

/// A shareable room identifier.
///
/// Six characters drawn from a 32-character alphabet with the visually
/// ambiguous `0`/`O` and `1`/`I` pairs removed, since codes are read aloud
/// or retyped from another screen. Join input is normalized (trimmed,
/// uppercased) before lookup, so codes are case-insensitive on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Code length in characters.
    pub const LEN: usize = 6;

    /// The unambiguous code alphabet (32 characters).
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    /// Normalizes raw join input into lookup form: trimmed and uppercased.
    pub fn normalized(input: &str) -> Self {
        Self(input.trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Seats
// ---------------------------------------------------------------------------

/// Who holds a seat.
///
/// `Engine` is the in-process perfect-play opponent in single-player
/// rooms; it occupies a seat for turn arbitration but holds no connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Occupant {
    /// A connected participant.
    Player { id: ConnectionId },
    /// The built-in search opponent.
    Engine,
}

/// The two seats of a room, by mark.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
pub struct Seats {
    /// The seat that moves first.
    pub x: Option<Occupant>,
    /// The seat that moves second.
    pub o: Option<Occupant>,
}

impl Seats {
    /// Returns the occupant of the given mark's seat.
    pub fn seat(&self, mark: Mark) -> Option<Occupant> {
        match mark {
            Mark::X => self.x,
            Mark::O => self.o,
        }
    }

    /// Mutable access to the given mark's seat.
    pub fn seat_mut(&mut self, mark: Mark) -> &mut Option<Occupant> {
        match mark {
            Mark::X => &mut self.x,
            Mark::O => &mut self.o,
        }
    }

    /// Returns `true` if both seats are occupied.
    pub fn both_occupied(&self) -> bool {
        self.x.is_some() && self.o.is_some()
    }

    /// Returns the mark whose seat is held by the given connection.
    pub fn mark_of(&self, conn: ConnectionId) -> Option<Mark> {
        let held = |seat: Option<Occupant>| {
            matches!(seat, Some(Occupant::Player { id }) if id == conn)
        };
        if held(self.x) {
            Some(Mark::X)
        } else if held(self.o) {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// Returns the mark of the engine's seat, if one is seated.
    pub fn engine_mark(&self) -> Option<Mark> {
        if self.x == Some(Occupant::Engine) {
            Some(Mark::X)
        } else if self.o == Some(Occupant::Engine) {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// Number of seats held by connected participants (engine excluded).
    pub fn player_count(&self) -> usize {
        [self.x, self.o]
            .into_iter()
            .filter(|s| matches!(s, Some(Occupant::Player { .. })))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Inbound actions
// ---------------------------------------------------------------------------

/// An action a client sends to the server.
///
/// Disconnect has no variant; closing the socket is the signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientAction {
    /// Open a new room with the sender seated at `X`.
    ///
    /// With `solo`, the engine is seated at `O` immediately and replies
    /// to every move.
    Create {
        #[serde(default)]
        solo: bool,
    },

    /// Take a seat in an existing room. The code is matched
    /// case-insensitively after trimming.
    Join { code: String },

    /// Place the sender's mark in a cell (`0..=8`, row-major).
    Move { cell: u8 },

    /// Clear the board and hand the first move back to `X`.
    Reset,
}

// ---------------------------------------------------------------------------
// Outbound events
// ---------------------------------------------------------------------------

/// Why an action was rejected.
///
/// These are the only rejection kinds that reach the wire; they are sent
/// to the originating connection only and never mutate room state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No room exists under the given code.
    NotFound,
    /// Both seats are already occupied.
    RoomFull,
    /// The connection already holds a seat somewhere.
    AlreadyInRoom,
    /// The cell index is outside `0..=8`.
    InvalidCell,
    /// It is the other seat's turn.
    NotYourTurn,
    /// The target cell already holds a mark.
    CellOccupied,
    /// The board is already terminal.
    GameAlreadyOver,
}

/// An event the server sends to clients.
///
/// `Created`, `Joined`, `MoveAccepted`, and `Error` go to the acting
/// connection only; `RoomStatus` and `State` are broadcast to every
/// connection in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Reply to `Create`: the shareable code and the creator's mark.
    Created { code: RoomCode, mark: Mark },

    /// Reply to a successful `Join`.
    Joined { code: RoomCode, mark: Mark },

    /// Reply to a valid `Move`. The resulting position follows as a
    /// broadcast `State`.
    MoveAccepted,

    /// Seat occupancy changed: sent on create, join, and disconnect.
    RoomStatus {
        seats: Seats,
        turn: Mark,
        board: Board,
        started: bool,
    },

    /// The position after a move or reset.
    State {
        board: Board,
        turn: Mark,
        winner: Option<Mark>,
        full: bool,
        reset: bool,
    },

    /// Reply to a rejected action.
    Error { kind: ErrorKind, message: String },
}

// =========================================================================
// Tests
// =========================================================================
