//! The 9-cell board and terminal-state detection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two player symbols.
///
/// `X` always moves first, and marks alternate strictly, so a legal board
/// never holds more `X` cells than `O` cells plus one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::O => write!(f, "O"),
        }
    }
}

/// The 8 winning triples: 3 rows, 3 columns, 2 diagonals.
///
/// Scanned in this fixed order so winner detection is deterministic.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A tic-tac-toe board: 9 cells indexed 0..9, row-major.
///
/// This is a newtype over `[Option<Mark>; 9]` and is `Copy`, so a board
/// passed by value is always an independent snapshot: the search engine
/// simulates on copies and can never alias a room's authoritative board.
///
/// `#[serde(transparent)]` keeps the wire form a plain 9-element array of
/// `null` / `"X"` / `"O"`.
///
/// Callers guarantee indices are in range and marks alternate; a malformed
/// board is a precondition violation, not a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([Option<Mark>; 9]);

impl Board {
    /// A board with every cell empty.
    pub const EMPTY: Board = Board([None; 9]);

    /// Returns the mark in the given cell, if any.
    pub fn cell(&self, idx: usize) -> Option<Mark> {
        self.0[idx]
    }

    /// Places `mark` in the given cell, overwriting whatever was there.
    ///
    /// Legality (cell empty, correct turn) is the caller's responsibility:
    /// the room validates before mutating, and the search engine only
    /// simulates onto empty cells.
    pub fn place(&mut self, idx: usize, mark: Mark) {
        self.0[idx] = Some(mark);
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        *self = Self::EMPTY;
    }

    /// Number of cells holding the given mark.
    pub fn count(&self, mark: Mark) -> usize {
        self.0.iter().filter(|c| **c == Some(mark)).count()
    }

    /// Returns the winning mark, if any triple is completed.
    ///
    /// Scans [`LINES`] in order and returns the first completed triple's
    /// mark. With alternating moves at most one mark can hold a line, but
    /// the scan order makes the result deterministic regardless.
    pub fn winner(&self) -> Option<Mark> {
        self.winning_line()
            .and_then(|[a, _, _]| self.0[a])
    }

    /// Returns the completed triple itself, for highlighting.
    ///
    /// Agrees with [`winner`](Self::winner): one is `Some` iff the other is.
    pub fn winning_line(&self) -> Option<[usize; 3]> {
        LINES.into_iter().find(|&[a, b, c]| {
            self.0[a].is_some() && self.0[a] == self.0[b] && self.0[b] == self.0[c]
        })
    }

    /// Returns `true` iff every cell is occupied.
    pub fn is_full(&self) -> bool {
        self.0.iter().all(|c| c.is_some())
    }

    /// Returns `true` iff the game is over: a completed line or a full board.
    pub fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.is_full()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for Board {
    /// Renders the board as three rows, `.` for empty cells. Used in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            if row > 0 {
                write!(f, "/")?;
            }
            for col in 0..3 {
                match self.0[row * 3 + col] {
                    Some(m) => write!(f, "{m}")?,
                    None => write!(f, ".")?,
                }
            }
        }
        Ok(())
    }
}
