//! Room registry: creates, looks up, routes to, and destroys rooms.
//!
//! The registry is an explicit owned store: constructed at process
//! start, held by the server state, never a global. It owns every
//! [`RoomHandle`] plus the connection→room membership index; nothing
//! above it keeps a long-lived reference to a room.

use std::collections::HashMap;

use gridlock_board::Mark;
use gridlock_protocol::RoomCode;
use gridlock_transport::ConnectionId;
use rand::Rng;

use crate::room::{spawn_room, EventSender, RoomHandle, RoomSnapshot};
use crate::RoomError;

/// Command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Process-wide mapping from room code to room, plus the membership
/// index used to route moves, resets, and disconnects.
///
/// A connection is in at most one room at a time (key invariant). No
/// state here survives the process; rooms die with their last
/// participant.
pub struct RoomRegistry {
    /// Active rooms, keyed by code.
    rooms: HashMap<RoomCode, RoomHandle>,

    /// Maps each connection to the room it is seated in.
    memberships: HashMap<ConnectionId, RoomCode>,
}

impl RoomRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            memberships: HashMap::new(),
        }
    }

    /// Creates a room with `conn` seated at `X` and returns the code.
    ///
    /// In solo mode the engine occupies `O` immediately. Collisions on
    /// the random code are retried; with 32^6 codes they are negligible
    /// but still handled, not assumed away.
    pub fn create(
        &mut self,
        conn: ConnectionId,
        sender: EventSender,
        solo: bool,
    ) -> Result<(RoomCode, Mark), RoomError> {
        if let Some(existing) = self.memberships.get(&conn) {
            return Err(RoomError::AlreadyInRoom(conn, existing.clone()));
        }

        let mut rng = rand::rng();
        let code = loop {
            let candidate = random_code(&mut rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let handle = spawn_room(
            code.clone(),
            conn,
            sender,
            solo,
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(code.clone(), handle);
        self.memberships.insert(conn, code.clone());

        tracing::info!(%code, %conn, solo, "room created");
        Ok((code, Mark::X))
    }

    /// Seats `conn` in the room addressed by `input` (case-insensitive,
    /// trimmed) and returns the code and the assigned mark.
    pub async fn join(
        &mut self,
        input: &str,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<(RoomCode, Mark), RoomError> {
        if let Some(existing) = self.memberships.get(&conn) {
            return Err(RoomError::AlreadyInRoom(conn, existing.clone()));
        }

        let code = RoomCode::normalized(input);
        let handle = self
            .rooms
            .get(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        let mark = handle.join(conn, sender).await?;
        self.memberships.insert(conn, code.clone());
        Ok((code, mark))
    }

    /// Routes a move from `conn` to its room.
    pub async fn apply_move(
        &self,
        conn: ConnectionId,
        cell: u8,
    ) -> Result<(), RoomError> {
        let handle = self.room_of(conn)?;
        handle.apply_move(conn, cell).await
    }

    /// Routes a reset from `conn` to its room.
    pub async fn reset(&self, conn: ConnectionId) -> Result<(), RoomError> {
        let handle = self.room_of(conn)?;
        handle.reset(conn).await
    }

    /// Handles a disconnect: vacates any seat held by `conn` and destroys
    /// the room once no connection-held seat remains.
    ///
    /// Idempotent: releasing an unknown or already-released connection
    /// is a no-op.
    pub async fn release(&mut self, conn: ConnectionId) {
        let Some(code) = self.memberships.remove(&conn) else {
            return;
        };
        let Some(handle) = self.rooms.get(&code) else {
            return;
        };

        match handle.leave(conn).await {
            Ok(outcome) if outcome.now_empty => {
                self.rooms.remove(&code);
                tracing::info!(%code, "room destroyed");
            }
            Ok(_) => {}
            Err(_) => {
                // Actor already gone; drop the stale handle.
                self.rooms.remove(&code);
            }
        }
    }

    /// Returns a snapshot of the room under `code`, if it exists.
    pub async fn snapshot(
        &self,
        code: &RoomCode,
    ) -> Option<RoomSnapshot> {
        let handle = self.rooms.get(code)?;
        handle.snapshot().await.ok()
    }

    /// Returns `true` if a room exists under `code`.
    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// Number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn room_of(&self, conn: ConnectionId) -> Result<&RoomHandle, RoomError> {
        let code = self
            .memberships
            .get(&conn)
            .ok_or(RoomError::UnknownRoom(conn))?;
        self.rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Draws a code uniformly from the unambiguous alphabet.
fn random_code(rng: &mut impl Rng) -> RoomCode {
    let s: String = (0..RoomCode::LEN)
        .map(|_| {
            let idx = rng.random_range(0..RoomCode::ALPHABET.len());
            RoomCode::ALPHABET[idx] as char
        })
        .collect();
    RoomCode::normalized(&s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_code_has_fixed_length_and_alphabet() {
        let mut rng = rand::rng();
        for _ in 0..64 {
            let code = random_code(&mut rng);
            assert_eq!(code.as_str().len(), RoomCode::LEN);
            for byte in code.as_str().bytes() {
                assert!(
                    RoomCode::ALPHABET.contains(&byte),
                    "unexpected character {:?} in {}",
                    byte as char,
                    code
                );
            }
        }
    }

    #[test]
    fn test_random_code_normalization_is_identity() {
        let mut rng = rand::rng();
        let code = random_code(&mut rng);
        assert_eq!(code, RoomCode::normalized(code.as_str()));
    }
}
